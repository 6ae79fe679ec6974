//! TOML settings file persisted by `snix init`.
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::ConfigError;

/// Contents of `~/.snix/snix.toml`.
///
/// ```toml
/// [config]
/// "snix.home" = "/Users/me/snix"
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default)]
    config: SettingsTable,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
struct SettingsTable {
    #[serde(
        rename = "snix.home",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    home: Option<PathBuf>,
}

impl Settings {
    /// Settings naming `home` as the install root.
    #[must_use]
    pub fn with_home(home: &Path) -> Self {
        Self {
            config: SettingsTable {
                home: Some(home.to_path_buf()),
            },
        }
    }

    /// Persisted install root, if any.
    #[must_use]
    pub fn home(&self) -> Option<&Path> {
        self.config.home.as_deref()
    }

    /// Read settings from `path`; a missing file yields empty settings.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read settings file: {}", path.display()))?;

        toml::from_str(&content).map_err(|e| {
            ConfigError::InvalidSettings {
                path: path.to_path_buf(),
                message: e.message().to_string(),
            }
            .into()
        })
    }

    /// Write settings to `path`, creating its parent directory.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory or file cannot be written.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        let content = toml::to_string(self).context("Failed to serialize settings")?;
        std::fs::write(path, content)
            .with_context(|| format!("Failed to write settings file: {}", path.display()))
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let settings = Settings::load(&dir.path().join("snix.toml")).unwrap();
        assert_eq!(settings, Settings::default());
        assert!(settings.home().is_none());
    }

    #[test]
    fn reads_quoted_dotted_key() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("snix.toml");
        std::fs::write(&path, "[config]\n\"snix.home\" = \"/opt/snix\"\n").unwrap();

        let settings = Settings::load(&path).unwrap();
        assert_eq!(settings.home(), Some(Path::new("/opt/snix")));
    }

    #[test]
    fn save_then_load_keeps_home() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/snix.toml");
        Settings::with_home(Path::new("/opt/snix")).save(&path).unwrap();

        let written = std::fs::read_to_string(&path).unwrap();
        assert!(written.contains("[config]"));
        assert!(written.contains("\"snix.home\""));
        assert_eq!(
            Settings::load(&path).unwrap().home(),
            Some(Path::new("/opt/snix"))
        );
    }

    #[test]
    fn malformed_file_is_invalid_settings() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("snix.toml");
        std::fs::write(&path, "[config\n").unwrap();

        let err = Settings::load(&path).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ConfigError>(),
            Some(ConfigError::InvalidSettings { .. })
        ));
    }
}
