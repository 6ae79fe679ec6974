//! Install root discovery and persisted user settings.
pub mod settings;

use anyhow::Result;
use std::ffi::OsString;
use std::path::{Path, PathBuf};

use crate::error::ConfigError;

pub use settings::Settings;

/// Environment variable naming the install root.
pub const HOME_ENV: &str = "SNIX_HOME";

/// Directory under the install root whose path must be on the user's `PATH`.
pub const BIN_DIRNAME: &str = "bin";

/// Directory under the user's home holding the settings file.
pub const SETTINGS_DIRNAME: &str = ".snix";

/// Settings file name.
pub const SETTINGS_FILE: &str = "snix.toml";

/// The current user's home directory.
#[must_use]
pub fn user_home() -> Option<PathBuf> {
    std::env::var_os("HOME")
        .or_else(|| std::env::var_os("USERPROFILE"))
        .filter(|v| !v.is_empty())
        .map(PathBuf::from)
}

/// Location of the persisted settings file, `~/.snix/snix.toml`.
#[must_use]
pub fn settings_path() -> Option<PathBuf> {
    user_home().map(|home| home.join(SETTINGS_DIRNAME).join(SETTINGS_FILE))
}

/// Determine the install root.
///
/// The `--home` flag wins, then the `SNIX_HOME` value, then the `snix.home`
/// key of the settings file.  The chosen directory must exist; it is
/// returned in canonical form.
///
/// # Errors
///
/// Returns [`ConfigError::HomeNotConfigured`] when no source names a root,
/// [`ConfigError::InvalidHome`] when the named root is not a directory, and
/// [`ConfigError::InvalidSettings`] when the settings file cannot be parsed.
pub fn resolve_home(
    flag: Option<&Path>,
    env: Option<OsString>,
    settings_file: Option<&Path>,
) -> Result<PathBuf> {
    let candidate = match (flag, env.filter(|v| !v.is_empty())) {
        (Some(flag), _) => Some(flag.to_path_buf()),
        (None, Some(env)) => Some(PathBuf::from(env)),
        (None, None) => match settings_file {
            Some(path) => Settings::load(path)?.home().map(Path::to_path_buf),
            None => None,
        },
    };

    let home = candidate.ok_or(ConfigError::HomeNotConfigured)?;
    if !home.is_dir() {
        return Err(ConfigError::InvalidHome(home).into());
    }
    dunce::canonicalize(&home).map_err(|_| ConfigError::InvalidHome(home).into())
}
