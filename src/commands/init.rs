//! Command: persist the install root and prepare its code directory.
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

use crate::cli::GlobalOpts;
use crate::config::{self, BIN_DIRNAME, HOME_ENV, Settings};
use crate::error::ConfigError;
use crate::logging::Logger;
use crate::manifest::{BUNDLED_SCHEMA, CODE_DIRNAME, schema_path};

/// Run the init command.
///
/// The install root is taken from `--home`, then `SNIX_HOME`, then the
/// current directory.  Returns the directories the user's shell `PATH` must
/// contain.
///
/// # Errors
///
/// Returns an error if the install root is not a directory or the settings
/// file cannot be written.
pub fn run(global: &GlobalOpts, log: &Logger) -> Result<Vec<PathBuf>> {
    let home = match (&global.home, std::env::var_os(HOME_ENV)) {
        (Some(flag), _) => flag.clone(),
        (None, Some(env)) if !env.is_empty() => PathBuf::from(env),
        _ => std::env::current_dir().context("Failed to read current directory")?,
    };
    let settings_file = config::settings_path().ok_or(ConfigError::HomeNotConfigured)?;

    log.stage("Initializing snix home");
    let entries = prepare(&home, &settings_file, global.dry_run, log)?;

    let joined = entries
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(":");
    log.info(&format!(
        "add to your shell profile: export PATH=\"{joined}:$PATH\""
    ));
    Ok(entries)
}

/// Record `home` in `settings_file` and write the bundled schema into its
/// code directory unless one is already there.
///
/// # Errors
///
/// Returns [`ConfigError::InvalidHome`] if `home` is not a directory, or an
/// I/O error if a file cannot be written.
pub fn prepare(
    home: &Path,
    settings_file: &Path,
    dry_run: bool,
    log: &Logger,
) -> Result<Vec<PathBuf>> {
    if !home.is_dir() {
        return Err(ConfigError::InvalidHome(home.to_path_buf()).into());
    }
    let home = dunce::canonicalize(home)
        .with_context(|| format!("Failed to canonicalize {}", home.display()))?;
    let schema = schema_path(&home);

    if dry_run {
        log.dry_run(&format!(
            "would save snix.home = {} to {}",
            home.display(),
            settings_file.display()
        ));
        if !schema.exists() {
            log.dry_run(&format!("would write {}", schema.display()));
        }
    } else {
        Settings::with_home(&home).save(settings_file)?;
        log.info(&format!("saved {}", settings_file.display()));

        let code_dir = home.join(CODE_DIRNAME);
        std::fs::create_dir_all(&code_dir)
            .with_context(|| format!("Failed to create {}", code_dir.display()))?;
        if schema.exists() {
            log.debug(&format!("keeping existing {}", schema.display()));
        } else {
            std::fs::write(&schema, BUNDLED_SCHEMA)
                .with_context(|| format!("Failed to write {}", schema.display()))?;
            log.info(&format!("wrote {}", schema.display()));
        }
    }

    Ok(vec![home.join(BIN_DIRNAME)])
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn prepare_saves_settings_and_schema() {
        let home = tempfile::tempdir().unwrap();
        let user = tempfile::tempdir().unwrap();
        let settings_file = user.path().join(".snix/snix.toml");
        let log = Logger::new("test");

        let entries = prepare(home.path(), &settings_file, false, &log).unwrap();

        let canonical = dunce::canonicalize(home.path()).unwrap();
        assert_eq!(entries, vec![canonical.join("bin")]);
        assert_eq!(
            Settings::load(&settings_file).unwrap().home(),
            Some(canonical.as_path())
        );
        assert_eq!(
            std::fs::read_to_string(schema_path(home.path())).unwrap(),
            BUNDLED_SCHEMA
        );
    }

    #[test]
    fn prepare_keeps_existing_schema() {
        let home = tempfile::tempdir().unwrap();
        let user = tempfile::tempdir().unwrap();
        std::fs::create_dir(home.path().join(CODE_DIRNAME)).unwrap();
        std::fs::write(schema_path(home.path()), "{}").unwrap();

        prepare(home.path(), &user.path().join("snix.toml"), false, &Logger::new("test")).unwrap();
        assert_eq!(
            std::fs::read_to_string(schema_path(home.path())).unwrap(),
            "{}"
        );
    }

    #[test]
    fn dry_run_writes_nothing() {
        let home = tempfile::tempdir().unwrap();
        let user = tempfile::tempdir().unwrap();
        let settings_file = user.path().join("snix.toml");

        prepare(home.path(), &settings_file, true, &Logger::new("test")).unwrap();
        assert!(!settings_file.exists());
        assert!(!home.path().join(CODE_DIRNAME).exists());
    }

    #[test]
    fn missing_home_is_rejected() {
        let user = tempfile::tempdir().unwrap();
        let err = prepare(
            &user.path().join("nope"),
            &user.path().join("snix.toml"),
            false,
            &Logger::new("test"),
        )
        .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ConfigError>(),
            Some(ConfigError::InvalidHome(_))
        ));
    }
}
