//! Custom script entity.
use std::fmt;
use std::path::{Path, PathBuf};

use anyhow::{Context as _, Result};

use super::helpers::run_checked;
use super::{Applicable, ResourceChange};
use crate::error::ResourceError;
use crate::exec::Executor;

/// A script under the install root, run through the shell.
pub struct Script<'a> {
    location: &'a str,
    home: &'a Path,
    executor: &'a dyn Executor,
}

impl fmt::Debug for Script<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Script")
            .field("location", &self.location)
            .field("home", &self.home)
            .finish_non_exhaustive()
    }
}

impl<'a> Script<'a> {
    /// Create a script entity for `location` relative to `home`.
    #[must_use]
    pub const fn new(location: &'a str, home: &'a Path, executor: &'a dyn Executor) -> Self {
        Self {
            location,
            home,
            executor,
        }
    }

    /// Absolute path of the script.
    #[must_use]
    pub fn path(&self) -> PathBuf {
        self.home.join(self.location)
    }

    /// Shell command line invoking the script, quoted so install roots with
    /// spaces or shell metacharacters survive `sh -c`.
    ///
    /// # Errors
    ///
    /// Returns an error if the path contains a NUL byte.
    pub fn command_line(&self) -> Result<String> {
        let path = self.path().display().to_string();
        let quoted = shlex::try_quote(&path)
            .with_context(|| format!("cannot quote script path {path}"))?;
        Ok(quoted.into_owned())
    }
}

/// Whether `path` is a file the current user may execute.
#[cfg(unix)]
fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt as _;
    std::fs::metadata(path).is_ok_and(|m| m.is_file() && m.permissions().mode() & 0o111 != 0)
}

#[cfg(not(unix))]
fn is_executable(path: &Path) -> bool {
    path.is_file()
}

impl Applicable for Script<'_> {
    fn description(&self) -> String {
        format!("script {}", self.location)
    }

    fn apply(&self) -> Result<ResourceChange> {
        let path = self.path();
        if !is_executable(&path) {
            return Err(ResourceError::NotExecutable(path).into());
        }
        tracing::info!("Executing {}...", path.display());
        run_checked(self.executor, &[self.command_line()?], true)?;
        tracing::info!("Executing {}...Done!", path.display());
        Ok(ResourceChange::Applied)
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::resources::test_helpers::{MockExecutor, exit};

    #[cfg(unix)]
    fn write_script(dir: &Path, name: &str, mode: u32) {
        use std::os::unix::fs::PermissionsExt as _;
        let path = dir.join(name);
        std::fs::write(&path, "#!/bin/sh\nexit 0\n").unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(mode)).unwrap();
    }

    #[cfg(unix)]
    #[test]
    fn executable_script_runs_in_shell() {
        let home = tempfile::tempdir().unwrap();
        std::fs::create_dir(home.path().join("dots")).unwrap();
        write_script(&home.path().join("dots"), "setup.sh", 0o755);
        let expected = home.path().join("dots/setup.sh").display().to_string();

        let mut executor = MockExecutor::new();
        executor
            .expect_execute()
            .withf(move |argv, use_shell| argv == [expected.as_str()] && *use_shell)
            .times(1)
            .returning(|_, _| Ok(exit(0)));

        let change = Script::new("dots/setup.sh", home.path(), &executor)
            .apply()
            .unwrap();
        assert_eq!(change, ResourceChange::Applied);
    }

    #[cfg(unix)]
    #[test]
    fn path_with_spaces_is_quoted_for_the_shell() {
        let home = tempfile::tempdir().unwrap();
        let root = home.path().join("my snix");
        std::fs::create_dir(&root).unwrap();
        write_script(&root, "setup.sh", 0o755);
        let expected = root.join("setup.sh").display().to_string();

        let mut executor = MockExecutor::new();
        executor
            .expect_execute()
            .withf(move |argv, use_shell| {
                *use_shell
                    && argv.len() == 1
                    && argv.first().and_then(|line| shlex::split(line))
                        == Some(vec![expected.clone()])
            })
            .times(1)
            .returning(|_, _| Ok(exit(0)));

        Script::new("setup.sh", &root, &executor).apply().unwrap();
    }

    #[cfg(unix)]
    #[test]
    fn script_under_a_spaced_root_runs_for_real() {
        let home = tempfile::tempdir().unwrap();
        let root = home.path().join("my snix");
        std::fs::create_dir(&root).unwrap();
        let marker = root.join("ran");
        let path = root.join("setup.sh");
        std::fs::write(&path, "#!/bin/sh\ntouch \"$(dirname \"$0\")/ran\"\n").unwrap();
        {
            use std::os::unix::fs::PermissionsExt as _;
            std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
        }

        let executor = crate::exec::SystemExecutor::new();
        let change = Script::new("setup.sh", &root, &executor).apply().unwrap();

        assert_eq!(change, ResourceChange::Applied);
        assert!(marker.is_file());
    }

    #[cfg(unix)]
    #[test]
    fn non_executable_script_fails_before_spawning() {
        let home = tempfile::tempdir().unwrap();
        write_script(home.path(), "setup.sh", 0o644);
        let mut executor = MockExecutor::new();
        executor.expect_execute().never();

        let err = Script::new("setup.sh", home.path(), &executor)
            .apply()
            .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ResourceError>(),
            Some(ResourceError::NotExecutable(_))
        ));
    }

    #[test]
    fn missing_script_is_not_executable() {
        let home = tempfile::tempdir().unwrap();
        let mut executor = MockExecutor::new();
        executor.expect_execute().never();

        let err = Script::new("nope.sh", home.path(), &executor)
            .apply()
            .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ResourceError>(),
            Some(ResourceError::NotExecutable(_))
        ));
    }

    #[cfg(unix)]
    #[test]
    fn failing_script_is_fatal() {
        let home = tempfile::tempdir().unwrap();
        write_script(home.path(), "setup.sh", 0o700);
        let mut executor = MockExecutor::new();
        executor.expect_execute().returning(|_, _| Ok(exit(4)));

        let err = Script::new("setup.sh", home.path(), &executor)
            .apply()
            .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ResourceError>(),
            Some(ResourceError::ExecutionFailed { exit_code: 4, .. })
        ));
    }
}
