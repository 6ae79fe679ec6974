//! Process execution, directory-scoped execution, and the network probe.
use anyhow::{Context, Result};
use std::net::{TcpStream, ToSocketAddrs};
use std::path::{Path, PathBuf};
use std::process::{Command, ExitStatus};
use std::sync::OnceLock;
use std::time::Duration;

/// Host probed by [`SystemExecutor::network_reachable`].
const PROBE_HOST: &str = "www.google.com:80";

/// Connect timeout for the network probe.
const PROBE_TIMEOUT: Duration = Duration::from_secs(2);

/// Result of a command execution.
///
/// Output is streamed to the terminal rather than captured, so only the exit
/// status is reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExecResult {
    /// Whether the process exited with status zero.
    pub success: bool,
    /// Exit code; `None` when terminated by a signal.
    pub code: Option<i32>,
}

impl ExecResult {
    /// Exit code, or `-1` when the process was terminated by a signal.
    #[must_use]
    pub fn exit_code(&self) -> i32 {
        self.code.unwrap_or(-1)
    }
}

impl From<ExitStatus> for ExecResult {
    fn from(status: ExitStatus) -> Self {
        Self {
            success: status.success(),
            code: status.code(),
        }
    }
}

/// Abstraction over process spawning so resources can be tested without
/// running real commands.
///
/// A non-zero exit is reported through [`ExecResult`], not as an error;
/// callers decide whether it is fatal.  `Err` means the process could not be
/// spawned at all.
pub trait Executor: Send + Sync {
    /// Spawn `argv` and wait for it, streaming its output.
    ///
    /// With `use_shell` the arguments are joined with spaces and handed to the
    /// platform shell, so the string is shell-interpreted.
    ///
    /// # Errors
    ///
    /// Returns an error if `argv` is empty or the process cannot be spawned.
    fn execute(&self, argv: &[String], use_shell: bool) -> Result<ExecResult>;

    /// Whether `program` is available on PATH.
    fn which(&self, program: &str) -> bool;

    /// Cheap connectivity probe gating clones and downloads.
    fn network_reachable(&self) -> bool;
}

/// Production [`Executor`] backed by [`std::process::Command`].
///
/// The network probe runs at most once per executor; the answer is reused for
/// every later gated step in the same run.
#[derive(Debug, Default)]
pub struct SystemExecutor {
    network: OnceLock<bool>,
}

impl SystemExecutor {
    /// Create an executor whose network state has not been probed yet.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            network: OnceLock::new(),
        }
    }
}

impl Executor for SystemExecutor {
    fn execute(&self, argv: &[String], use_shell: bool) -> Result<ExecResult> {
        let mut cmd = build_command(argv, use_shell)?;
        let label = argv.join(" ");
        tracing::debug!("spawning: {label} (shell: {use_shell})");
        let status = cmd
            .status()
            .with_context(|| format!("failed to execute: {label}"))?;
        Ok(ExecResult::from(status))
    }

    fn which(&self, program: &str) -> bool {
        which(program)
    }

    fn network_reachable(&self) -> bool {
        *self.network.get_or_init(probe_network)
    }
}

/// Build the [`Command`] for `argv`, wrapping it in a shell when requested.
fn build_command(argv: &[String], use_shell: bool) -> Result<Command> {
    let (program, args) = argv.split_first().context("cannot execute an empty command")?;
    if use_shell {
        let line = argv.join(" ");
        #[cfg(windows)]
        let cmd = {
            let mut c = Command::new("cmd");
            c.args(["/C", &line]);
            c
        };
        #[cfg(not(windows))]
        let cmd = {
            let mut c = Command::new("sh");
            c.args(["-c", &line]);
            c
        };
        Ok(cmd)
    } else {
        let mut cmd = Command::new(program);
        cmd.args(args);
        Ok(cmd)
    }
}

/// Resolve and connect to [`PROBE_HOST`] within [`PROBE_TIMEOUT`].
fn probe_network() -> bool {
    let reachable = PROBE_HOST
        .to_socket_addrs()
        .ok()
        .and_then(|mut addrs| addrs.next())
        .is_some_and(|addr| TcpStream::connect_timeout(&addr, PROBE_TIMEOUT).is_ok());
    if reachable {
        tracing::info!("Checking Network: UP!");
    } else {
        tracing::warn!("Checking Network: DOWN!");
    }
    reachable
}

/// Check if a program is available on PATH.
#[must_use]
pub fn which(program: &str) -> bool {
    which::which(program).is_ok()
}

/// Changes the process working directory and restores the previous one when
/// dropped.
///
/// Restoration happens on every exit path, including early returns and
/// unwinding panics.
#[derive(Debug)]
pub struct DirGuard {
    previous: PathBuf,
}

impl DirGuard {
    /// Remember the current directory and switch to `dir`.
    ///
    /// # Errors
    ///
    /// Returns an error if the current directory cannot be read or `dir`
    /// cannot be entered; the working directory is unchanged in that case.
    pub fn enter(dir: &Path) -> Result<Self> {
        let previous = std::env::current_dir().context("reading current directory")?;
        std::env::set_current_dir(dir)
            .with_context(|| format!("changing directory to {}", dir.display()))?;
        Ok(Self { previous })
    }
}

impl Drop for DirGuard {
    fn drop(&mut self) {
        if let Err(e) = std::env::set_current_dir(&self.previous) {
            tracing::error!(
                "failed to restore working directory {}: {e}",
                self.previous.display()
            );
        }
    }
}

/// Run `body` with `dir` as the working directory, then restore the previous
/// working directory whatever `body` returns.
///
/// # Errors
///
/// Returns an error if `dir` cannot be entered, or whatever `body` returns.
pub fn with_directory<T>(dir: &Path, body: impl FnOnce() -> Result<T>) -> Result<T> {
    let _guard = DirGuard::enter(dir)?;
    body()
}

/// Serializes tests that change the process working directory.
#[cfg(test)]
pub(crate) static CWD_MUTEX: std::sync::Mutex<()> = std::sync::Mutex::new(());

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used, clippy::panic)]
mod tests {
    use super::*;

    fn argv(parts: &[&str]) -> Vec<String> {
        parts.iter().map(ToString::to_string).collect()
    }

    #[cfg(unix)]
    #[test]
    fn execute_reports_success() {
        let result = SystemExecutor::new().execute(&argv(&["true"]), false).unwrap();
        assert!(result.success);
        assert_eq!(result.exit_code(), 0);
    }

    #[cfg(unix)]
    #[test]
    fn execute_non_zero_is_not_an_error() {
        let result = SystemExecutor::new().execute(&argv(&["false"]), false).unwrap();
        assert!(!result.success, "non-zero exit should set success=false");
        assert_eq!(result.exit_code(), 1);
    }

    #[cfg(unix)]
    #[test]
    fn execute_with_shell_interprets_the_line() {
        let result = SystemExecutor::new()
            .execute(&argv(&["exit 3"]), true)
            .unwrap();
        assert_eq!(result.code, Some(3));
    }

    #[test]
    fn execute_empty_command_is_an_error() {
        let err = SystemExecutor::new().execute(&[], false).unwrap_err();
        assert!(err.to_string().contains("empty command"));
    }

    #[test]
    fn execute_missing_program_is_an_error() {
        let result = SystemExecutor::new().execute(&argv(&["this-program-does-not-exist-12345"]), false);
        assert!(result.is_err(), "spawn failure should produce an error");
    }

    #[test]
    fn which_missing_program() {
        assert!(!which("this-program-does-not-exist-12345"));
    }

    #[test]
    fn with_directory_runs_inside_and_restores() {
        let _lock = CWD_MUTEX
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        let before = std::env::current_dir().unwrap();
        let dir = tempfile::tempdir().unwrap();
        let expected = dunce::canonicalize(dir.path()).unwrap();

        let inside = with_directory(dir.path(), || {
            Ok(dunce::canonicalize(std::env::current_dir()?)?)
        })
        .unwrap();

        assert_eq!(inside, expected);
        assert_eq!(std::env::current_dir().unwrap(), before);
    }

    #[test]
    fn with_directory_restores_on_error() {
        let _lock = CWD_MUTEX
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        let before = std::env::current_dir().unwrap();
        let dir = tempfile::tempdir().unwrap();

        let result: Result<()> = with_directory(dir.path(), || anyhow::bail!("inner failure"));

        assert!(result.is_err());
        assert_eq!(std::env::current_dir().unwrap(), before);
    }

    #[test]
    fn with_directory_restores_on_panic() {
        let _lock = CWD_MUTEX
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        let before = std::env::current_dir().unwrap();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().to_path_buf();

        let outcome = std::panic::catch_unwind(move || {
            let _ = with_directory(&path, || -> Result<()> { panic!("boom") });
        });

        assert!(outcome.is_err());
        assert_eq!(std::env::current_dir().unwrap(), before);
    }

    #[test]
    fn with_directory_missing_dir_leaves_cwd_alone() {
        let _lock = CWD_MUTEX
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        let before = std::env::current_dir().unwrap();
        let result = with_directory(Path::new("/this/dir/does/not/exist"), || Ok(()));
        assert!(result.is_err());
        assert_eq!(std::env::current_dir().unwrap(), before);
    }
}
