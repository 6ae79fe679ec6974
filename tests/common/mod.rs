// Shared helpers for integration tests.
//
// Provides a temporary install root with the bundled schema in place and an
// executor that records every command instead of spawning it, so each test
// can drive the full resolve-and-install pipeline in isolation.
//
// Used by all integration test binaries that declare `mod common;`.
#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

use snix::cli::{GlobalOpts, ManifestOpts};
use snix::exec::{ExecResult, Executor};
use snix::manifest::{BUNDLED_SCHEMA, CODE_DIRNAME, SCHEMA_FILE};

/// Serialises tests whose commands change the process working directory.
pub static CWD_LOCK: Mutex<()> = Mutex::new(());

/// Take [`CWD_LOCK`], ignoring poisoning from an earlier failed test.
pub fn lock_cwd() -> std::sync::MutexGuard<'static, ()> {
    CWD_LOCK.lock().unwrap_or_else(PoisonError::into_inner)
}

/// An install root backed by a [`tempfile::TempDir`].
pub struct TestHome {
    dir: tempfile::TempDir,
}

impl TestHome {
    /// Create an install root whose code directory holds the bundled schema.
    pub fn new() -> Self {
        let dir = tempfile::tempdir().expect("create temp dir");
        let code = dir.path().join(CODE_DIRNAME);
        std::fs::create_dir_all(&code).expect("create code dir");
        std::fs::write(code.join(SCHEMA_FILE), BUNDLED_SCHEMA).expect("write schema");
        Self { dir }
    }

    /// Canonical path of the install root.
    pub fn path(&self) -> PathBuf {
        dunce::canonicalize(self.dir.path()).expect("canonicalize home")
    }

    /// Write `body` to `rel` under the install root and return its path.
    pub fn with_file(&self, rel: &str, body: &str) -> PathBuf {
        let path = self.path().join(rel);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).expect("create parent dir");
        }
        std::fs::write(&path, body).expect("write file");
        path
    }

    /// Write an executable script at `rel` under the install root.
    #[cfg(unix)]
    pub fn with_script(&self, rel: &str) -> PathBuf {
        use std::os::unix::fs::PermissionsExt as _;
        let path = self.with_file(rel, "#!/bin/sh\nexit 0\n");
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755))
            .expect("chmod script");
        path
    }

    /// Global options pointing at this install root.
    pub fn global(&self, dry_run: bool) -> GlobalOpts {
        GlobalOpts {
            dry_run,
            home: Some(self.path()),
        }
    }

    /// Options for a manifest subcommand on `manifest`.
    pub fn manifest_opts(manifest: &Path) -> ManifestOpts {
        ManifestOpts {
            manifest: manifest.to_path_buf(),
        }
    }
}

/// A command seen by [`RecordingExecutor`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Call {
    /// Argument vector (a single command line when `use_shell` is set).
    pub argv: Vec<String>,
    /// Whether the command would have run through the shell.
    pub use_shell: bool,
    /// Working directory at the time of the call.
    pub cwd: Option<PathBuf>,
}

impl Call {
    /// The argument vector joined with spaces.
    pub fn line(&self) -> String {
        self.argv.join(" ")
    }
}

type CloneFiles = Vec<(String, String)>;

/// Executor that records commands instead of running them.
///
/// Every command exits 0 unless its joined argv matches a failure
/// registered with [`fail_on`](Self::fail_on).  `git clone <url>` creates
/// the clone directory in the current working directory, populated with any
/// files registered through [`on_clone`](Self::on_clone).
#[derive(Default)]
pub struct RecordingExecutor {
    calls: Mutex<Vec<Call>>,
    failures: Vec<(String, i32)>,
    clones: Vec<(String, CloneFiles)>,
    offline: bool,
    missing_tools: Vec<String>,
}

impl RecordingExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Exit with `code` for any command whose joined argv equals `line`.
    pub fn fail_on(mut self, line: &str, code: i32) -> Self {
        self.failures.push((line.to_string(), code));
        self
    }

    /// When `url` is cloned, create `files` inside the clone.
    pub fn on_clone(mut self, url: &str, files: &[(&str, &str)]) -> Self {
        let files = files
            .iter()
            .map(|(path, body)| ((*path).to_string(), (*body).to_string()))
            .collect();
        self.clones.push((url.to_string(), files));
        self
    }

    /// Report the network as unreachable.
    pub fn offline(mut self) -> Self {
        self.offline = true;
        self
    }

    /// Report `tool` as absent from `PATH`.
    pub fn without_tool(mut self, tool: &str) -> Self {
        self.missing_tools.push(tool.to_string());
        self
    }

    /// Every recorded command, in order.
    pub fn calls(&self) -> Vec<Call> {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Every recorded command line, in order.
    pub fn lines(&self) -> Vec<String> {
        self.calls().iter().map(Call::line).collect()
    }

    fn simulate_clone(&self, url: &str) -> anyhow::Result<()> {
        let name = snix::resources::repo::dir_name(url)?;
        let target = std::env::current_dir()?.join(name);
        std::fs::create_dir_all(&target)?;
        if let Some((_, files)) = self.clones.iter().find(|(u, _)| u == url) {
            for (rel, body) in files {
                let path = target.join(rel);
                if let Some(parent) = path.parent() {
                    std::fs::create_dir_all(parent)?;
                }
                std::fs::write(path, body)?;
            }
        }
        Ok(())
    }
}

impl Executor for RecordingExecutor {
    fn execute(&self, argv: &[String], use_shell: bool) -> anyhow::Result<ExecResult> {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(Call {
                argv: argv.to_vec(),
                use_shell,
                cwd: std::env::current_dir().ok(),
            });

        let line = argv.join(" ");
        if let Some((_, code)) = self.failures.iter().find(|(l, _)| *l == line) {
            return Ok(ExecResult {
                success: false,
                code: Some(*code),
            });
        }
        if let [git, clone, url] = argv
            && git == "git"
            && clone == "clone"
        {
            self.simulate_clone(url)?;
        }
        Ok(ExecResult {
            success: true,
            code: Some(0),
        })
    }

    fn which(&self, program: &str) -> bool {
        !self.missing_tools.iter().any(|t| t == program)
    }

    fn network_reachable(&self) -> bool {
        !self.offline
    }
}

/// Wrap `executor` for APIs that take a shared trait object.
pub fn shared(executor: &Arc<RecordingExecutor>) -> Arc<dyn Executor> {
    Arc::clone(executor) as Arc<dyn Executor>
}
