//! Domain-specific error types for the snix engine.
//!
//! Internal modules return [`anyhow::Result`] values that carry one of the
//! typed errors below, so callers at the CLI boundary can add context with
//! `?` while tests can still `downcast_ref` to the concrete variant.
//!
//! # Error families
//!
//! ```text
//! ConfigError   : install root, settings file, manifest config keys
//! ManifestError : loading, schema validation, include resolution
//! ResourceError : spawned commands, scripts, artifacts, network
//! ```

use std::path::PathBuf;

use thiserror::Error;

/// Errors that arise from locating the install root and reading settings.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// No install root was given and none has been persisted yet.
    #[error("cannot determine snix home. Use --home, set SNIX_HOME, or run `snix init`")]
    HomeNotConfigured,

    /// The install root does not exist or is not a directory.
    #[error("{0} is not a valid directory")]
    InvalidHome(PathBuf),

    /// A manifest `config` key required by an operation is absent.
    #[error("missing required config key '{key}' (needed by {needed_by})")]
    MissingKey {
        /// Name of the missing key.
        key: String,
        /// What required the key.
        needed_by: String,
    },

    /// The persisted settings file exists but could not be parsed.
    #[error("invalid settings file {path}: {message}")]
    InvalidSettings {
        /// Path of the settings file.
        path: PathBuf,
        /// Parser message.
        message: String,
    },
}

/// Errors that arise from loading, validating, and resolving manifests.
#[derive(Error, Debug)]
pub enum ManifestError {
    /// The manifest path does not reference an existing file.
    #[error("{0} is not a valid file path")]
    NotFound(PathBuf),

    /// The manifest file is not well-formed JSON.
    #[error("failed to parse manifest {path}: {source}")]
    Parse {
        /// Path of the manifest.
        path: PathBuf,
        /// Underlying parser error.
        source: serde_json::Error,
    },

    /// The schema document is missing or is not a usable schema.
    #[error("cannot load schema {path}: {message}")]
    Schema {
        /// Path of the schema document.
        path: PathBuf,
        /// Reason the schema could not be used.
        message: String,
    },

    /// The manifest does not conform to the schema.
    #[error("{path} failed schema validation: {}", violations.join("; "))]
    SchemaValidation {
        /// Path of the offending manifest.
        path: PathBuf,
        /// Every violation reported by the validator.
        violations: Vec<String>,
    },

    /// An include could not be found, even after cloning its repository.
    #[error("included manifest {path} (from {upstream}) does not exist")]
    IncludeNotFound {
        /// Expected manifest path.
        path: PathBuf,
        /// Repository the include points to.
        upstream: String,
    },

    /// A manifest includes itself, directly or transitively.
    #[error("cyclic include detected: {chain}")]
    CyclicInclude {
        /// Chain of manifest paths, ending with the re-entered one.
        chain: String,
    },

    /// A repository location from which no directory name can be derived.
    #[error("cannot derive a directory name from repository location '{0}'")]
    InvalidRepoLocation(String),
}

/// Errors that arise while applying repos, items, and scripts.
#[derive(Error, Debug)]
pub enum ResourceError {
    /// A spawned command exited with a non-zero status.
    #[error("'{command}' failed (exit {exit_code})")]
    ExecutionFailed {
        /// The command line that was run.
        command: String,
        /// Exit code, or -1 when the process was killed by a signal.
        exit_code: i32,
    },

    /// A custom script lacks execute permission.
    #[error("{0} is not executable")]
    NotExecutable(PathBuf),

    /// A downloaded artifact is not an archive format snix can extract.
    #[error("{0} is not a supported compressed file")]
    UnsupportedArchive(PathBuf),

    /// No application bundle was found after extracting an artifact.
    #[error("no application bundle found in {0}")]
    ArtifactNotFound(PathBuf),

    /// A network-gated step was attempted while offline.
    #[error("network is unreachable; cannot {0}")]
    NetworkUnreachable(String),

    /// A tool required to apply a resource is not on PATH.
    #[error("required tool '{0}' not found on PATH")]
    ToolMissing(String),

    /// A directory the operation depends on does not exist.
    #[error("{0} is not a valid directory")]
    MissingDirectory(PathBuf),

    /// A download failed.
    #[error("failed to download {url}: {message}")]
    Download {
        /// URL that was requested.
        url: String,
        /// Transport or HTTP error message.
        message: String,
    },
}
