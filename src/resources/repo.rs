//! Repository clone entity.
use std::fmt;
use std::path::{Path, PathBuf};

use anyhow::Result;

use super::helpers::run_checked;
use super::{Applicable, Resource, ResourceChange, ResourceState};
use crate::error::{ManifestError, ResourceError};
use crate::exec::{Executor, with_directory};

/// Directory a repository clones into: the last segment of its location
/// with its trailing extension removed, the way `git clone` names it.
///
/// `https://github.com/acme/dots.git` and `git@github.com:acme/dots.git`
/// both give `dots`; `socket.io.git` gives `socket.io`.
///
/// # Errors
///
/// Returns [`ManifestError::InvalidRepoLocation`] if no name remains.
pub fn dir_name(location: &str) -> Result<String> {
    let last = location
        .trim_end_matches('/')
        .rsplit(['/', ':'])
        .next()
        .unwrap_or_default();
    let name = last.rsplit_once('.').map_or(last, |(stem, _)| stem);
    if name.is_empty() {
        return Err(ManifestError::InvalidRepoLocation(location.to_string()).into());
    }
    Ok(name.to_string())
}

/// A repository cloned into the install root.
pub struct Repo<'a> {
    location: &'a str,
    home: &'a Path,
    executor: &'a dyn Executor,
}

impl fmt::Debug for Repo<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Repo")
            .field("location", &self.location)
            .field("home", &self.home)
            .finish_non_exhaustive()
    }
}

impl<'a> Repo<'a> {
    /// Create a repo that clones `location` into `home`.
    #[must_use]
    pub const fn new(location: &'a str, home: &'a Path, executor: &'a dyn Executor) -> Self {
        Self {
            location,
            home,
            executor,
        }
    }

    /// Repository location as written in the manifest.
    #[must_use]
    pub const fn location(&self) -> &str {
        self.location
    }

    /// Directory the clone ends up in.
    ///
    /// # Errors
    ///
    /// Returns an error if no directory name can be derived from the location.
    pub fn target(&self) -> Result<PathBuf> {
        Ok(self.home.join(dir_name(self.location)?))
    }

    /// Clone the repository unless its directory already exists.
    ///
    /// # Errors
    ///
    /// See [`Applicable::apply`].
    pub fn clone_repo(&self) -> Result<ResourceChange> {
        self.apply()
    }
}

impl Applicable for Repo<'_> {
    fn description(&self) -> String {
        format!("clone {}", self.location)
    }

    fn apply(&self) -> Result<ResourceChange> {
        match self.current_state()? {
            ResourceState::Correct => {
                tracing::debug!("{} already cloned", self.location);
                return Ok(ResourceChange::AlreadyCorrect);
            }
            ResourceState::Invalid { reason } => {
                anyhow::bail!("cannot clone {}: {reason}", self.location)
            }
            ResourceState::Missing => {}
        }

        if !self.home.is_dir() {
            return Err(ResourceError::MissingDirectory(self.home.to_path_buf()).into());
        }
        if !self.executor.network_reachable() {
            return Err(
                ResourceError::NetworkUnreachable(format!("clone {}", self.location)).into(),
            );
        }
        if !self.executor.which("git") {
            return Err(ResourceError::ToolMissing("git".to_string()).into());
        }

        tracing::info!("Cloning {}...", self.location);
        let argv = ["git", "clone", self.location].map(String::from);
        with_directory(self.home, || run_checked(self.executor, &argv, false))?;
        tracing::info!("Cloning {}...Done!", self.location);
        Ok(ResourceChange::Applied)
    }
}

impl Resource for Repo<'_> {
    fn current_state(&self) -> Result<ResourceState> {
        let target = self.target()?;
        if target.is_dir() {
            Ok(ResourceState::Correct)
        } else if target.exists() {
            Ok(ResourceState::Invalid {
                reason: format!("{} exists and is not a directory", target.display()),
            })
        } else {
            Ok(ResourceState::Missing)
        }
    }
}
