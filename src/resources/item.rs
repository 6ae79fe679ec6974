//! Package installation entity.
use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

use anyhow::Result;

use super::helpers::run_checked;
use super::{Applicable, ResourceChange};
use crate::error::ResourceError;
use crate::exec::{Executor, with_directory};
use crate::installer::InstallerStrategy;
use crate::installer::artifact::ArtifactInstaller;

/// One package to install, with the strategy chosen from its `via`.
pub struct Item<'a> {
    name: &'a str,
    strategy: InstallerStrategy,
    dir: Option<PathBuf>,
    config: &'a BTreeMap<String, String>,
    executor: &'a dyn Executor,
}

impl fmt::Debug for Item<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Item")
            .field("name", &self.name)
            .field("strategy", &self.strategy)
            .field("dir", &self.dir)
            .finish_non_exhaustive()
    }
}

impl<'a> Item<'a> {
    /// Create an item, classifying `via` into a strategy.
    #[must_use]
    pub fn new(
        name: &'a str,
        via: &str,
        config: &'a BTreeMap<String, String>,
        executor: &'a dyn Executor,
    ) -> Self {
        Self {
            name,
            strategy: InstallerStrategy::classify(via),
            dir: None,
            config,
            executor,
        }
    }

    /// Run a shell command strategy inside `dir` instead of the current
    /// directory.  Other strategies ignore it.
    #[must_use]
    pub fn in_directory(mut self, dir: PathBuf) -> Self {
        self.dir = Some(dir);
        self
    }

    /// Package name.
    #[must_use]
    pub const fn name(&self) -> &str {
        self.name
    }

    /// How this item will be installed.
    #[must_use]
    pub const fn strategy(&self) -> &InstallerStrategy {
        &self.strategy
    }

    /// What [`apply`](Applicable::apply) would do, for dry runs.
    #[must_use]
    pub fn plan(&self) -> String {
        match (self.strategy.command(self.name), &self.dir) {
            (Some(cmd), Some(dir)) if cmd.use_shell => {
                format!("would run in {}: {cmd}", dir.display())
            }
            (Some(cmd), _) => format!("would run: {cmd}"),
            (None, _) => format!("would download {} and install its app bundle", self.strategy),
        }
    }
}

impl Applicable for Item<'_> {
    fn description(&self) -> String {
        format!("{} via {}", self.name, self.strategy)
    }

    fn apply(&self) -> Result<ResourceChange> {
        tracing::info!("Installing {}...", self.description());
        let change = self.install()?;
        tracing::info!("Installing {}...Done!", self.description());
        Ok(change)
    }
}

impl Item<'_> {
    fn install(&self) -> Result<ResourceChange> {
        match &self.strategy {
            InstallerStrategy::PackageManager(pm) => {
                if !self.executor.which(pm.program()) {
                    return Err(ResourceError::ToolMissing(pm.program().to_string()).into());
                }
                run_checked(self.executor, &pm.install_argv(self.name), false)?;
                Ok(ResourceChange::Applied)
            }
            InstallerStrategy::UrlArtifact(url) => {
                ArtifactInstaller::from_config(self.name, url, self.config)?.install(self.executor)
            }
            InstallerStrategy::RawCommand(line) => {
                let argv = std::slice::from_ref(line);
                match &self.dir {
                    Some(dir) => {
                        if !dir.is_dir() {
                            return Err(ResourceError::MissingDirectory(dir.clone()).into());
                        }
                        with_directory(dir, || run_checked(self.executor, argv, true))?;
                    }
                    None => run_checked(self.executor, argv, true)?,
                }
                Ok(ResourceChange::Applied)
            }
        }
    }
}
