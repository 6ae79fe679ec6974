//! Subcommand implementations and the setup they share.
pub mod init;
pub mod install;
pub mod show;
pub mod version;

use anyhow::Result;
use std::path::{Path, PathBuf};

use crate::cli::GlobalOpts;
use crate::config::{self, HOME_ENV};
use crate::exec::Executor;
use crate::logging::Logger;
use crate::manifest::{ManifestLoader, schema_path};
use crate::resolver::{ResolvedContext, Resolver};
use crate::tasks::{self, Context, Task};

/// Shared state produced by the common command setup sequence.
///
/// Locates the install root, loads the schema from its code directory, and
/// resolves the requested manifest so that each command does not have to
/// repeat the boilerplate.
#[derive(Debug)]
pub struct CommandSetup {
    /// Install root in canonical form.
    pub home: PathBuf,
    /// Merged result of the manifest and everything it includes.
    pub resolved: ResolvedContext,
}

impl CommandSetup {
    /// Resolve the install root and the manifest at `manifest`.
    ///
    /// # Errors
    ///
    /// Returns an error if the install root cannot be determined, the schema
    /// cannot be loaded, or any manifest fails to load, validate, or resolve.
    pub fn init(
        global: &GlobalOpts,
        manifest: &Path,
        executor: &dyn Executor,
        log: &Logger,
    ) -> Result<Self> {
        let home = config::resolve_home(
            global.home.as_deref(),
            std::env::var_os(HOME_ENV),
            config::settings_path().as_deref(),
        )?;
        log.debug(&format!("snix home: {}", home.display()));

        log.stage("Loading schema");
        let loader = ManifestLoader::new(&schema_path(&home))?;
        log.debug(&format!("schema: {}", loader.schema_path().display()));

        log.stage("Resolving manifests");
        let resolved = Resolver::new(&home, &loader, executor, log).resolve(manifest)?;
        log.info(&format!(
            "{} manifest(s): {} item(s), {} repo(s), {} script(s)",
            resolved.manifests().len(),
            resolved.item_count(),
            resolved.repo_count(),
            resolved.script_count()
        ));

        Ok(Self { home, resolved })
    }
}

/// Execute the phases in order, print the summary, and return the first
/// failure.
///
/// Completed phases are not rolled back.
///
/// # Errors
///
/// Returns the error of the phase that stopped the run.
pub fn run_tasks_to_completion(
    tasks: &[Box<dyn Task>],
    ctx: &Context<'_>,
    log: &Logger,
) -> Result<()> {
    let result = tasks::run_all(tasks, ctx);
    log.print_summary();
    result
}
