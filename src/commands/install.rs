//! Command: resolve a manifest and install what it declares.
use anyhow::Result;
use std::sync::Arc;

use super::{CommandSetup, run_tasks_to_completion};
use crate::cli::{GlobalOpts, ManifestOpts};
use crate::exec::Executor;
use crate::logging::{Log, Logger};
use crate::tasks::{self, Context};

/// Run the install command.
///
/// Resolves the manifest, then clones repositories, installs items, and runs
/// custom scripts, stopping at the first failure.
///
/// # Errors
///
/// Returns an error if resolution fails or any phase fails.
pub fn run(
    global: &GlobalOpts,
    opts: &ManifestOpts,
    log: &Arc<Logger>,
    executor: Arc<dyn Executor>,
) -> Result<()> {
    log.info(&format!("snix {}", super::version::version()));
    if global.dry_run {
        log.dry_run("dry run: nothing will be installed");
    }

    let setup = CommandSetup::init(global, &opts.manifest, executor.as_ref(), log)?;
    let ctx = Context::new(
        &setup.resolved,
        Arc::clone(log) as Arc<dyn Log>,
        executor,
        global.dry_run,
    );

    run_tasks_to_completion(&tasks::all_install_tasks(), &ctx, log)?;

    for entry in setup.resolved.required_path_entries() {
        log.debug(&format!("PATH must include {}", entry.display()));
    }
    Ok(())
}
