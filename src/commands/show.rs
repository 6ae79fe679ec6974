//! Command: print the resolved manifest without installing anything.
use anyhow::Result;
use std::fmt::Write as _;

use super::CommandSetup;
use crate::cli::{GlobalOpts, ManifestOpts};
use crate::exec::Executor;
use crate::logging::Logger;
use crate::resolver::ResolvedContext;

/// Resolve the manifest and print its merged contents to stdout.
///
/// Resolution may still clone repositories holding included manifests.
///
/// # Errors
///
/// Returns an error if resolution fails.
#[allow(clippy::print_stdout)]
pub fn run(
    global: &GlobalOpts,
    opts: &ManifestOpts,
    log: &Logger,
    executor: &dyn Executor,
) -> Result<()> {
    let setup = CommandSetup::init(global, &opts.manifest, executor, log)?;
    print!("{}", render(&setup.resolved));
    Ok(())
}

/// The resolved context followed by the `PATH` entries it needs.
#[must_use]
pub fn render(resolved: &ResolvedContext) -> String {
    let mut out = resolved.to_string();
    out.push_str("Required PATH entries:\n");
    for entry in resolved.required_path_entries() {
        let _ = writeln!(out, "  {}", entry.display());
    }
    out
}
