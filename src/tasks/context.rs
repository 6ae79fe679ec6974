//! Shared execution context handed to every phase.
use std::sync::Arc;

use crate::exec::Executor;
use crate::logging::Log;
use crate::resolver::ResolvedContext;

/// Everything a phase needs to do its work.
pub struct Context<'a> {
    /// Merged result of the manifest include graph.
    pub resolved: &'a ResolvedContext,
    /// Logger.
    pub log: Arc<dyn Log>,
    /// Runs external commands.
    pub executor: Arc<dyn Executor>,
    /// Report planned changes instead of applying them.
    pub dry_run: bool,
}

impl std::fmt::Debug for Context<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Context")
            .field("home", &self.resolved.home())
            .field("dry_run", &self.dry_run)
            .finish_non_exhaustive()
    }
}

impl<'a> Context<'a> {
    /// Create a context over a resolved manifest.
    #[must_use]
    pub const fn new(
        resolved: &'a ResolvedContext,
        log: Arc<dyn Log>,
        executor: Arc<dyn Executor>,
        dry_run: bool,
    ) -> Self {
        Self {
            resolved,
            log,
            executor,
            dry_run,
        }
    }

    /// The executor as a plain trait object, for handing to entities.
    #[must_use]
    pub fn executor(&self) -> &dyn Executor {
        self.executor.as_ref()
    }
}
