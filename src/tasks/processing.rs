//! Generic entity loop: plan or apply each entity in order, collect stats.
use anyhow::{Context as _, Result};

use super::context::Context;
use crate::resources::{Applicable, ResourceChange};

/// Result of a single phase.
///
/// # Examples
///
/// ```
/// use snix::tasks::TaskResult;
///
/// let ok = TaskResult::Ok;
/// let dry = TaskResult::DryRun;
///
/// assert!(matches!(ok, TaskResult::Ok));
/// assert!(matches!(dry, TaskResult::DryRun));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskResult {
    /// Phase completed and its changes were applied.
    Ok,
    /// Phase ran in dry-run mode.
    DryRun,
}

/// Counters for a phase that processes many entities.
///
/// # Examples
///
/// ```
/// use snix::tasks::TaskStats;
///
/// let mut stats = TaskStats::new();
/// stats.changed = 3;
/// stats.already_ok = 1;
///
/// assert_eq!(stats.summary(false), "3 changed, 1 already ok");
/// assert_eq!(stats.summary(true), "3 would change, 1 already ok");
/// ```
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct TaskStats {
    /// Entities applied (or that would be, in a dry run).
    pub changed: u32,
    /// Entities whose target was already in place.
    pub already_ok: u32,
}

impl TaskStats {
    /// Create a new empty stats counter.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Format the summary string (e.g. "3 changed, 1 already ok").
    #[must_use]
    pub fn summary(&self, dry_run: bool) -> String {
        let verb = if dry_run { "would change" } else { "changed" };
        format!("{} {verb}, {} already ok", self.changed, self.already_ok)
    }

    /// Log the summary and return the matching [`TaskResult`].
    #[must_use]
    pub fn finish(self, ctx: &Context<'_>) -> TaskResult {
        ctx.log.info(&self.summary(ctx.dry_run));
        if ctx.dry_run {
            TaskResult::DryRun
        } else {
            TaskResult::Ok
        }
    }
}

/// Apply every entity in order, stopping at the first failure.
///
/// In a dry run nothing is applied; `plan` describes what would happen to
/// each entity and every entity counts as a change.  The failing entity's
/// description is attached to the returned error.
///
/// # Errors
///
/// Returns the first error raised by [`Applicable::apply`].
pub fn apply_in_order<R, I, P>(ctx: &Context<'_>, entities: I, plan: P) -> Result<TaskResult>
where
    R: Applicable,
    I: IntoIterator<Item = R>,
    P: Fn(&R) -> String,
{
    let mut stats = TaskStats::new();
    for entity in entities {
        if ctx.dry_run {
            ctx.log.dry_run(&plan(&entity));
            stats.changed += 1;
            continue;
        }

        let desc = entity.description();
        ctx.log.debug(&format!("applying {desc}"));
        match entity.apply().with_context(|| desc.clone())? {
            ResourceChange::Applied => {
                ctx.log.debug(&format!("applied: {desc}"));
                stats.changed += 1;
            }
            ResourceChange::AlreadyCorrect => {
                ctx.log.debug(&format!("ok: {desc}"));
                stats.already_ok += 1;
            }
        }
    }
    Ok(stats.finish(ctx))
}
