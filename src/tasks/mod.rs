//! Install phases that turn a resolved manifest into changes on the machine.
//!
//! Phases run in a fixed order (repositories, then items, then custom
//! scripts) and the first failure ends the run.
pub mod context;
pub mod items;
mod processing;
pub mod repos;
pub mod scripts;

pub use context::Context;
pub use processing::{TaskResult, TaskStats, apply_in_order};

use anyhow::Result;

use crate::logging::TaskStatus;

/// A named install phase.
pub trait Task: Send + Sync {
    /// Human-readable phase name.
    fn name(&self) -> &str;

    /// Whether the resolved manifest declares anything for this phase.
    fn should_run(&self, ctx: &Context<'_>) -> bool;

    /// Execute the phase.
    ///
    /// # Errors
    ///
    /// Returns the first error raised by one of the phase's entities.
    fn run(&self, ctx: &Context<'_>) -> Result<TaskResult>;
}

/// The phases run by the install command, in execution order.
#[must_use]
pub fn all_install_tasks() -> Vec<Box<dyn Task>> {
    vec![
        Box::new(repos::CloneRepositories),
        Box::new(items::InstallItems),
        Box::new(scripts::RunCustomScripts),
    ]
}

/// Execute a phase, recording its outcome in the logger.
///
/// # Errors
///
/// Returns the phase's error after recording it as failed.
pub fn execute(task: &dyn Task, ctx: &Context<'_>) -> Result<()> {
    if !task.should_run(ctx) {
        ctx.log
            .debug(&format!("skipping phase: {} (nothing declared)", task.name()));
        ctx.log
            .record_task(task.name(), TaskStatus::NotApplicable, None);
        return Ok(());
    }

    ctx.log.stage(task.name());

    match task.run(ctx) {
        Ok(TaskResult::Ok) => {
            ctx.log.record_task(task.name(), TaskStatus::Ok, None);
            Ok(())
        }
        Ok(TaskResult::DryRun) => {
            ctx.log.record_task(task.name(), TaskStatus::DryRun, None);
            Ok(())
        }
        Err(e) => {
            ctx.log
                .record_task(task.name(), TaskStatus::Failed, Some(&format!("{e:#}")));
            Err(e)
        }
    }
}

/// Run `tasks` in order, stopping at the first failed phase.
///
/// # Errors
///
/// Returns the error of the phase that failed.
pub fn run_all(tasks: &[Box<dyn Task>], ctx: &Context<'_>) -> Result<()> {
    tasks.iter().try_for_each(|task| execute(task.as_ref(), ctx))
}
