//! Phase: run custom scripts.
use anyhow::Result;

use super::{Context, Task, TaskResult, apply_in_order};

/// Run every declared custom script from the install root.
#[derive(Debug)]
pub struct RunCustomScripts;

impl Task for RunCustomScripts {
    fn name(&self) -> &'static str {
        "Run custom scripts"
    }

    fn should_run(&self, ctx: &Context<'_>) -> bool {
        ctx.resolved.script_count() > 0
    }

    fn run(&self, ctx: &Context<'_>) -> Result<TaskResult> {
        apply_in_order(ctx, ctx.resolved.scripts(ctx.executor()), |script| {
            format!("would execute {}", script.path().display())
        })
    }
}
