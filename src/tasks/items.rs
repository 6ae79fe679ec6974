//! Phase: install declared items.
use anyhow::Result;

use super::{Context, Task, TaskResult, apply_in_order};
use crate::resources::item::Item;

/// Install every declared item, one name at a time.
#[derive(Debug)]
pub struct InstallItems;

impl Task for InstallItems {
    fn name(&self) -> &'static str {
        "Install items"
    }

    fn should_run(&self, ctx: &Context<'_>) -> bool {
        ctx.resolved.item_count() > 0
    }

    fn run(&self, ctx: &Context<'_>) -> Result<TaskResult> {
        ctx.log
            .debug(&format!("{} items to process", ctx.resolved.item_count()));
        apply_in_order(ctx, ctx.resolved.items(ctx.executor()), Item::plan)
    }
}
