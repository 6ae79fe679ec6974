//! Phase: clone declared repositories.
use anyhow::Result;

use super::{Context, Task, TaskResult, apply_in_order};
use crate::resources::repo::Repo;
use crate::resources::{Resource, ResourceState};

/// Clone every declared repository into the install root.
#[derive(Debug)]
pub struct CloneRepositories;

fn plan(repo: &Repo<'_>) -> String {
    match repo.current_state() {
        Ok(ResourceState::Correct) => format!("{} already cloned", repo.location()),
        Ok(ResourceState::Missing) => match repo.target() {
            Ok(target) => format!("would clone {} into {}", repo.location(), target.display()),
            Err(e) => format!("cannot clone {}: {e}", repo.location()),
        },
        Ok(ResourceState::Invalid { reason }) => {
            format!("cannot clone {}: {reason}", repo.location())
        }
        Err(e) => format!("cannot clone {}: {e}", repo.location()),
    }
}

impl Task for CloneRepositories {
    fn name(&self) -> &'static str {
        "Clone repositories"
    }

    fn should_run(&self, ctx: &Context<'_>) -> bool {
        ctx.resolved.repo_count() > 0
    }

    fn run(&self, ctx: &Context<'_>) -> Result<TaskResult> {
        ctx.log.debug(&format!(
            "{} repositories to process",
            ctx.resolved.repo_count()
        ));
        apply_in_order(ctx, ctx.resolved.repos(ctx.executor()), plan)
    }
}
