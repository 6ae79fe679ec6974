//! Helpers shared by resource implementations.
pub mod fs;

use anyhow::Result;

use crate::error::ResourceError;
use crate::exec::Executor;

/// Run `argv` and turn a non-zero exit into [`ResourceError::ExecutionFailed`].
///
/// # Errors
///
/// Returns an error if the process cannot be spawned or exits non-zero.
pub fn run_checked(executor: &dyn Executor, argv: &[String], use_shell: bool) -> Result<()> {
    let result = executor.execute(argv, use_shell)?;
    tracing::debug!("{}: exit {}", argv.join(" "), result.exit_code());
    if result.success {
        Ok(())
    } else {
        Err(ResourceError::ExecutionFailed {
            command: argv.join(" "),
            exit_code: result.exit_code(),
        }
        .into())
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used, clippy::panic)]
mod tests {
    use super::*;
    use crate::resources::test_helpers::{MockExecutor, exit};

    #[test]
    fn zero_exit_is_ok() {
        let mut executor = MockExecutor::new();
        executor.expect_execute().times(1).returning(|_, _| Ok(exit(0)));
        run_checked(&executor, &["true".to_string()], false).unwrap();
    }

    #[test]
    fn non_zero_exit_carries_command_and_code() {
        let mut executor = MockExecutor::new();
        executor.expect_execute().times(1).returning(|_, _| Ok(exit(2)));
        let err = run_checked(&executor, &["make".to_string(), "all".to_string()], true)
            .unwrap_err();
        match err.downcast_ref::<ResourceError>() {
            Some(ResourceError::ExecutionFailed { command, exit_code }) => {
                assert_eq!(command, "make all");
                assert_eq!(*exit_code, 2);
            }
            other => panic!("expected ExecutionFailed, got {other:?}"),
        }
    }
}
