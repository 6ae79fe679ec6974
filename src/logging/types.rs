//! Core logging types: phase entries, status, and the [`Log`] trait.

/// Phase execution result for summary reporting.
#[derive(Debug, Clone)]
pub struct TaskEntry {
    /// Human-readable phase name.
    pub name: String,
    /// Final status of the phase.
    pub status: TaskStatus,
    /// Optional detail message (e.g., change counts or error description).
    pub message: Option<String>,
}

/// Status of a completed phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskStatus {
    /// Phase completed successfully.
    Ok,
    /// Phase had nothing to do (the manifest declares no entries for it).
    NotApplicable,
    /// Phase ran in dry-run mode; no changes were applied.
    DryRun,
    /// Phase hit a fatal error; the run stopped here.
    Failed,
}

/// Abstraction over logging backends.
///
/// Resolution and orchestration code logs through this trait so tests can
/// substitute a quiet or recording implementation.
pub trait Log: Send + Sync {
    /// Log a stage header (major section).
    fn stage(&self, msg: &str);
    /// Log an informational message.
    fn info(&self, msg: &str);
    /// Log a debug message (suppressed on console unless verbose).
    fn debug(&self, msg: &str);
    /// Log a warning message.
    fn warn(&self, msg: &str);
    /// Log an error message.
    fn error(&self, msg: &str);
    /// Log a dry-run action message.
    fn dry_run(&self, msg: &str);
    /// Record a phase result for the summary.
    fn record_task(&self, name: &str, status: TaskStatus, message: Option<&str>);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn task_status_equality() {
        assert_eq!(TaskStatus::Ok, TaskStatus::Ok);
        assert_ne!(TaskStatus::Ok, TaskStatus::Failed);
        assert_ne!(TaskStatus::NotApplicable, TaskStatus::DryRun);
    }
}
