//! Units of declared work (check + apply pattern).
//!
//! Each entity wraps one entry of a resolved manifest: an [`item::Item`]
//! installs one package, a [`repo::Repo`] clones one repository, and a
//! [`script::Script`] runs one custom script.
pub mod helpers;
pub mod item;
pub mod repo;
pub mod script;

use anyhow::Result;

/// Minimal interface for entities that can be described and applied.
///
/// Entities with no cheap way to check their own state (a package installed
/// through an arbitrary command, a script) implement only this trait.
/// Entities that can inspect the machine implement the richer [`Resource`]
/// super-trait.
pub trait Applicable {
    /// Human-readable description of this entity.
    fn description(&self) -> String;

    /// Apply the entity's change.
    ///
    /// # Errors
    ///
    /// Returns an error if a spawned command fails, a required tool or
    /// directory is missing, or the network is needed but unreachable.
    fn apply(&self) -> Result<ResourceChange>;
}

/// State of an entity on this machine.
///
/// # Examples
///
/// ```
/// use snix::resources::ResourceState;
///
/// let missing = ResourceState::Missing;
/// let skip = ResourceState::Invalid { reason: "not a directory".into() };
///
/// assert_ne!(missing, ResourceState::Correct);
/// assert_ne!(skip, missing);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResourceState {
    /// Not present yet.
    Missing,
    /// Present and matching the desired state.
    Correct,
    /// Cannot be applied (e.g. the target path exists but is a file).
    Invalid {
        /// Reason why the entity cannot be applied.
        reason: String,
    },
}

/// Result of applying an entity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResourceChange {
    /// The change was made.
    Applied,
    /// Nothing to do; the machine already matched.
    AlreadyCorrect,
}

/// Entities that can determine their own state before applying.
pub trait Resource: Applicable {
    /// Check the current state of the entity.
    ///
    /// # Errors
    ///
    /// Returns an error if the state cannot be determined.
    fn current_state(&self) -> Result<ResourceState>;

    /// Whether [`Applicable::apply`] would change anything.
    ///
    /// # Errors
    ///
    /// Propagates errors from [`current_state`](Self::current_state).
    fn needs_change(&self) -> Result<bool> {
        Ok(matches!(self.current_state()?, ResourceState::Missing))
    }
}

/// Shared test helpers for entity unit tests.
#[cfg(test)]
pub mod test_helpers {
    use crate::exec::{ExecResult, Executor};

    // Executor whose calls are set up per test with `expect_*`.
    mockall::mock! {
        pub Executor {}

        impl Executor for Executor {
            fn execute(&self, argv: &[String], use_shell: bool) -> anyhow::Result<ExecResult>;
            fn which(&self, program: &str) -> bool;
            fn network_reachable(&self) -> bool;
        }
    }

    /// An [`ExecResult`] with the given exit code.
    #[must_use]
    pub const fn exit(code: i32) -> ExecResult {
        ExecResult {
            success: code == 0,
            code: Some(code),
        }
    }
}
