//! Declarative workstation provisioning.
//!
//! A root manifest lists packages to install, repositories to clone, and
//! scripts to run, and may include group manifests from other repositories.
//! Resolution clones missing include repositories, validates every manifest
//! against a JSON schema, and merges them into one read-only context that
//! the install phases then apply in a fixed order.
//!
//! The public API is organised into these layers:
//!
//! - **[`manifest`]**: load and schema-validate one manifest file
//! - **[`resolver`]**: walk the include graph into a [`resolver::ResolvedContext`]
//! - **[`installer`]**: pick how an item is installed from its `via`
//! - **[`resources`]**: idempotent repo, item, and script entities
//! - **[`tasks`]**: the ordered, fail-fast install phases
//! - **[`commands`]**: top-level subcommands (`install`, `show`, `init`, `version`)
#![deny(clippy::or_fun_call)]
#![deny(clippy::bool_to_int_with_if)]

pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod exec;
pub mod installer;
pub mod logging;
pub mod manifest;
pub mod resolver;
pub mod resources;
pub mod tasks;
