//! Command-line interface.
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Top-level CLI entry point.
#[derive(Parser, Debug)]
#[command(
    name = "snix",
    about = "Declarative workstation provisioning from layered manifests",
    version
)]
pub struct Cli {
    /// Subcommand to run.
    #[command(subcommand)]
    pub command: Command,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Options shared by every subcommand.
    #[command(flatten)]
    pub global: GlobalOpts,
}

/// Options shared across all subcommands.
#[derive(Parser, Debug, Clone, Default)]
pub struct GlobalOpts {
    /// Preview changes without applying
    #[arg(short = 'd', long, global = true)]
    pub dry_run: bool,

    /// Install root (overrides SNIX_HOME and the saved setting)
    #[arg(long, global = true, value_name = "DIR")]
    pub home: Option<PathBuf>,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Resolve a manifest and install everything it declares
    Install(ManifestOpts),
    /// Resolve a manifest and print what it declares
    Show(ManifestOpts),
    /// Save the install root and prepare its code directory
    Init,
    /// Print version information
    Version,
}

/// Options for subcommands that take a manifest.
#[derive(Parser, Debug, Clone)]
pub struct ManifestOpts {
    /// Path to the root manifest
    #[arg(value_name = "MANIFEST")]
    pub manifest: PathBuf,
}
