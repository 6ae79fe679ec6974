//! Command-line entry point for snix.

use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;

use snix::cli::{Cli, Command};
use snix::commands;
use snix::exec::{Executor, SystemExecutor};
use snix::logging::{self, Logger};

fn main() -> ExitCode {
    let _ = enable_ansi_support::enable_ansi_support();
    let args = Cli::parse();

    let command = match &args.command {
        Command::Install(_) => "install",
        Command::Show(_) => "show",
        Command::Init => "init",
        Command::Version => {
            commands::version::run();
            return ExitCode::SUCCESS;
        }
    };
    logging::init_subscriber(args.verbose, command);

    let log = Arc::new(Logger::new(command));
    let executor: Arc<dyn Executor> = Arc::new(SystemExecutor::new());

    let result = match &args.command {
        Command::Install(opts) => commands::install::run(&args.global, opts, &log, executor),
        Command::Show(opts) => {
            commands::show::run(&args.global, opts, &log, executor.as_ref())
        }
        Command::Init => commands::init::run(&args.global, &log).map(drop),
        Command::Version => Ok(()),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log.error(&format!("{e:#} -Aborting!-"));
            ExitCode::FAILURE
        }
    }
}
