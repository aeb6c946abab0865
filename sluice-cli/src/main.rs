//! Sluice CLI - Command-line interface for the Sluice migration resolver.

use clap::Parser;

use sluice_cli::cli::{Cli, Command};
use sluice_cli::commands;
use sluice_cli::error::CliResult;
use sluice_cli::{logging, output};

fn main() {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    if let Err(e) = run(cli) {
        output::newline();
        output::error(&e.to_string());
        std::process::exit(e.exit_code());
    }
}

fn run(cli: Cli) -> CliResult<()> {
    let config = cli.config.as_deref();

    match cli.command {
        Command::Resolve(args) => commands::resolve::run(config, args),
        Command::Validate(args) => commands::validate::run(config, args),
        Command::Version => commands::version::run(),
    }
}
