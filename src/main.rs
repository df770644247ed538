#![allow(clippy::too_many_arguments)]

mod cli;

use std::process::ExitCode;

use clap::Parser;
use sketchfe::logger;

fn main() -> ExitCode {
    let args = cli::CliArgs::parse();

    // Initialize session log (overwrites previous session log)
    match &args.log {
        Some(path) => logger::init_at(path),
        None => logger::init(),
    }
    logger::set_verbose(args.verbose);

    cli::run(args)
}
