mod cli;
mod commands;
mod error;
mod logging;

use clap::Parser;

fn main() {
    let args = cli::Cli::parse();

    if let Err(e) = logging::setup_logging(args.verbose, args.quiet, args.log_file.clone()) {
        eprintln!("Error: failed to initialize logging: {e}");
        std::process::exit(1);
    }

    if let Err(e) = commands::nvt::run(&args) {
        tracing::error!("{e}");
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
