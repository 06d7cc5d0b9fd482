//! imgdedup - Perceptual Duplicate Image Remover
//!
//! Entry point for the imgdedup CLI.

use clap::Parser;
use imgdedup::{cli::Cli, error::ExitCode, logging};

fn main() {
    let cli = Cli::parse();
    logging::init_logging(cli.verbose, cli.quiet);

    match imgdedup::run_app(cli) {
        Ok(code) => std::process::exit(code.as_i32()),
        Err(err) => {
            eprintln!("Error: {err:#}");
            std::process::exit(ExitCode::GeneralError.as_i32());
        }
    }
}
