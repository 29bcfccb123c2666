//! # Mixgen
//!
//! A command-line generator for blind source separation test mixtures.

use log::error;

mod cli;
mod logging;
mod runner;

fn main() {
    let args = cli::args::build_cli().get_matches();
    logging::init(args.get_flag("quiet"));

    // For any error, return an exit code -1. Otherwise return the exit code provided.
    let code = match runner::run(&args) {
        Ok(code) => code,
        Err(err) => {
            error!("{}", err.to_string().to_lowercase());
            -1
        }
    };

    std::process::exit(code)
}
