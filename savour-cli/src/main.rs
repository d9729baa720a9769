//! Entry point for the command-line interface.
#![forbid(unsafe_code)]

use env_logger::Env;
use savour_cli::CliError;

fn main() -> eyre::Result<()> {
    env_logger::Builder::from_env(Env::default().default_filter_or("warn")).init();
    match savour_cli::run() {
        Err(CliError::ArgumentParsing(err)) => err.exit(),
        outcome => outcome.map_err(eyre::Report::from),
    }
}
