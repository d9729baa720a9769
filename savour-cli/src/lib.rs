//! Command-line interface for the Savour search engine.
//!
//! Every subcommand resolves its inputs through `ortho_config`, so paths
//! and filters can come from CLI flags, configuration files or `SAVOUR_`
//! environment variables. Results are printed to stdout as pretty JSON.
#![forbid(unsafe_code)]

use std::io::Write;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use savour_core::Embedder;
#[cfg(not(feature = "local-embeddings"))]
use savour_core::HashingEmbedder;
#[cfg(feature = "local-embeddings")]
use savour_core::{FastEmbedSession, MINILM_DIMENSIONS, SingleFlight};
use serde::Serialize;

mod error;
mod fs;
mod health;
mod precompute;
mod search;

pub use error::CliError;

use health::HealthArgs;
use precompute::PrecomputeArgs;
use search::{BrowseArgs, SearchArgs};

pub(crate) const ARG_DATABASE: &str = "database";
pub(crate) const ARG_EMBEDDINGS: &str = "embeddings";
pub(crate) const ARG_OUTPUT: &str = "output";
pub(crate) const ARG_QUERY: &str = "query";
pub(crate) const ARG_LAT: &str = "lat";
pub(crate) const ARG_LNG: &str = "lng";
pub(crate) const ARG_RADIUS: &str = "radius";
pub(crate) const ARG_MAX_PRICE: &str = "max-price";
pub(crate) const ARG_RANK_BY: &str = "rank-by";
pub(crate) const ARG_DIMENSIONS: &str = "dimensions";
pub(crate) const ARG_MIN_REVIEWS: &str = "min-reviews";
pub(crate) const ENV_SEARCH_QUERY: &str = "SAVOUR_CMDS_SEARCH_QUERY";
pub(crate) const ENV_SEARCH_DATABASE: &str = "SAVOUR_CMDS_SEARCH_DATABASE";
pub(crate) const ENV_BROWSE_DATABASE: &str = "SAVOUR_CMDS_BROWSE_DATABASE";
pub(crate) const ENV_HEALTH_DATABASE: &str = "SAVOUR_CMDS_HEALTH_DATABASE";
pub(crate) const ENV_PRECOMPUTE_DATABASE: &str = "SAVOUR_CMDS_PRECOMPUTE_DATABASE";
pub(crate) const ENV_PRECOMPUTE_OUTPUT: &str = "SAVOUR_CMDS_PRECOMPUTE_OUTPUT";

/// Run the Savour CLI with the current process arguments and environment.
///
/// # Errors
/// Returns [`CliError`] when arguments are invalid, inputs are missing or
/// the requested command fails.
pub fn run() -> Result<(), CliError> {
    let cli = Cli::try_parse().map_err(CliError::ArgumentParsing)?;
    let mut stdout = std::io::stdout().lock();
    run_command(cli.command, &mut stdout)
}

fn run_command(command: Command, writer: &mut dyn Write) -> Result<(), CliError> {
    match command {
        Command::Search(args) => search::run_search_with(args, writer),
        Command::Browse(args) => search::run_browse_with(args, writer),
        Command::Health(args) => health::run_health_with(args, writer),
        Command::Precompute(args) => precompute::run_precompute_with(args, writer),
    }
}

#[derive(Debug, Parser)]
#[command(
    name = "savour",
    about = "Rank restaurants by meaning, quality and momentum",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Rank restaurants against a free-text query.
    Search(SearchArgs),
    /// List the best restaurants without a query.
    Browse(BrowseArgs),
    /// Report whether the data, model and embeddings load.
    Health(HealthArgs),
    /// Embed every restaurant and write an embedding store.
    Precompute(PrecomputeArgs),
}

/// Embedder used by every subcommand: all-MiniLM-L6-v2 behind a
/// single-flight gate.
#[cfg(feature = "local-embeddings")]
pub(crate) fn embedder(dimensions: usize) -> Result<Arc<dyn Embedder>, CliError> {
    if dimensions != MINILM_DIMENSIONS {
        return Err(CliError::ModelDimensions {
            requested: dimensions,
            model: MINILM_DIMENSIONS,
        });
    }
    Ok(Arc::new(SingleFlight::new(FastEmbedSession::new())))
}

/// Embedder used by every subcommand: the model-free hashing fallback.
#[cfg(not(feature = "local-embeddings"))]
#[expect(
    clippy::unnecessary_wraps,
    reason = "shares its signature with the model-backed variant"
)]
pub(crate) fn embedder(dimensions: usize) -> Result<Arc<dyn Embedder>, CliError> {
    Ok(Arc::new(HashingEmbedder::new(dimensions)))
}

pub(crate) fn write_json<T: Serialize + ?Sized>(
    writer: &mut dyn Write,
    value: &T,
) -> Result<(), CliError> {
    let payload = serde_json::to_string_pretty(value).map_err(CliError::SerialiseOutput)?;
    writer
        .write_all(payload.as_bytes())
        .map_err(CliError::WriteOutput)?;
    writer.write_all(b"\n").map_err(CliError::WriteOutput)?;
    Ok(())
}

#[cfg(test)]
mod tests;
