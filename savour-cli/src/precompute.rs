//! `precompute` subcommand.

use std::io::Write;

use camino::{Utf8Path, Utf8PathBuf};
use clap::Parser;
use ortho_config::{OrthoConfig, SubcmdConfigMerge};
use savour_core::DEFAULT_DIMENSIONS;
use savour_data::{DEFAULT_PRECOMPUTE_MIN_REVIEWS, PrecomputeSummary, run_precompute};
use serde::{Deserialize, Serialize};

use crate::fs::require_existing;
use crate::{
    ARG_DATABASE, ARG_DIMENSIONS, ARG_MIN_REVIEWS, ARG_OUTPUT, CliError, ENV_PRECOMPUTE_DATABASE,
    ENV_PRECOMPUTE_OUTPUT, embedder, write_json,
};

/// CLI arguments for the `precompute` subcommand.
#[derive(Debug, Clone, Parser, Deserialize, Serialize, OrthoConfig, Default)]
#[command(
    name = "precompute",
    long_about = "Embed every restaurant with enough written reviews and \
                 write the vectors to an embedding store that `search \
                 --embeddings` can load.",
    about = "Build an embedding store"
)]
#[ortho_config(prefix = "SAVOUR")]
pub(crate) struct PrecomputeArgs {
    /// Restaurant SQLite database.
    #[arg(long = ARG_DATABASE, value_name = "path")]
    #[serde(default)]
    pub(crate) database: Option<Utf8PathBuf>,
    /// Destination of the embedding store.
    #[arg(long = ARG_OUTPUT, value_name = "path")]
    #[serde(default)]
    pub(crate) output: Option<Utf8PathBuf>,
    /// Skip restaurants with fewer written reviews.
    #[arg(long = ARG_MIN_REVIEWS, value_name = "count")]
    #[serde(default)]
    pub(crate) min_reviews: Option<usize>,
    /// Embedding dimensionality.
    #[arg(long = ARG_DIMENSIONS, value_name = "count")]
    #[serde(default)]
    pub(crate) dimensions: Option<usize>,
}

impl PrecomputeArgs {
    pub(crate) fn into_config(self) -> Result<PrecomputeConfig, CliError> {
        let merged = self.load_and_merge().map_err(CliError::Configuration)?;
        PrecomputeConfig::try_from(merged)
    }
}

/// Resolved `precompute` command configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct PrecomputeConfig {
    pub(crate) database: Utf8PathBuf,
    pub(crate) output: Utf8PathBuf,
    pub(crate) min_reviews: usize,
    pub(crate) dimensions: usize,
}

impl TryFrom<PrecomputeArgs> for PrecomputeConfig {
    type Error = CliError;

    fn try_from(args: PrecomputeArgs) -> Result<Self, Self::Error> {
        let database = args.database.ok_or(CliError::MissingArgument {
            field: ARG_DATABASE,
            env: ENV_PRECOMPUTE_DATABASE,
        })?;
        let output = args.output.ok_or(CliError::MissingArgument {
            field: ARG_OUTPUT,
            env: ENV_PRECOMPUTE_OUTPUT,
        })?;
        Ok(Self {
            database,
            output,
            min_reviews: args.min_reviews.unwrap_or(DEFAULT_PRECOMPUTE_MIN_REVIEWS),
            dimensions: args.dimensions.unwrap_or(DEFAULT_DIMENSIONS),
        })
    }
}

/// Summary printed after a successful run.
#[derive(Debug, Serialize)]
struct PrecomputeReport<'a> {
    output: &'a Utf8Path,
    #[serde(flatten)]
    summary: PrecomputeSummary,
}

pub(crate) fn run_precompute_with(
    args: PrecomputeArgs,
    writer: &mut dyn Write,
) -> Result<(), CliError> {
    let config = args.into_config()?;
    require_existing(&config.database, ARG_DATABASE)?;
    let embedder = embedder(config.dimensions)?;
    let summary = run_precompute(
        &config.database,
        &config.output,
        config.min_reviews,
        embedder.as_ref(),
    )?;
    write_json(
        writer,
        &PrecomputeReport {
            output: &config.output,
            summary,
        },
    )
}
