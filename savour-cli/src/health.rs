//! `health` subcommand.

use std::io::Write;

use camino::Utf8PathBuf;
use clap::Parser;
use ortho_config::{OrthoConfig, SubcmdConfigMerge};
use savour_core::DEFAULT_DIMENSIONS;
use savour_search::SearchService;
use serde::{Deserialize, Serialize};

use crate::search::SourceConfig;
use crate::{
    ARG_DATABASE, ARG_DIMENSIONS, ARG_EMBEDDINGS, CliError, ENV_HEALTH_DATABASE, embedder,
    write_json,
};

/// CLI arguments for the `health` subcommand.
#[derive(Debug, Clone, Parser, Deserialize, Serialize, OrthoConfig, Default)]
#[command(
    name = "health",
    long_about = "Build the search service from the configured inputs and \
                 print its readiness report. Load failures are reported in \
                 the JSON output rather than as a command failure.",
    about = "Report search readiness"
)]
#[ortho_config(prefix = "SAVOUR")]
pub(crate) struct HealthArgs {
    /// Restaurant SQLite database.
    #[arg(long = ARG_DATABASE, value_name = "path")]
    #[serde(default)]
    pub(crate) database: Option<Utf8PathBuf>,
    /// Precomputed embedding store.
    #[arg(long = ARG_EMBEDDINGS, value_name = "path")]
    #[serde(default)]
    pub(crate) embeddings: Option<Utf8PathBuf>,
    /// Embedding dimensionality.
    #[arg(long = ARG_DIMENSIONS, value_name = "count")]
    #[serde(default)]
    pub(crate) dimensions: Option<usize>,
}

impl HealthArgs {
    fn into_config(self) -> Result<SourceConfig, CliError> {
        let merged = self.load_and_merge().map_err(CliError::Configuration)?;
        SourceConfig::try_from(merged)
    }
}

impl TryFrom<HealthArgs> for SourceConfig {
    type Error = CliError;

    fn try_from(args: HealthArgs) -> Result<Self, Self::Error> {
        let database = args.database.ok_or(CliError::MissingArgument {
            field: ARG_DATABASE,
            env: ENV_HEALTH_DATABASE,
        })?;
        Ok(Self {
            database,
            embeddings: args.embeddings,
            dimensions: args.dimensions.unwrap_or(DEFAULT_DIMENSIONS),
        })
    }
}

pub(crate) fn run_health_with(args: HealthArgs, writer: &mut dyn Write) -> Result<(), CliError> {
    let config = args.into_config()?;
    let service = SearchService::start(config.service_config(), embedder(config.dimensions)?);
    write_json(writer, &service.health())
}
