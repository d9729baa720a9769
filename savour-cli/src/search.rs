//! `search` and `browse` subcommands.

use std::io::Write;

use camino::Utf8PathBuf;
use clap::{Parser, ValueEnum};
use log::info;
use ortho_config::{OrthoConfig, SubcmdConfigMerge};
use savour_core::{DEFAULT_DIMENSIONS, RankMode, SearchFilters, SearchQuery};
use savour_search::{SearchService, ServiceConfig};
use serde::{Deserialize, Serialize};

use crate::fs::require_existing;
use crate::{
    ARG_DATABASE, ARG_DIMENSIONS, ARG_EMBEDDINGS, ARG_LAT, ARG_LNG, ARG_MAX_PRICE, ARG_QUERY,
    ARG_RADIUS, ARG_RANK_BY, CliError, ENV_BROWSE_DATABASE, ENV_SEARCH_DATABASE,
    ENV_SEARCH_QUERY, embedder, write_json,
};

/// Ordering key accepted on the command line.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub(crate) enum RankBy {
    /// Semantic relevance first.
    #[default]
    Relevance,
    /// Smart score first.
    SmartScore,
}

impl From<RankBy> for RankMode {
    fn from(value: RankBy) -> Self {
        match value {
            RankBy::Relevance => Self::Relevance,
            RankBy::SmartScore => Self::SmartScore,
        }
    }
}

/// CLI arguments for the `search` subcommand.
#[derive(Debug, Clone, Parser, Deserialize, Serialize, OrthoConfig, Default)]
#[command(
    name = "search",
    long_about = "Rank restaurants against a free-text query. Restaurants \
                 are filtered by distance and price, scored for semantic \
                 relevance and quality, and the best ten are printed as JSON.",
    about = "Rank restaurants against a free-text query"
)]
#[ortho_config(prefix = "SAVOUR")]
pub(crate) struct SearchArgs {
    /// Free-text description of what to eat.
    #[arg(value_name = "query")]
    #[serde(default)]
    pub(crate) query: Option<String>,
    /// Restaurant SQLite database.
    #[arg(long = ARG_DATABASE, value_name = "path")]
    #[serde(default)]
    pub(crate) database: Option<Utf8PathBuf>,
    /// Precomputed embedding store; restaurants are embedded on demand
    /// without one.
    #[arg(long = ARG_EMBEDDINGS, value_name = "path")]
    #[serde(default)]
    pub(crate) embeddings: Option<Utf8PathBuf>,
    /// Caller latitude in degrees.
    #[arg(long = ARG_LAT, value_name = "degrees", allow_hyphen_values = true)]
    #[serde(default)]
    pub(crate) lat: Option<f64>,
    /// Caller longitude in degrees.
    #[arg(long = ARG_LNG, value_name = "degrees", allow_hyphen_values = true)]
    #[serde(default)]
    pub(crate) lng: Option<f64>,
    /// Search radius in miles; 100 or more disables distance filtering.
    #[arg(long = ARG_RADIUS, value_name = "miles")]
    #[serde(default)]
    pub(crate) radius: Option<f64>,
    /// Highest price tier (1-4); 4 disables price filtering.
    #[arg(long = ARG_MAX_PRICE, value_name = "tier")]
    #[serde(default)]
    pub(crate) max_price: Option<u8>,
    /// Primary ordering key.
    #[arg(long = ARG_RANK_BY, value_enum)]
    #[serde(default)]
    pub(crate) rank_by: Option<RankBy>,
    /// Embedding dimensionality; must match the store when one is given.
    #[arg(long = ARG_DIMENSIONS, value_name = "count")]
    #[serde(default)]
    pub(crate) dimensions: Option<usize>,
}

impl SearchArgs {
    pub(crate) fn into_config(self) -> Result<SearchConfig, CliError> {
        let merged = self.load_and_merge().map_err(CliError::Configuration)?;
        SearchConfig::try_from(merged)
    }
}

/// CLI arguments for the `browse` subcommand.
#[derive(Debug, Clone, Parser, Deserialize, Serialize, OrthoConfig, Default)]
#[command(
    name = "browse",
    long_about = "List the highest smart-scoring restaurants that pass the \
                 distance and price filters. No query text is needed.",
    about = "List the best restaurants without a query"
)]
#[ortho_config(prefix = "SAVOUR")]
pub(crate) struct BrowseArgs {
    /// Restaurant SQLite database.
    #[arg(long = ARG_DATABASE, value_name = "path")]
    #[serde(default)]
    pub(crate) database: Option<Utf8PathBuf>,
    /// Caller latitude in degrees.
    #[arg(long = ARG_LAT, value_name = "degrees", allow_hyphen_values = true)]
    #[serde(default)]
    pub(crate) lat: Option<f64>,
    /// Caller longitude in degrees.
    #[arg(long = ARG_LNG, value_name = "degrees", allow_hyphen_values = true)]
    #[serde(default)]
    pub(crate) lng: Option<f64>,
    /// Search radius in miles; 100 or more disables distance filtering.
    #[arg(long = ARG_RADIUS, value_name = "miles")]
    #[serde(default)]
    pub(crate) radius: Option<f64>,
    /// Highest price tier (1-4); 4 disables price filtering.
    #[arg(long = ARG_MAX_PRICE, value_name = "tier")]
    #[serde(default)]
    pub(crate) max_price: Option<u8>,
}

impl BrowseArgs {
    pub(crate) fn into_config(self) -> Result<BrowseConfig, CliError> {
        let merged = self.load_and_merge().map_err(CliError::Configuration)?;
        BrowseConfig::try_from(merged)
    }
}

/// Data inputs shared by the commands that build a search service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct SourceConfig {
    pub(crate) database: Utf8PathBuf,
    pub(crate) embeddings: Option<Utf8PathBuf>,
    pub(crate) dimensions: usize,
}

impl SourceConfig {
    pub(crate) fn validate_sources(&self) -> Result<(), CliError> {
        require_existing(&self.database, ARG_DATABASE)?;
        if let Some(path) = &self.embeddings {
            require_existing(path, ARG_EMBEDDINGS)?;
        }
        Ok(())
    }

    pub(crate) fn service_config(&self) -> ServiceConfig {
        let config = ServiceConfig::new(self.database.clone());
        if let Some(path) = &self.embeddings {
            return config.with_embeddings(path.clone());
        }
        config
    }

    /// Build a service and fail unless it becomes ready.
    fn open_service(&self) -> Result<SearchService, CliError> {
        let service = SearchService::new(self.service_config(), embedder(self.dimensions)?);
        service.rebuild()?;
        Ok(service)
    }
}

/// Resolved `search` command configuration.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct SearchConfig {
    pub(crate) query: SearchQuery,
    pub(crate) source: SourceConfig,
}

impl TryFrom<SearchArgs> for SearchConfig {
    type Error = CliError;

    fn try_from(args: SearchArgs) -> Result<Self, Self::Error> {
        let text = args.query.ok_or(CliError::MissingArgument {
            field: ARG_QUERY,
            env: ENV_SEARCH_QUERY,
        })?;
        let database = args.database.ok_or(CliError::MissingArgument {
            field: ARG_DATABASE,
            env: ENV_SEARCH_DATABASE,
        })?;
        let filters = resolve_filters(args.lat, args.lng, args.radius, args.max_price)?;
        let query = SearchQuery::new(text)?
            .with_filters(filters)
            .with_rank_mode(args.rank_by.unwrap_or_default().into());
        Ok(Self {
            query,
            source: SourceConfig {
                database,
                embeddings: args.embeddings,
                dimensions: args.dimensions.unwrap_or(DEFAULT_DIMENSIONS),
            },
        })
    }
}

/// Resolved `browse` command configuration.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct BrowseConfig {
    pub(crate) filters: SearchFilters,
    pub(crate) source: SourceConfig,
}

impl TryFrom<BrowseArgs> for BrowseConfig {
    type Error = CliError;

    fn try_from(args: BrowseArgs) -> Result<Self, Self::Error> {
        let database = args.database.ok_or(CliError::MissingArgument {
            field: ARG_DATABASE,
            env: ENV_BROWSE_DATABASE,
        })?;
        Ok(Self {
            filters: resolve_filters(args.lat, args.lng, args.radius, args.max_price)?,
            source: SourceConfig {
                database,
                embeddings: None,
                dimensions: DEFAULT_DIMENSIONS,
            },
        })
    }
}

fn resolve_filters(
    lat: Option<f64>,
    lng: Option<f64>,
    radius: Option<f64>,
    max_price: Option<u8>,
) -> Result<SearchFilters, CliError> {
    let located = match (lat, lng) {
        (Some(latitude), Some(longitude)) => {
            SearchFilters::default().with_origin(latitude, longitude)?
        }
        (None, None) => SearchFilters::default(),
        _ => return Err(CliError::IncompleteOrigin),
    };
    let bounded = radius.map_or(Ok(located), |miles| located.with_radius(miles))?;
    max_price
        .map_or(Ok(bounded), |tier| bounded.with_max_price(tier))
        .map_err(CliError::from)
}

pub(crate) fn run_search_with(args: SearchArgs, writer: &mut dyn Write) -> Result<(), CliError> {
    let config = args.into_config()?;
    config.source.validate_sources()?;
    let service = config.source.open_service()?;
    let results = service.search(&config.query)?;
    info!(
        "search for {:?} returned {} restaurants",
        config.query.text(),
        results.len()
    );
    write_json(writer, &results)
}

pub(crate) fn run_browse_with(args: BrowseArgs, writer: &mut dyn Write) -> Result<(), CliError> {
    let config = args.into_config()?;
    config.source.validate_sources()?;
    let service = config.source.open_service()?;
    let results = service.browse(&config.filters)?;
    info!("browse returned {} restaurants", results.len());
    write_json(writer, &results)
}

#[cfg(test)]
pub(crate) fn search_config_from_layers_for_test(
    layers: Vec<ortho_config::MergeLayer<'static>>,
) -> Result<SearchConfig, CliError> {
    let merged = SearchArgs::merge_from_layers(layers).map_err(CliError::from)?;
    SearchConfig::try_from(merged)
}
