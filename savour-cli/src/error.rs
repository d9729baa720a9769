//! Error types emitted by the Savour CLI.
//!
//! Keep this error type reasonably small, as many CLI helpers return
//! `Result<_, CliError>` and the workspace enables `clippy::result_large_err`.

use std::sync::Arc;

use camino::Utf8PathBuf;
use savour_core::QueryError;
use savour_data::PrecomputeError;
use savour_search::{ConfigurationError, SearchError};
use thiserror::Error;

/// Errors emitted by the Savour CLI.
#[derive(Debug, Error)]
pub enum CliError {
    /// Provided arguments failed Clap validation.
    #[error(transparent)]
    ArgumentParsing(#[from] clap::Error),
    /// Configuration layering failed (files, env, CLI).
    #[error("failed to load configuration: {0}")]
    Configuration(#[from] Arc<ortho_config::OrthoError>),
    /// A required option is missing after configuration merging.
    #[error("missing {field} (set --{field} or {env})")]
    MissingArgument {
        /// Flag name without the leading dashes.
        field: &'static str,
        /// Environment variable that can supply the value.
        env: &'static str,
    },
    /// A referenced input path does not exist on disk.
    #[error("{field} path {path:?} does not exist")]
    MissingSourceFile {
        /// Flag naming the path.
        field: &'static str,
        /// Offending path.
        path: Utf8PathBuf,
    },
    /// A referenced input path exists but is not a file.
    #[error("{field} path {path:?} exists but is not a file")]
    SourcePathNotFile {
        /// Flag naming the path.
        field: &'static str,
        /// Offending path.
        path: Utf8PathBuf,
    },
    /// A referenced input path could not be inspected due to an IO error.
    #[error("failed to inspect {field} path {path:?}: {source}")]
    InspectSourcePath {
        /// Flag naming the path.
        field: &'static str,
        /// Offending path.
        path: Utf8PathBuf,
        /// Underlying IO failure.
        #[source]
        source: std::io::Error,
    },
    /// Only one half of the origin coordinates was supplied.
    #[error("--lat and --lng must be given together")]
    IncompleteOrigin,
    /// The query text or filters were rejected.
    #[error("invalid request: {0}")]
    InvalidRequest(#[from] QueryError),
    /// The search service could not be built from the configured inputs.
    #[error("search service is not ready: {0}")]
    Service(#[from] ConfigurationError),
    /// A search or browse request failed.
    #[error(transparent)]
    Search(#[from] SearchError),
    /// `--dimensions` disagrees with the embedding model's output width.
    #[error("--dimensions {requested} does not match the model's {model} dimensions")]
    ModelDimensions {
        /// Requested vector width.
        requested: usize,
        /// Width produced by the model.
        model: usize,
    },
    /// Building the embedding store failed.
    #[error("precompute failed: {0}")]
    Precompute(#[from] PrecomputeError),
    /// Serialising the command output failed.
    #[error("failed to serialise output: {0}")]
    SerialiseOutput(#[source] serde_json::Error),
    /// Writing the command output failed.
    #[error("failed to write output: {0}")]
    WriteOutput(#[source] std::io::Error),
}
