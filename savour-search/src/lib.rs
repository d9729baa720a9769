//! Search orchestration for the Savour engine.
//!
//! [`SearchEngine`] runs the request pipeline over an immutable snapshot:
//! geographic and price filtering, two-stage relevance, smart scoring,
//! review excerpts and stable ranking. [`SearchService`] owns the current
//! engine, reports [`Health`] and rebuilds the engine from disk on demand.

#![forbid(unsafe_code)]

mod engine;
mod error;
mod service;

pub use engine::{EmbeddingSource, SearchEngine};
pub use error::{ConfigurationError, SearchError};
pub use service::{Health, SearchService, ServiceConfig};
