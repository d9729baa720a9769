//! Sentence embeddings from all-MiniLM-L6-v2 through `fastembed`.
//!
//! The ONNX session is created on the first [`ModelSession::encode`] call,
//! so a missing or undownloadable model surfaces as an [`EmbedError`] on
//! the readiness probe rather than at construction. Wrap the session in
//! [`SingleFlight`](super::SingleFlight) to share it.

use std::path::PathBuf;

use fastembed::{EmbeddingModel, InitOptions, TextEmbedding};
use log::info;

use super::{EmbedError, Embedding, ModelSession};

/// Width of all-MiniLM-L6-v2 sentence vectors.
pub const MINILM_DIMENSIONS: usize = 384;

/// A lazily loaded all-MiniLM-L6-v2 model.
///
/// # Examples
/// ```no_run
/// use savour_core::{Embedder, FastEmbedSession, MINILM_DIMENSIONS, SingleFlight};
///
/// let embedder = SingleFlight::new(FastEmbedSession::new());
/// let vector = embedder.embed("cheap tacos").expect("embed");
/// assert_eq!(vector.dimensions(), MINILM_DIMENSIONS);
/// ```
#[derive(Default)]
pub struct FastEmbedSession {
    cache_dir: Option<PathBuf>,
    model: Option<TextEmbedding>,
}

impl FastEmbedSession {
    /// A session using fastembed's default model cache.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            cache_dir: None,
            model: None,
        }
    }

    /// Download and cache model files under `dir`.
    #[must_use]
    pub fn with_cache_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.cache_dir = Some(dir.into());
        self
    }

    /// Report whether the model has been loaded.
    #[must_use]
    pub const fn is_loaded(&self) -> bool {
        self.model.is_some()
    }

    fn load(&self) -> Result<TextEmbedding, EmbedError> {
        let mut options =
            InitOptions::new(EmbeddingModel::AllMiniLML6V2).with_show_download_progress(false);
        if let Some(dir) = &self.cache_dir {
            options = options.with_cache_dir(dir.clone());
        }
        let model = TextEmbedding::try_new(options).map_err(|err| EmbedError::Model {
            message: format!("failed to load all-MiniLM-L6-v2: {err}"),
        })?;
        info!("loaded all-MiniLM-L6-v2 embedding model");
        Ok(model)
    }
}

impl ModelSession for FastEmbedSession {
    fn encode(&mut self, text: &str) -> Result<Embedding, EmbedError> {
        let model = match self.model.take() {
            Some(model) => model,
            None => self.load()?,
        };
        let outcome = model.embed(vec![text], None);
        self.model = Some(model);
        let mut vectors = outcome.map_err(|err| EmbedError::Model {
            message: err.to_string(),
        })?;
        vectors.pop().map(Embedding::new).ok_or_else(|| EmbedError::Model {
            message: "model returned no vector".to_owned(),
        })
    }
}

impl std::fmt::Debug for FastEmbedSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FastEmbedSession")
            .field("cache_dir", &self.cache_dir)
            .field("loaded", &self.is_loaded())
            .finish()
    }
}
