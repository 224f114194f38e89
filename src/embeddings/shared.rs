// Process-wide, load-once embedding model.
//
// The model is loaded on the first embedding request and then shared
// read-only by every later request. Concurrent first requests wait on the
// same initialization. A failed load leaves nothing cached, so the next
// request tries again; a loaded model is never reloaded.

use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::OnceCell;
use tracing::{info, warn};

use super::onnx::SentenceEmbedder;
use super::traits::{Embedder, Embedding};
use crate::error::ClusterError;

type Loader<E> = dyn Fn() -> anyhow::Result<E> + Send + Sync;

/// Embedder that loads its backend lazily, exactly once.
pub struct LazyEmbedder<E> {
    loader: Arc<Loader<E>>,
    model: OnceCell<Arc<E>>,
}

/// The ONNX sentence model behind a load-once handle.
pub type SharedEmbedder = LazyEmbedder<SentenceEmbedder>;

impl SharedEmbedder {
    /// Handle for the model files in `model_dir`. Nothing is read until
    /// the first request.
    pub fn from_model_dir(model_dir: PathBuf) -> Self {
        LazyEmbedder::new(move || SentenceEmbedder::load(&model_dir))
    }
}

impl<E: Embedder + 'static> LazyEmbedder<E> {
    pub fn new<F>(loader: F) -> Self
    where
        F: Fn() -> anyhow::Result<E> + Send + Sync + 'static,
    {
        Self {
            loader: Arc::new(loader),
            model: OnceCell::new(),
        }
    }

    /// The loaded model, loading it first if this is the first call.
    pub async fn get(&self) -> Result<Arc<E>, ClusterError> {
        let model = self
            .model
            .get_or_try_init(|| async {
                let loader = Arc::clone(&self.loader);
                let loaded = tokio::task::spawn_blocking(move || loader())
                    .await
                    .map_err(|e| {
                        ClusterError::ModelUnavailable(format!("model loader panicked: {e}"))
                    })?
                    .map_err(|e| {
                        warn!(error = %e, "Embedding model failed to load");
                        ClusterError::ModelUnavailable(format!("{e:#}"))
                    })?;
                info!("Embedding model loaded");
                Ok::<_, ClusterError>(Arc::new(loaded))
            })
            .await?;
        Ok(Arc::clone(model))
    }

    pub fn is_loaded(&self) -> bool {
        self.model.initialized()
    }
}

#[async_trait]
impl<E: Embedder + 'static> Embedder for LazyEmbedder<E> {
    async fn embed(&self, texts: &[String]) -> Result<Vec<Embedding>, ClusterError> {
        let model = self.get().await?;
        model.embed(texts).await
    }
}
