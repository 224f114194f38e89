// Embedder trait: swap-ready abstraction over the sentence model.
//
// The pipeline only needs "texts in, one vector per text out, same order".
// The ONNX model implements it in production; tests plug in deterministic
// fakes.

use async_trait::async_trait;

use crate::error::ClusterError;

/// A dense sentence vector.
pub type Embedding = Vec<f32>;

#[async_trait]
pub trait Embedder: Send + Sync {
    /// Embed every text, returning vectors in input order.
    ///
    /// Fails with `ModelUnavailable` when the model cannot be loaded and
    /// `Embedding` when inference itself fails.
    async fn embed(&self, texts: &[String]) -> Result<Vec<Embedding>, ClusterError>;
}
