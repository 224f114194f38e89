// Sentence embeddings: the Embedder trait, the local ONNX model, and the
// load-once handle shared across requests.

pub mod download;
pub mod onnx;
pub mod shared;
pub mod traits;

pub use onnx::{SentenceEmbedder, EMBEDDING_DIM};
pub use shared::{LazyEmbedder, SharedEmbedder};
pub use traits::{Embedder, Embedding};
