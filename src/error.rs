// Pipeline error taxonomy.
//
// Validation errors are the caller's fault and map to HTTP 400. Everything
// else (model, embedding, numeric) is an infrastructure failure and maps
// to 500. Per-file extraction errors and per-cluster topic failures never
// show up here: they are reported as data.

use std::fmt;

use thiserror::Error;

/// Why a clustering run failed.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ClusterError {
    #[error("No documents provided")]
    NoDocuments,

    #[error("No valid documents found")]
    NoUsableDocuments,

    #[error("Number of clusters must be between {min} and {max}")]
    ClusterCountOutOfRange { k: usize, min: usize, max: usize },

    #[error("Number of clusters ({k}) cannot exceed number of documents ({available})")]
    TooManyClusters { k: usize, available: usize },

    #[error("Cannot partition {n} vectors into {k} clusters")]
    InvalidClusterCount { k: usize, n: usize },

    #[error("Embedding model unavailable: {0}")]
    ModelUnavailable(String),

    #[error("Embedding failed: {0}")]
    Embedding(String),

    #[error("Numeric failure during clustering: {0}")]
    Numeric(String),
}

impl ClusterError {
    /// True for errors caused by the request itself rather than the service.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::NoDocuments
                | Self::NoUsableDocuments
                | Self::ClusterCountOutOfRange { .. }
                | Self::TooManyClusters { .. }
        )
    }
}

/// Pipeline state. `Failed` is only reachable from the stages that can fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Validating,
    Normalizing,
    Embedding,
    Clustering,
    TopicExtraction,
    Assembling,
    Done,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Validating => "validating",
            Self::Normalizing => "normalizing",
            Self::Embedding => "embedding",
            Self::Clustering => "clustering",
            Self::TopicExtraction => "topic extraction",
            Self::Assembling => "assembling",
            Self::Done => "done",
        };
        f.write_str(name)
    }
}

/// A failed run: the stage it stopped at and the cause.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{source}")]
pub struct PipelineError {
    pub stage: Stage,
    #[source]
    pub source: ClusterError,
}

impl PipelineError {
    pub fn new(stage: Stage, source: ClusterError) -> Self {
        Self { stage, source }
    }

    pub fn is_validation(&self) -> bool {
        self.source.is_validation()
    }
}
