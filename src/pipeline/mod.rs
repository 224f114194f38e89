// Clustering pipeline: documents in, k labelled clusters out.
//
//   Validating -> Normalizing -> Embedding -> Clustering
//     -> TopicExtraction -> Assembling -> Done
//
// Only Validating, Embedding and Clustering can fail, and a failure
// returns no partial result. Normalizing, topic extraction and assembly
// degrade single documents or clusters instead of failing the run.

pub mod assemble;

use std::collections::BTreeMap;

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::cluster::{KMeans, DEFAULT_SEED};
use crate::documents::{normalize, Document, NormalizedDocument};
use crate::embeddings::Embedder;
use crate::error::{ClusterError, PipelineError, Stage};
use crate::topics::TopicExtractor;

pub use assemble::{assemble, Cluster, ClusterAssignment};

/// Smallest cluster count a request may ask for.
pub const MIN_CLUSTERS: usize = 2;

/// Largest cluster count a request may ask for.
pub const MAX_CLUSTERS: usize = 20;

/// Knobs for a pipeline run.
#[derive(Debug, Clone)]
pub struct PipelineOptions {
    pub seed: u64,
    pub min_clusters: usize,
    pub max_clusters: usize,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            seed: DEFAULT_SEED,
            min_clusters: MIN_CLUSTERS,
            max_clusters: MAX_CLUSTERS,
        }
    }
}

/// The result of a successful run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClusterReport {
    /// Exactly k entries, keyed 0..k
    pub clusters: BTreeMap<usize, Cluster>,
    /// Original indices of inputs that were blank or had no usable content
    pub excluded: Vec<usize>,
    #[serde(skip)]
    pub assignments: Vec<ClusterAssignment>,
}

impl ClusterReport {
    /// Number of documents placed in clusters.
    pub fn document_count(&self) -> usize {
        self.clusters.values().map(|c| c.docs.len()).sum()
    }
}

fn advance(stage: Stage) {
    debug!(stage = %stage, "Pipeline stage");
}

fn fail(stage: Stage) -> impl FnOnce(ClusterError) -> PipelineError {
    move |source| {
        warn!(stage = %stage, error = %source, "Pipeline failed");
        PipelineError::new(stage, source)
    }
}

/// Check the request and return the documents that will be clustered,
/// plus the original indices that were dropped.
pub fn validate<S: AsRef<str>>(
    inputs: &[S],
    k: usize,
    options: &PipelineOptions,
) -> Result<(Vec<Document>, Vec<usize>), ClusterError> {
    if inputs.is_empty() {
        return Err(ClusterError::NoDocuments);
    }

    let (candidates, mut excluded) = Document::from_inputs(inputs);

    let mut documents = Vec::with_capacity(candidates.len());
    for doc in candidates {
        if normalize(&doc.raw_text).is_empty() {
            excluded.push(doc.original_index);
        } else {
            documents.push(doc);
        }
    }
    excluded.sort_unstable();

    if documents.is_empty() {
        return Err(ClusterError::NoUsableDocuments);
    }

    if k < options.min_clusters || k > options.max_clusters {
        return Err(ClusterError::ClusterCountOutOfRange {
            k,
            min: options.min_clusters,
            max: options.max_clusters,
        });
    }

    if k > documents.len() {
        return Err(ClusterError::TooManyClusters {
            k,
            available: documents.len(),
        });
    }

    if !excluded.is_empty() {
        warn!(
            excluded = excluded.len(),
            "Skipping documents without usable content"
        );
    }

    Ok((documents, excluded))
}

/// Run the whole pipeline once.
pub async fn run<S: AsRef<str>>(
    inputs: &[S],
    k: usize,
    embedder: &dyn Embedder,
    extractor: &dyn TopicExtractor,
    options: &PipelineOptions,
) -> Result<ClusterReport, PipelineError> {
    advance(Stage::Validating);
    let (documents, excluded) = validate(inputs, k, options).map_err(fail(Stage::Validating))?;

    advance(Stage::Normalizing);
    let normalized: Vec<NormalizedDocument> =
        documents.iter().map(NormalizedDocument::from).collect();
    let texts: Vec<String> = normalized.iter().map(|d| d.text.clone()).collect();

    advance(Stage::Embedding);
    info!(documents = texts.len(), "Encoding documents");
    let vectors = embedder
        .embed(&texts)
        .await
        .map_err(fail(Stage::Embedding))?;
    if vectors.len() != texts.len() {
        return Err(fail(Stage::Embedding)(ClusterError::Embedding(format!(
            "expected {} vectors, got {}",
            texts.len(),
            vectors.len()
        ))));
    }

    advance(Stage::Clustering);
    info!(k, "Clustering documents");
    let fit = KMeans::new(k)
        .with_seed(options.seed)
        .fit(&vectors)
        .map_err(fail(Stage::Clustering))?;
    debug!(
        inertia = fit.inertia,
        iterations = fit.iterations,
        "k-means converged"
    );

    let assignments: Vec<ClusterAssignment> = normalized
        .iter()
        .zip(&fit.labels)
        .map(|(doc, &cluster_id)| ClusterAssignment {
            original_index: doc.original_index,
            cluster_id,
        })
        .collect();

    advance(Stage::TopicExtraction);
    let groups = assemble::group_members(&documents, &assignments, k);
    let topics = assemble::extract_topics(&groups, extractor);

    advance(Stage::Assembling);
    let clusters = assemble::build_clusters(groups, topics);

    for cluster in clusters.values() {
        info!(
            cluster = cluster.id,
            documents = cluster.docs.len(),
            topic = %cluster.topic,
            "Cluster assembled"
        );
    }

    advance(Stage::Done);
    Ok(ClusterReport {
        clusters,
        excluded,
        assignments,
    })
}
