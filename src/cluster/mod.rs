// Partitional clustering of embedding vectors.

pub mod kmeans;

pub use kmeans::{cluster, KMeans, KMeansFit, DEFAULT_SEED};
