// doclust: semantic document clustering with topic labels
//
// This is the library root. Each module corresponds to a stage or a
// boundary of the clustering pipeline.

pub mod cluster;
pub mod config;
pub mod documents;
pub mod embeddings;
pub mod error;
pub mod extract;
pub mod output;
pub mod pipeline;
pub mod topics;

#[cfg(feature = "web")]
pub mod web;
