// Topic labelling: TF-IDF over the documents of one cluster.

pub mod tfidf;
pub mod traits;

pub use tfidf::TfIdfExtractor;
pub use traits::{TopicExtractor, TopicOutcome, NO_TOPIC};
