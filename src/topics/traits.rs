// Topic extractor trait and its outcome type.
//
// Extraction never fails a clustering run. Anything that goes wrong while
// labelling one cluster degrades that cluster to `TopicOutcome::NoTopic`,
// and the type makes that visible to callers instead of hiding it behind
// a swallowed error.

use std::fmt;

/// Label shown for clusters without a usable topic.
pub const NO_TOPIC: &str = "No topic";

/// Result of labelling one group of documents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TopicOutcome {
    /// Top terms, highest weight first. Never empty.
    Topic(Vec<String>),
    NoTopic,
}

impl TopicOutcome {
    /// Wrap a term list, falling back to `NoTopic` when it is empty.
    pub fn from_terms(terms: Vec<String>) -> Self {
        if terms.is_empty() {
            Self::NoTopic
        } else {
            Self::Topic(terms)
        }
    }

    pub fn terms(&self) -> &[String] {
        match self {
            Self::Topic(terms) => terms,
            Self::NoTopic => &[],
        }
    }

    pub fn is_topic(&self) -> bool {
        matches!(self, Self::Topic(_))
    }
}

impl fmt::Display for TopicOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Topic(terms) => f.write_str(&terms.join(", ")),
            Self::NoTopic => f.write_str(NO_TOPIC),
        }
    }
}

/// Trait for labelling a group of raw documents with a short topic.
pub trait TopicExtractor: Send + Sync {
    fn extract(&self, documents: &[&str]) -> TopicOutcome;
}
