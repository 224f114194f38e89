// Documents as they flow through a clustering run.
//
// A Document remembers where it came from in the caller's list, so the
// result can be mapped back without keeping parallel index arrays around.

pub mod normalize;

use serde::Serialize;

pub use normalize::normalize;

/// One accepted input string, trimmed, with its position in the caller's list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Document {
    pub raw_text: String,
    pub original_index: usize,
}

impl Document {
    /// Build documents from raw inputs, skipping blank ones.
    ///
    /// Returns the surviving documents and the original indices that were
    /// skipped.
    pub fn from_inputs<S: AsRef<str>>(inputs: &[S]) -> (Vec<Document>, Vec<usize>) {
        let mut documents = Vec::with_capacity(inputs.len());
        let mut skipped = Vec::new();

        for (original_index, input) in inputs.iter().enumerate() {
            let trimmed = input.as_ref().trim();
            if trimmed.is_empty() {
                skipped.push(original_index);
            } else {
                documents.push(Document {
                    raw_text: trimmed.to_string(),
                    original_index,
                });
            }
        }

        (documents, skipped)
    }
}

/// The embedding-side view of a document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedDocument {
    pub text: String,
    pub original_index: usize,
}

impl From<&Document> for NormalizedDocument {
    fn from(doc: &Document) -> Self {
        Self {
            text: normalize(&doc.raw_text),
            original_index: doc.original_index,
        }
    }
}
