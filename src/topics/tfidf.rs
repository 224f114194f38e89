// TF-IDF topic labels for a single cluster.
//
// Each document of the cluster is one TF-IDF document, and IDF is computed
// over the cluster only, not the whole corpus. A term's score is its
// L2-normalized TF-IDF weight summed over the cluster's documents; the
// label is the top three terms.
//
// Weighting follows the usual vectorizer defaults: lowercase, tokens of two
// or more word characters, English stop words removed, raw counts, smoothed
// IDF `ln((1 + n) / (1 + df)) + 1`, unit-length document vectors.
//
// Input is the raw document text, not the normalized text used for
// embedding, so a label can contain tokens normalization would have split
// (e.g. "e_mail").

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::LazyLock;

use regex_lite::Regex;
use stop_words::{get, LANGUAGE};
use tracing::debug;

use super::traits::{TopicExtractor, TopicOutcome};

/// Ranking resolution: weights closer than 1e-9 tie.
const RANK_SCALE: f64 = 1e9;

static TOKEN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\b\w\w+\b").expect("valid regex"));

static STOP_WORDS: LazyLock<HashSet<String>> = LazyLock::new(|| {
    get(LANGUAGE::English)
        .into_iter()
        .map(|w| w.to_string())
        .collect()
});

/// TF-IDF topic extractor used for every cluster.
pub struct TfIdfExtractor {
    /// How many terms make up the label
    pub top_n_terms: usize,
    /// Vocabulary cap, most frequent terms kept
    pub max_features: usize,
}

impl Default for TfIdfExtractor {
    fn default() -> Self {
        Self {
            top_n_terms: 3,
            max_features: 3000,
        }
    }
}

impl TopicExtractor for TfIdfExtractor {
    fn extract(&self, documents: &[&str]) -> TopicOutcome {
        if documents.is_empty() {
            return TopicOutcome::NoTopic;
        }

        let ranked = self.ranked_terms(documents);

        if let Some(bad) = ranked.iter().find(|(_, w)| !w.is_finite()) {
            debug!(term = %bad.0, weight = bad.1, "Non-finite TF-IDF weight, no topic");
            return TopicOutcome::NoTopic;
        }

        let terms: Vec<String> = ranked
            .into_iter()
            .take(self.top_n_terms)
            .map(|(term, _)| term)
            .collect();

        TopicOutcome::from_terms(terms)
    }
}

impl TfIdfExtractor {
    /// All vocabulary terms with their summed weights, highest first.
    /// Equal weights keep first-encountered order.
    pub fn ranked_terms(&self, documents: &[&str]) -> Vec<(String, f64)> {
        let tokenized: Vec<Vec<String>> = documents.iter().map(|d| tokenize(d)).collect();

        // Vocabulary in order of first appearance
        let mut vocab: Vec<String> = Vec::new();
        let mut index: HashMap<String, usize> = HashMap::new();
        let mut total_counts: Vec<usize> = Vec::new();
        let mut doc_freq: Vec<usize> = Vec::new();

        for tokens in &tokenized {
            let mut seen_here: HashSet<usize> = HashSet::new();
            for token in tokens {
                let id = match index.get(token) {
                    Some(&id) => id,
                    None => {
                        let id = vocab.len();
                        vocab.push(token.clone());
                        index.insert(token.clone(), id);
                        total_counts.push(0);
                        doc_freq.push(0);
                        id
                    }
                };
                total_counts[id] += 1;
                if seen_here.insert(id) {
                    doc_freq[id] += 1;
                }
            }
        }

        if vocab.is_empty() {
            return Vec::new();
        }

        let kept = self.limit_vocabulary(&total_counts);

        let n = documents.len() as f64;
        let idf: BTreeMap<usize, f64> = kept
            .iter()
            .map(|&id| (id, ((1.0 + n) / (1.0 + doc_freq[id] as f64)).ln() + 1.0))
            .collect();

        // BTreeMaps keep every float sum in term-id order, so equal count
        // patterns in different documents produce bit-identical weights.
        let mut sums: BTreeMap<usize, f64> = BTreeMap::new();
        for tokens in &tokenized {
            let mut tf: BTreeMap<usize, f64> = BTreeMap::new();
            for token in tokens {
                let id = index[token];
                if idf.contains_key(&id) {
                    *tf.entry(id).or_insert(0.0) += 1.0;
                }
            }

            let weights: Vec<(usize, f64)> =
                tf.into_iter().map(|(id, count)| (id, count * idf[&id])).collect();
            let norm = weights.iter().map(|(_, w)| w * w).sum::<f64>().sqrt();
            if norm == 0.0 {
                continue;
            }
            for (id, w) in weights {
                *sums.entry(id).or_insert(0.0) += w / norm;
            }
        }

        let mut ranked: Vec<(usize, f64)> = kept
            .iter()
            .map(|&id| (id, sums.get(&id).copied().unwrap_or(0.0)))
            .collect();
        ranked.sort_by(|a, b| {
            rank_key(b.1)
                .total_cmp(&rank_key(a.1))
                .then(a.0.cmp(&b.0))
        });

        ranked
            .into_iter()
            .map(|(id, weight)| (vocab[id].clone(), weight))
            .collect()
    }

    /// Term ids surviving the vocabulary cap, in first-seen order.
    fn limit_vocabulary(&self, total_counts: &[usize]) -> Vec<usize> {
        let mut ids: Vec<usize> = (0..total_counts.len()).collect();
        if ids.len() > self.max_features {
            ids.sort_by(|&a, &b| total_counts[b].cmp(&total_counts[a]).then(a.cmp(&b)));
            ids.truncate(self.max_features);
            ids.sort_unstable();
        }
        ids
    }
}

/// Weight rounded to a fixed grid for ranking. Weights that differ only
/// by floating-point rounding compare equal and fall back to first-seen
/// order.
fn rank_key(weight: f64) -> f64 {
    (weight * RANK_SCALE).round()
}

/// Lowercased word tokens with stop words removed.
fn tokenize(text: &str) -> Vec<String> {
    let lower = text.to_lowercase();
    TOKEN
        .find_iter(&lower)
        .map(|m| m.as_str())
        .filter(|t| !STOP_WORDS.contains(*t))
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_basic() {
        let extractor = TfIdfExtractor::default();
        let docs = ["rust compiler borrow", "rust compiler", "rust"];
        let outcome = extractor.extract(&docs);
        assert_eq!(outcome.to_string(), "rust, compiler, borrow");
    }

    #[test]
    fn test_ties_keep_first_encountered_order() {
        let extractor = TfIdfExtractor::default();
        let docs = ["apple banana", "banana apple"];
        let outcome = extractor.extract(&docs);
        assert_eq!(outcome.terms(), &["apple".to_string(), "banana".to_string()]);
    }

    #[test]
    fn test_ties_across_documents_are_stable() {
        let extractor = TfIdfExtractor {
            top_n_terms: 6,
            max_features: 3000,
        };
        let docs = ["xa xb xb xb xc xc xc xc", "ya yb yb yb yc yc yc yc"];
        for _ in 0..40 {
            assert_eq!(
                extractor.extract(&docs).to_string(),
                "xc, yc, xb, yb, xa, ya"
            );
        }
    }

    #[test]
    fn test_rank_key_absorbs_rounding_noise() {
        let a = 0.1 + 0.2;
        let b = 0.3;
        assert_ne!(a, b);
        assert_eq!(rank_key(a), rank_key(b));
        assert!(rank_key(0.5) > rank_key(0.4999));
    }

    #[test]
    fn test_empty_group_has_no_topic() {
        let extractor = TfIdfExtractor::default();
        assert_eq!(extractor.extract(&[]), TopicOutcome::NoTopic);
    }

    #[test]
    fn test_only_stop_words_has_no_topic() {
        let extractor = TfIdfExtractor::default();
        let docs = ["The and of", "it is a"];
        assert_eq!(extractor.extract(&docs), TopicOutcome::NoTopic);
    }

    #[test]
    fn test_single_character_tokens_ignored() {
        let extractor = TfIdfExtractor::default();
        let docs = ["x y z"];
        assert_eq!(extractor.extract(&docs), TopicOutcome::NoTopic);
    }

    #[test]
    fn test_vocabulary_cap_keeps_most_frequent() {
        let extractor = TfIdfExtractor {
            top_n_terms: 3,
            max_features: 1,
        };
        let docs = ["alpha beta beta"];
        assert_eq!(extractor.extract(&docs).terms(), &["beta".to_string()]);
    }

    #[test]
    fn test_tokenize_lowercases_raw_text() {
        let tokens = tokenize("Kubernetes DEPLOYMENTS rolled-out");
        assert!(tokens.contains(&"kubernetes".to_string()));
        assert!(tokens.contains(&"deployments".to_string()));
        assert!(tokens.contains(&"rolled".to_string()));
    }

    #[test]
    fn test_fewer_terms_than_requested() {
        let extractor = TfIdfExtractor::default();
        let outcome = extractor.extract(&["tokio"]);
        assert_eq!(outcome.to_string(), "tokio");
    }
}
