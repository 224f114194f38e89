// Text normalization applied before embedding.
//
// Lowercase, drop everything that isn't an ASCII letter, digit or
// whitespace, collapse whitespace. Topic extraction deliberately does NOT
// use this: it weights the raw document text.

use std::sync::LazyLock;

use regex_lite::Regex;

static NON_ALNUM: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^a-z0-9\s]").expect("valid regex"));
static WHITESPACE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").expect("valid regex"));

/// Normalize a document for embedding. Total: never fails, may return "".
pub fn normalize(text: &str) -> String {
    let lower = text.to_lowercase();
    let stripped = NON_ALNUM.replace_all(&lower, " ");
    WHITESPACE.replace_all(&stripped, " ").trim().to_string()
}
