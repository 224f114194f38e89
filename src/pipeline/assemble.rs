// Cluster assembly: membership back to documents, plus topic labels.
//
// Every cluster id in 0..k is present in the output, empty or not, and
// documents inside a cluster keep the caller's input order.

use std::collections::{BTreeMap, HashMap};

use serde::Serialize;
use tracing::{debug, warn};

use crate::documents::Document;
use crate::topics::{TopicExtractor, TopicOutcome};

/// Which cluster a surviving document landed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ClusterAssignment {
    pub original_index: usize,
    pub cluster_id: usize,
}

/// One output cluster. Serializes as `{ topic, docs, indices }`; the id is
/// the key of the surrounding map.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Cluster {
    #[serde(skip)]
    pub id: usize,
    pub topic: String,
    pub docs: Vec<String>,
    /// Original input positions of `docs`, same order
    pub indices: Vec<usize>,
}

/// Build all `k` clusters from documents and their assignments.
///
/// Every document must have exactly one assignment, with a cluster id
/// below `k`. See [`group_members`].
pub fn assemble(
    documents: &[Document],
    assignments: &[ClusterAssignment],
    k: usize,
    extractor: &dyn TopicExtractor,
) -> BTreeMap<usize, Cluster> {
    let groups = group_members(documents, assignments, k);
    let topics = extract_topics(&groups, extractor);
    build_clusters(groups, topics)
}

/// Members of each cluster id, in original input order.
///
/// The caller guarantees that every document has an assignment and that
/// every cluster id is below `k`. Debug builds panic when that does not
/// hold; release builds log a warning and leave the document out.
pub fn group_members<'a>(
    documents: &'a [Document],
    assignments: &[ClusterAssignment],
    k: usize,
) -> Vec<Vec<&'a Document>> {
    let by_index: HashMap<usize, usize> = assignments
        .iter()
        .map(|a| (a.original_index, a.cluster_id))
        .collect();

    let mut ordered: Vec<&Document> = documents.iter().collect();
    ordered.sort_by_key(|d| d.original_index);

    let mut groups: Vec<Vec<&Document>> = vec![Vec::new(); k];
    for doc in ordered {
        debug_assert!(
            by_index.get(&doc.original_index).is_some_and(|&id| id < k),
            "document {} has no cluster assignment below k = {k}",
            doc.original_index
        );
        match by_index.get(&doc.original_index) {
            Some(&id) if id < k => groups[id].push(doc),
            Some(&id) => warn!(
                original_index = doc.original_index,
                cluster_id = id,
                k,
                "Assignment outside cluster range, document dropped"
            ),
            None => warn!(
                original_index = doc.original_index,
                "Document has no cluster assignment"
            ),
        }
    }
    groups
}

/// Topic for each group. Empty groups get `NoTopic` without running the
/// extractor.
pub fn extract_topics(
    groups: &[Vec<&Document>],
    extractor: &dyn TopicExtractor,
) -> Vec<TopicOutcome> {
    groups
        .iter()
        .enumerate()
        .map(|(id, members)| {
            if members.is_empty() {
                return TopicOutcome::NoTopic;
            }
            let texts: Vec<&str> = members.iter().map(|d| d.raw_text.as_str()).collect();
            let outcome = extractor.extract(&texts);
            debug!(cluster = id, size = members.len(), topic = %outcome, "Cluster topic");
            outcome
        })
        .collect()
}

/// Zip groups with their topics into the id → cluster map.
pub fn build_clusters(
    groups: Vec<Vec<&Document>>,
    topics: Vec<TopicOutcome>,
) -> BTreeMap<usize, Cluster> {
    groups
        .into_iter()
        .zip(topics)
        .enumerate()
        .map(|(id, (members, topic))| {
            let cluster = Cluster {
                id,
                topic: topic.to_string(),
                docs: members.iter().map(|d| d.raw_text.clone()).collect(),
                indices: members.iter().map(|d| d.original_index).collect(),
            };
            (id, cluster)
        })
        .collect()
}
