//! Sanitized HTML snippet of the visible page, sent along with advice requests.

use tracing::debug;

use crate::observer::{truncate_chars, PageObserver};
use crate::page::{collapse_whitespace, NodeId, PageDocument};

const STRIPPED_TAGS: &[&str] = &["script", "style", "noscript", "template", "svg", "iframe"];

impl PageObserver {
    /// Serialize the main content region plus any open floating layers.
    pub fn extract_snippet(&self, doc: &PageDocument) -> String {
        if doc.is_empty() {
            return String::new();
        }
        let region = self.main_region(doc);
        let mut roots = vec![region];
        roots.extend(self.outer_overlays(doc, region));

        let html = doc.serialize_pruned(&roots, |id| {
            doc.tag(id).is_some_and(|tag| STRIPPED_TAGS.contains(&tag)) || !doc.is_visible(id)
        });
        let snippet = truncate_chars(&collapse_whitespace(&html), self.config.snippet_max_chars);
        debug!(
            region = region.0,
            overlays = roots.len() - 1,
            chars = snippet.chars().count(),
            "Extracted page snippet"
        );
        snippet
    }

    fn main_region(&self, doc: &PageDocument) -> NodeId {
        self.main_selectors
            .iter()
            .find_map(|s| {
                doc.select_all(s)
                    .into_iter()
                    .find(|&id| doc.is_visible(id))
            })
            .or_else(|| doc.body())
            .unwrap_or_else(|| doc.root())
    }

    /// Visible overlays outside `region`, outermost only, in document order.
    fn outer_overlays(&self, doc: &PageDocument, region: NodeId) -> Vec<NodeId> {
        let mut candidates: Vec<NodeId> = self
            .overlay_selectors
            .iter()
            .flat_map(|s| doc.select_all(s))
            .filter(|&id| !doc.contains(region, id) && doc.is_visible(id))
            .collect();
        candidates.sort();
        candidates.dedup();
        candidates
            .iter()
            .copied()
            .filter(|&id| !candidates.iter().any(|&c| c != id && doc.contains(c, id)))
            .collect()
    }
}
