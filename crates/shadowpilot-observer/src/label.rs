//! Label and value resolution for focused controls.

use crate::observer::{truncate_chars, PageObserver};
use crate::page::{collapse_whitespace, NodeId, PageDocument, Sibling};

impl PageObserver {
    /// Resolve a human-readable label for a control.
    ///
    /// Tried in order: `aria-label`, `aria-labelledby`, a wrapping `<label>`
    /// or `label[for]`, `placeholder`, then the nearest preceding sibling text
    /// (an element or a bare text run) within `ancestor_label_depth` levels. Ancestor candidates longer than
    /// `max_label_len` or equal to the control's own value are skipped.
    pub fn resolve_label(&self, doc: &PageDocument, id: NodeId) -> Option<String> {
        let max = self.config.max_label_len;
        let bounded = |text: String| {
            let text = collapse_whitespace(&text);
            (!text.is_empty()).then(|| truncate_chars(&text, max))
        };

        if let Some(label) = doc.attr(id, "aria-label").map(str::to_string).and_then(bounded) {
            return Some(label);
        }
        if let Some(label) = self.labelled_by(doc, id).and_then(bounded) {
            return Some(label);
        }
        if let Some(label) = self.label_element(doc, id).and_then(bounded) {
            return Some(label);
        }
        if let Some(label) = doc.attr(id, "placeholder").map(str::to_string).and_then(bounded) {
            return Some(label);
        }
        self.nearby_text(doc, id)
    }

    fn labelled_by(&self, doc: &PageDocument, id: NodeId) -> Option<String> {
        let refs = doc.attr(id, "aria-labelledby")?;
        let text = refs
            .split_whitespace()
            .filter_map(|r| doc.find_by_id(r))
            .map(|n| doc.visible_text(n))
            .filter(|t| !t.is_empty())
            .collect::<Vec<_>>()
            .join(" ");
        (!text.is_empty()).then_some(text)
    }

    fn label_element(&self, doc: &PageDocument, id: NodeId) -> Option<String> {
        if let Some(wrapper) = doc.ancestors(id).find(|&a| doc.tag(a) == Some("label")) {
            let text = doc.text_excluding(wrapper, Some(id));
            if !text.is_empty() {
                return Some(text);
            }
        }

        let element_id = doc.attr(id, "id")?;
        let mut labels = (0..doc.len())
            .map(NodeId)
            .filter(|&n| doc.tag(n) == Some("label") && doc.attr(n, "for") == Some(element_id));
        labels.find_map(|n| {
            let text = doc.visible_text(n);
            (!text.is_empty()).then_some(text)
        })
    }

    fn nearby_text(&self, doc: &PageDocument, id: NodeId) -> Option<String> {
        let value = self.control_value(doc, id);
        let mut current = id;
        for _ in 0..self.config.ancestor_label_depth {
            for sibling in doc.preceding_siblings(current) {
                let text = match sibling {
                    Sibling::Element(n) if self.is_interactive(doc, n) => continue,
                    Sibling::Element(n) => doc.visible_text(n),
                    Sibling::Text(text) => text,
                };
                if text.is_empty() {
                    continue;
                }
                if text.chars().count() > self.config.max_label_len || text == value {
                    continue;
                }
                return Some(text);
            }
            current = doc.parent(current)?;
        }
        None
    }

    /// Current content of a control, trimmed and bounded.
    pub fn control_value(&self, doc: &PageDocument, id: NodeId) -> String {
        let Some(tag) = doc.tag(id) else {
            return String::new();
        };
        let raw = match tag {
            "select" => selected_option(doc, id).unwrap_or_default(),
            "textarea" => doc
                .attr(id, "value")
                .map(str::to_string)
                .unwrap_or_else(|| doc.raw_text(id)),
            "input" => doc.attr(id, "value").unwrap_or_default().to_string(),
            _ => doc
                .attr(id, "value")
                .map(str::to_string)
                .unwrap_or_else(|| doc.visible_text(id)),
        };
        truncate_chars(raw.trim(), self.config.max_value_len)
    }
}

fn selected_option(doc: &PageDocument, select: NodeId) -> Option<String> {
    let options: Vec<NodeId> = doc
        .descendants(select)
        .into_iter()
        .filter(|&n| doc.tag(n) == Some("option"))
        .collect();
    let chosen = options
        .iter()
        .copied()
        .find(|&n| doc.has_attr(n, "selected"))
        .or_else(|| options.first().copied())?;
    let text = doc.visible_text(chosen);
    if text.is_empty() {
        doc.attr(chosen, "value").map(str::to_string)
    } else {
        Some(text)
    }
}
