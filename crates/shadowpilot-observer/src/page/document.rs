//! Page model: a parsed HTML document plus the URL and title the browser reports.

use std::collections::{BTreeMap, HashMap};

use scraper::node::Element;
use scraper::{ElementRef, Html, Selector};
use serde::{Deserialize, Serialize};

use super::selector::parse_selector;
use crate::error::ObserverError;

/// Tags whose content never counts as visible text.
const TEXTLESS_TAGS: &[&str] = &["script", "style", "template", "noscript"];

/// Position of an element in document order. The root element is `NodeId(0)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(pub usize);

/// Builder for pages assembled in code.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ElementSpec {
    pub tag: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub attrs: BTreeMap<String, String>,
    /// Text owned directly by the element, rendered before its children.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub text: String,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub hidden: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<ElementSpec>,
}

impl ElementSpec {
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            ..Default::default()
        }
    }

    pub fn attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attrs.insert(name.into(), value.into());
        self
    }

    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.text = text.into();
        self
    }

    pub fn hidden(mut self) -> Self {
        self.hidden = true;
        self
    }

    pub fn child(mut self, child: ElementSpec) -> Self {
        self.children.push(child);
        self
    }

    pub fn children(mut self, children: impl IntoIterator<Item = ElementSpec>) -> Self {
        self.children.extend(children);
        self
    }

    /// Markup for this element and its subtree.
    pub fn to_html(&self) -> String {
        let mut out = String::new();
        self.write(&mut out);
        out
    }

    fn write(&self, out: &mut String) {
        let tag = self.tag.to_lowercase();
        out.push('<');
        out.push_str(&tag);
        for (name, value) in &self.attrs {
            out.push_str(&format!(" {}=\"{}\"", name, escape_markup(value)));
        }
        if self.hidden {
            out.push_str(" hidden");
        }
        out.push('>');
        out.push_str(&escape_markup(&self.text));
        for child in &self.children {
            child.write(out);
        }
        out.push_str(&format!("</{}>", tag));
    }
}

fn escape_markup(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

/// A page as recorded on disk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageSnapshot {
    pub url: String,
    /// Document title. When empty, the `<title>` element is used.
    #[serde(default)]
    pub title: String,
    pub html: String,
}

/// A preceding sibling of an element: another element, or a bare text run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Sibling {
    Element(NodeId),
    Text(String),
}

/// The page the observer reads from.
#[derive(Debug, Clone)]
pub struct PageDocument {
    url: String,
    title: String,
    html: Html,
    elements: Vec<ego_tree::NodeId>,
    positions: HashMap<ego_tree::NodeId, NodeId>,
}

impl PageDocument {
    /// Parse `source` as a full HTML document.
    pub fn parse(url: impl Into<String>, title: impl Into<String>, source: &str) -> Self {
        let html = Html::parse_document(source);
        let elements: Vec<ego_tree::NodeId> = html
            .root_element()
            .descendants()
            .filter_map(ElementRef::wrap)
            .map(|e| e.id())
            .collect();
        let positions = elements
            .iter()
            .enumerate()
            .map(|(index, &raw)| (raw, NodeId(index)))
            .collect();

        let mut title: String = title.into();
        if title.trim().is_empty() {
            title = document_title(&html).unwrap_or_default();
        }

        Self {
            url: url.into(),
            title,
            html,
            elements,
            positions,
        }
    }

    /// Build a document whose body holds `root`.
    pub fn new(url: impl Into<String>, title: impl Into<String>, root: ElementSpec) -> Self {
        Self::parse(url, title, &root.to_html())
    }

    pub fn from_snapshot(snapshot: PageSnapshot) -> Self {
        Self::parse(snapshot.url, snapshot.title, &snapshot.html)
    }

    pub fn from_json(json: &str) -> Result<Self, ObserverError> {
        let snapshot: PageSnapshot = serde_json::from_str(json)?;
        Ok(Self::from_snapshot(snapshot))
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    /// Client-side navigation: same element tree, new URL.
    pub fn set_url(&mut self, url: impl Into<String>) {
        self.url = url.into();
    }

    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    pub fn body(&self) -> Option<NodeId> {
        (0..self.len()).map(NodeId).find(|&id| self.tag(id) == Some("body"))
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    pub fn element(&self, id: NodeId) -> Option<ElementRef<'_>> {
        let raw = *self.elements.get(id.0)?;
        self.html.tree.get(raw).and_then(ElementRef::wrap)
    }

    pub fn node_id(&self, element: &ElementRef<'_>) -> Option<NodeId> {
        self.positions.get(&element.id()).copied()
    }

    /// Lowercase tag name.
    pub fn tag(&self, id: NodeId) -> Option<&str> {
        self.element(id).map(|e| e.value().name())
    }

    pub fn attr(&self, id: NodeId, name: &str) -> Option<&str> {
        self.element(id).and_then(|e| e.value().attr(name))
    }

    pub fn has_attr(&self, id: NodeId, name: &str) -> bool {
        self.attr(id, name).is_some()
    }

    pub fn role(&self, id: NodeId) -> Option<&str> {
        self.attr(id, "role")
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        let element = self.element(id)?;
        element
            .parent()
            .and_then(ElementRef::wrap)
            .and_then(|p| self.node_id(&p))
    }

    /// Ancestors from the parent upwards.
    pub fn ancestors(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        std::iter::successors(self.parent(id), move |&n| self.parent(n))
    }

    /// `id` and its descendant elements in document order.
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let Some(element) = self.element(id) else {
            return Vec::new();
        };
        element
            .descendants()
            .filter_map(ElementRef::wrap)
            .filter_map(|e| self.node_id(&e))
            .collect()
    }

    /// Whether `node` is `ancestor` or lies inside it.
    pub fn contains(&self, ancestor: NodeId, node: NodeId) -> bool {
        node == ancestor || self.ancestors(node).any(|a| a == ancestor)
    }

    /// Siblings before `id`, nearest first. Whitespace-only text is skipped.
    pub fn preceding_siblings(&self, id: NodeId) -> Vec<Sibling> {
        let Some(element) = self.element(id) else {
            return Vec::new();
        };
        element
            .prev_siblings()
            .filter_map(|node| {
                if let Some(text) = node.value().as_text() {
                    let text = collapse_whitespace(text);
                    return (!text.is_empty()).then_some(Sibling::Text(text));
                }
                ElementRef::wrap(node)
                    .and_then(|e| self.node_id(&e))
                    .map(Sibling::Element)
            })
            .collect()
    }

    pub fn find_by_id(&self, element_id: &str) -> Option<NodeId> {
        (0..self.len())
            .map(NodeId)
            .find(|&id| self.attr(id, "id") == Some(element_id))
    }

    /// Rendered visibility: neither the element nor any ancestor is hidden.
    pub fn is_visible(&self, id: NodeId) -> bool {
        let Some(element) = self.element(id) else {
            return false;
        };
        !is_self_hidden(element.value())
            && element
                .ancestors()
                .filter_map(ElementRef::wrap)
                .all(|a| !is_self_hidden(a.value()))
    }

    /// Visible text of the subtree, whitespace-collapsed.
    pub fn visible_text(&self, id: NodeId) -> String {
        self.text_excluding(id, None)
    }

    /// Visible text of the subtree, skipping the subtree rooted at `exclude`.
    pub fn text_excluding(&self, id: NodeId, exclude: Option<NodeId>) -> String {
        if !self.is_visible(id) {
            return String::new();
        }
        let Some(element) = self.element(id) else {
            return String::new();
        };
        let mut parts = Vec::new();
        self.collect_text(element, exclude, &mut parts);
        collapse_whitespace(&parts.join(" "))
    }

    fn collect_text<'a>(
        &self,
        element: ElementRef<'a>,
        exclude: Option<NodeId>,
        out: &mut Vec<&'a str>,
    ) {
        if exclude.is_some() && self.node_id(&element) == exclude {
            return;
        }
        let value = element.value();
        if is_self_hidden(value) || TEXTLESS_TAGS.contains(&value.name()) {
            return;
        }
        for child in element.children() {
            if let Some(text) = child.value().as_text() {
                out.push(&**text);
            } else if let Some(child) = ElementRef::wrap(child) {
                self.collect_text(child, exclude, out);
            }
        }
    }

    /// All text inside the element, hidden or not, as written.
    pub fn raw_text(&self, id: NodeId) -> String {
        self.element(id)
            .map(|e| e.text().collect::<String>())
            .unwrap_or_default()
    }

    /// First element in document order matching the selector.
    pub fn select_first(&self, selector: &Selector) -> Option<NodeId> {
        self.html
            .select(selector)
            .next()
            .and_then(|e| self.node_id(&e))
    }

    /// All elements in document order matching the selector.
    pub fn select_all(&self, selector: &Selector) -> Vec<NodeId> {
        self.html
            .select(selector)
            .filter_map(|e| self.node_id(&e))
            .collect()
    }

    /// Parse `css` and return the first match.
    pub fn query(&self, css: &str) -> Result<Option<NodeId>, ObserverError> {
        let selector = parse_selector(css)?;
        Ok(self.select_first(&selector))
    }

    /// Outer HTML of `roots`, concatenated, with every element for which
    /// `prune` holds removed first. Pruned roots are skipped.
    pub fn serialize_pruned(&self, roots: &[NodeId], prune: impl Fn(NodeId) -> bool) -> String {
        let doomed: Vec<NodeId> = (0..self.len()).map(NodeId).filter(|&id| prune(id)).collect();
        let mut html = self.html.clone();
        for id in &doomed {
            let Some(&raw) = self.elements.get(id.0) else {
                continue;
            };
            if let Some(mut node) = html.tree.get_mut(raw) {
                node.detach();
            }
        }

        roots
            .iter()
            .filter(|&&id| !doomed.contains(&id))
            .filter_map(|id| self.elements.get(id.0))
            .filter_map(|&raw| html.tree.get(raw).and_then(ElementRef::wrap))
            .map(|e| e.html())
            .collect()
    }
}

/// Hidden by its own markup, regardless of ancestors.
fn is_self_hidden(element: &Element) -> bool {
    if element.attr("hidden").is_some() || element.attr("aria-hidden") == Some("true") {
        return true;
    }
    if element.name() == "input" && element.attr("type") == Some("hidden") {
        return true;
    }
    element
        .attr("style")
        .map(|style| {
            let style: String = style.chars().filter(|c| !c.is_whitespace()).collect();
            let style = style.to_lowercase();
            style.contains("display:none") || style.contains("visibility:hidden")
        })
        .unwrap_or(false)
}

fn document_title(html: &Html) -> Option<String> {
    let selector = Selector::parse("title").ok()?;
    html.select(&selector)
        .next()
        .map(|e| collapse_whitespace(&e.text().collect::<String>()))
        .filter(|t| !t.is_empty())
}

/// Collapse runs of whitespace into single spaces and trim.
pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
#[path = "document_tests.rs"]
mod tests;
