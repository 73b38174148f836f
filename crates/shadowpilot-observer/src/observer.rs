//! Page observer: turns page state and DOM events into raw signals.

use shadowpilot_config::ObserverConfig;
use tracing::debug;

use crate::error::ObserverError;
use crate::page::{collapse_whitespace, parse_selectors, NodeId, PageDocument, Selector};
use crate::signal::{RawSignal, SignalKind};

const INTERACTIVE_ROLES: &[&str] = &["combobox", "listbox", "textbox", "searchbox", "spinbutton"];
const BUTTON_INPUT_TYPES: &[&str] = &["button", "submit", "reset", "image"];

/// Classification of a button click.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClickAction {
    Step,
    Start,
}

/// Reads a [`PageDocument`] with the configured vocabularies.
pub struct PageObserver {
    pub(crate) config: ObserverConfig,
    title_selectors: Vec<Selector>,
    pub(crate) main_selectors: Vec<Selector>,
    pub(crate) overlay_selectors: Vec<Selector>,
}

impl PageObserver {
    /// Create an observer, parsing every configured selector up front.
    pub fn new(config: ObserverConfig) -> Result<Self, ObserverError> {
        let title_selectors = parse_selectors(&config.title_selectors)?;
        let main_selectors = parse_selectors(&config.main_selectors)?;
        let overlay_selectors = parse_selectors(&config.overlay_selectors)?;
        Ok(Self {
            config,
            title_selectors,
            main_selectors,
            overlay_selectors,
        })
    }

    pub fn config(&self) -> &ObserverConfig {
        &self.config
    }

    /// First visible, non-generic header text in selector priority order.
    pub fn page_header(&self, doc: &PageDocument) -> Option<String> {
        for selector in &self.title_selectors {
            for id in doc.select_all(selector) {
                if !doc.is_visible(id) {
                    continue;
                }
                let text = doc.visible_text(id);
                if text.is_empty() || self.is_generic_title(&text) {
                    continue;
                }
                return Some(truncate_chars(&text, self.config.max_label_len));
            }
        }
        None
    }

    pub fn is_generic_title(&self, text: &str) -> bool {
        let text = text.trim();
        self.config
            .generic_titles
            .iter()
            .any(|g| g.eq_ignore_ascii_case(text))
    }

    /// First configured connector mentioned in `text` (case-insensitive).
    pub fn match_connector(&self, text: &str) -> Option<String> {
        self.matching_connectors(text).into_iter().next()
    }

    fn matching_connectors(&self, text: &str) -> Vec<String> {
        let haystack = text.to_lowercase();
        self.config
            .connectors
            .iter()
            .filter(|c| !c.is_empty() && haystack.contains(&c.to_lowercase()))
            .cloned()
            .collect()
    }

    /// Connector guess from the page header, then the document title.
    pub fn guess_connector(&self, doc: &PageDocument) -> Option<String> {
        self.page_header(doc)
            .and_then(|h| self.match_connector(&h))
            .or_else(|| self.match_connector(doc.title()))
    }

    /// Re-scan the settled page.
    pub fn scan(&self, doc: &PageDocument) -> RawSignal {
        let header = self.page_header(doc).unwrap_or_default();
        let connector = self
            .match_connector(&header)
            .or_else(|| self.match_connector(doc.title()));
        debug!(header = %header, connector = ?connector, "Page scanned");
        RawSignal::new(SignalKind::PageScan, doc.url(), doc.title())
            .with_label(header)
            .with_connector(connector)
    }

    pub fn navigation_signal(&self, doc: &PageDocument) -> RawSignal {
        RawSignal::new(SignalKind::Navigation, doc.url(), doc.title())
    }

    pub fn blur_signal(&self, doc: &PageDocument) -> RawSignal {
        RawSignal::new(SignalKind::Blur, doc.url(), doc.title())
    }

    /// Whether focus on this element can produce a field signal.
    pub fn is_interactive(&self, doc: &PageDocument, id: NodeId) -> bool {
        let Some(tag) = doc.tag(id) else {
            return false;
        };
        if doc.has_attr(id, "disabled") {
            return false;
        }
        match tag {
            "input" => {
                let ty = doc.attr(id, "type").unwrap_or("text").to_lowercase();
                ty != "hidden" && !BUTTON_INPUT_TYPES.contains(&ty.as_str())
            }
            "textarea" | "select" => true,
            _ => doc
                .role(id)
                .map(|r| INTERACTIVE_ROLES.contains(&r))
                .unwrap_or(false),
        }
    }

    /// Labels containing an excluded term never produce signals.
    pub fn is_excluded(&self, label: &str) -> bool {
        let label = label.to_lowercase();
        self.config
            .excluded_labels
            .iter()
            .any(|e| !e.is_empty() && label.contains(&e.to_lowercase()))
    }

    /// Focus-in on `id`. `None` when the target is not a labelled, included control.
    pub fn focus_signal(&self, doc: &PageDocument, id: NodeId) -> Option<RawSignal> {
        if !self.is_interactive(doc, id) {
            debug!(node = id.0, "Focus on non-interactive element ignored");
            return None;
        }
        let Some(label) = self.resolve_label(doc, id) else {
            debug!(node = id.0, "No label resolved for focused control");
            return None;
        };
        if self.is_excluded(&label) {
            debug!(label = %label, "Focus on excluded field ignored");
            return None;
        }
        let value = self.control_value(doc, id);
        Some(
            RawSignal::new(SignalKind::FieldFocus, doc.url(), doc.title())
                .with_label(label)
                .with_value(value)
                .with_connector(self.guess_connector(doc))
                .with_target(id),
        )
    }

    /// Click on `id`.
    pub fn click_signal(&self, doc: &PageDocument, id: NodeId) -> Option<RawSignal> {
        let Some(button) = self.enclosing_button(doc, id) else {
            return self.connector_hint(doc, id);
        };
        let text = self.button_text(doc, button);
        let action = self.classify_action(&text)?;
        let signal = RawSignal::new(
            match action {
                ClickAction::Step => SignalKind::StepProgression,
                ClickAction::Start => SignalKind::ConnectionStart,
            },
            doc.url(),
            doc.title(),
        )
        .with_label(truncate_chars(&text, self.config.max_label_len))
        .with_target(button);

        Some(match action {
            ClickAction::Step => signal,
            ClickAction::Start => signal.with_connector(self.scan_ancestors_for_connector(doc, button)),
        })
    }

    /// Map button text to an action, step vocabulary first.
    pub fn classify_action(&self, text: &str) -> Option<ClickAction> {
        let words = words_of(text);
        if words.is_empty() {
            return None;
        }
        let starts_with = |action: &String| {
            let action = words_of(action);
            !action.is_empty() && words.starts_with(&action)
        };
        if self.config.step_actions.iter().any(starts_with) {
            Some(ClickAction::Step)
        } else if self.config.start_actions.iter().any(starts_with) {
            Some(ClickAction::Start)
        } else {
            None
        }
    }

    fn connector_hint(&self, doc: &PageDocument, id: NodeId) -> Option<RawSignal> {
        let connector = self.scan_ancestors_for_connector(doc, id)?;
        debug!(connector = %connector, "Connector captured from click");
        Some(
            RawSignal::new(SignalKind::ConnectorHint, doc.url(), doc.title())
                .with_label(connector.clone())
                .with_connector(Some(connector))
                .with_target(id),
        )
    }

    /// Nearest element (itself or an ancestor within the scan depth) that acts as a button.
    fn enclosing_button(&self, doc: &PageDocument, id: NodeId) -> Option<NodeId> {
        std::iter::once(id)
            .chain(doc.ancestors(id))
            .take(self.config.click_scan_depth + 1)
            .find(|&n| is_button_like(doc, n))
    }

    fn button_text(&self, doc: &PageDocument, id: NodeId) -> String {
        let text = doc.visible_text(id);
        if !text.is_empty() {
            return text;
        }
        ["aria-label", "value", "title"]
            .iter()
            .filter_map(|a| doc.attr(id, a))
            .map(collapse_whitespace)
            .find(|t| !t.is_empty())
            .unwrap_or_default()
    }

    /// Walk from `id` upwards; the nearest level naming exactly one connector wins.
    /// A level naming several connectors is a listing, and the scan stops there.
    fn scan_ancestors_for_connector(&self, doc: &PageDocument, id: NodeId) -> Option<String> {
        for node in std::iter::once(id)
            .chain(doc.ancestors(id))
            .take(self.config.click_scan_depth + 1)
        {
            let mut found = self.matching_connectors(&doc.visible_text(node));
            match found.len() {
                0 => continue,
                1 => return found.pop(),
                _ => return None,
            }
        }
        None
    }
}

fn is_button_like(doc: &PageDocument, id: NodeId) -> bool {
    match doc.tag(id) {
        Some("button") => true,
        Some("input") => doc
            .attr(id, "type")
            .map(|t| BUTTON_INPUT_TYPES.contains(&t.to_lowercase().as_str()))
            .unwrap_or(false),
        Some(_) => doc.role(id) == Some("button"),
        None => false,
    }
}

fn words_of(text: &str) -> Vec<String> {
    text.to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .map(str::to_string)
        .collect()
}

/// Truncate to at most `max` characters.
pub fn truncate_chars(text: &str, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((idx, _)) => text[..idx].to_string(),
        None => text.to_string(),
    }
}

#[cfg(test)]
#[path = "observer_tests.rs"]
mod tests;
