//! Per-execution-context session state.

use std::collections::{HashMap, HashSet};
use std::fmt;

use serde::{Deserialize, Serialize};
use shadowpilot_observer::NodeId;
use shadowpilot_protocols::IntentKind;
use tokio::time::Instant;
use tracing::debug;

/// Identifier of a transcript message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MessageId(pub u64);

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "msg-{}", self.0)
    }
}

/// Identity of a field for advice caching.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct HistoryKey {
    pub label: String,
    pub connector: String,
}

impl HistoryKey {
    pub fn new(label: impl AsRef<str>, connector: impl AsRef<str>) -> Self {
        Self {
            label: label.as_ref().trim().to_string(),
            connector: connector.as_ref().trim().to_string(),
        }
    }
}

/// The most recently reported field focus.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LastFocus {
    pub target: Option<NodeId>,
    pub label: String,
    pub at: Instant,
}

impl LastFocus {
    /// Same element or same label.
    pub fn is_same_field(&self, target: Option<NodeId>, label: &str) -> bool {
        (self.target.is_some() && self.target == target) || self.label == label
    }
}

/// Session state owned by one execution context.
///
/// One instance lives in the page context and one in the panel context.
/// Nothing is shared or persisted; dropping the context drops the session.
#[derive(Debug, Default)]
pub struct SessionContext {
    current_url: String,
    detected_connector: Option<String>,
    last_intent_at: Option<Instant>,
    last_explicit_intent: Option<(IntentKind, Instant)>,
    last_focus: Option<LastFocus>,
    last_context: Option<(String, String)>,
    history: HashMap<HistoryKey, MessageId>,
    confirmed: HashSet<String>,
    connector_context_markers: Vec<String>,
}

impl SessionContext {
    /// `connector_context_markers` are URL fragments of pages where a
    /// detected connector stays relevant.
    pub fn new(connector_context_markers: Vec<String>) -> Self {
        Self {
            connector_context_markers: connector_context_markers
                .into_iter()
                .map(|m| m.to_lowercase())
                .collect(),
            ..Default::default()
        }
    }

    pub fn current_url(&self) -> &str {
        &self.current_url
    }

    pub fn detected_connector(&self) -> Option<&str> {
        self.detected_connector.as_deref()
    }

    /// Fold a detection into the sticky connector. Empty detections keep the
    /// previous value. Returns the connector now in effect.
    pub fn observe_detection(&mut self, detected: Option<&str>) -> Option<&str> {
        if let Some(name) = detected.map(str::trim).filter(|n| !n.is_empty()) {
            if self.detected_connector.as_deref() != Some(name) {
                debug!(connector = %name, "Connector detected");
                self.detected_connector = Some(name.to_string());
            }
        }
        self.detected_connector.as_deref()
    }

    pub fn is_connector_context(&self, url: &str) -> bool {
        let url = url.to_lowercase();
        self.connector_context_markers.iter().any(|m| url.contains(m))
    }

    /// Record a navigation. Returns `true` when the URL changed.
    ///
    /// Leaving the connector pages clears the sticky connector.
    pub fn navigate(&mut self, url: &str) -> bool {
        if self.current_url == url {
            return false;
        }
        self.current_url = url.to_string();
        if self.detected_connector.is_some() && !self.is_connector_context(url) {
            debug!(url = %url, "Left connector pages, clearing connector");
            self.detected_connector = None;
        }
        true
    }

    /// Mirror page state received over the bridge (panel side).
    pub fn mirror(&mut self, url: &str, connector: &str) {
        if !url.is_empty() {
            self.navigate(url);
        }
        self.observe_detection(Some(connector));
    }

    pub fn record_intent(&mut self, kind: IntentKind, at: Instant) {
        self.last_intent_at = Some(at);
        if kind.is_explicit() {
            self.last_explicit_intent = Some((kind, at));
        }
    }

    pub fn last_intent_at(&self) -> Option<Instant> {
        self.last_intent_at
    }

    pub fn last_explicit_intent_at(&self) -> Option<Instant> {
        self.last_explicit_intent.map(|(_, at)| at)
    }

    /// Kind of the most recent explicit intent.
    pub fn recent_intent(&self) -> Option<IntentKind> {
        self.last_explicit_intent.map(|(kind, _)| kind)
    }

    pub fn record_focus(&mut self, target: Option<NodeId>, label: &str, at: Instant) {
        self.last_focus = Some(LastFocus {
            target,
            label: label.to_string(),
            at,
        });
    }

    pub fn last_focus(&self) -> Option<&LastFocus> {
        self.last_focus.as_ref()
    }

    pub fn is_duplicate_context(&self, url: &str, header: &str) -> bool {
        self.last_context
            .as_ref()
            .is_some_and(|(u, h)| u == url && h == header)
    }

    pub fn record_context(&mut self, url: &str, header: &str) {
        self.last_context = Some((url.to_string(), header.to_string()));
    }

    pub fn history_get(&self, key: &HistoryKey) -> Option<MessageId> {
        self.history.get(key).copied()
    }

    /// Insert if absent. Existing entries are never replaced or evicted.
    pub fn history_insert(&mut self, key: HistoryKey, id: MessageId) -> bool {
        if self.history.contains_key(&key) {
            return false;
        }
        self.history.insert(key, id);
        true
    }

    pub fn history_len(&self) -> usize {
        self.history.len()
    }

    /// Lock a dynamic field class for the rest of the session.
    pub fn confirm(&mut self, class: &str) -> bool {
        self.confirmed.insert(class.to_string())
    }

    pub fn is_confirmed(&self, class: &str) -> bool {
        self.confirmed.contains(class)
    }
}
