//! Intent definitions.
//!
//! An intent is what the page context believes the administrator is doing.
//! Intents are produced by the classifier after debounce and dedup, so every
//! value of this type that crosses the bridge is meant to be acted on.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::ProtocolError;

/// Connector text shown when no connector could be resolved.
pub const UNKNOWN_CONNECTOR: &str = "Unknown Context";

/// Semantic kind of an intent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IntentKind {
    /// The user dwelt on a form field.
    FieldFocus,
    /// The user pressed next/save/validate.
    StepProgression,
    /// The user started configuring a new connection ("Add").
    InitializeConnection,
    /// Inferred from navigation: the page header changed.
    ContextUpdate,
}

impl IntentKind {
    /// Wire name of the kind.
    pub fn as_str(&self) -> &'static str {
        match self {
            IntentKind::FieldFocus => "field_focus",
            IntentKind::StepProgression => "step_progression",
            IntentKind::InitializeConnection => "initialize_connection",
            IntentKind::ContextUpdate => "context_update",
        }
    }

    /// Whether the intent comes from an explicit user action rather than
    /// being inferred from navigation.
    pub fn is_explicit(&self) -> bool {
        !matches!(self, IntentKind::ContextUpdate)
    }
}

impl fmt::Display for IntentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A classified user action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Intent {
    pub kind: IntentKind,
    /// Field or header text. May be empty for navigation-only events.
    #[serde(default)]
    pub label: String,
    /// Current content of the focused control, trimmed and bounded.
    #[serde(default)]
    pub value: String,
    /// Best-known connector name. May be empty.
    #[serde(default)]
    pub connector: String,
    /// Milliseconds since the page context started (monotonic).
    pub timestamp_ms: u64,
}

impl Intent {
    /// Create a new intent.
    pub fn new(kind: IntentKind, label: impl Into<String>, timestamp_ms: u64) -> Self {
        Self {
            kind,
            label: label.into(),
            value: String::new(),
            connector: String::new(),
            timestamp_ms,
        }
    }

    /// Set the control value.
    pub fn with_value(mut self, value: impl Into<String>) -> Self {
        self.value = value.into();
        self
    }

    /// Set the connector name.
    pub fn with_connector(mut self, connector: impl Into<String>) -> Self {
        self.connector = connector.into();
        self
    }

    /// Connector name, or [`UNKNOWN_CONNECTOR`] when none was resolved.
    pub fn connector_or_unknown(&self) -> &str {
        if self.connector.trim().is_empty() {
            UNKNOWN_CONNECTOR
        } else {
            &self.connector
        }
    }

    /// Reject intents no classifier would ever emit.
    ///
    /// Field focus and click intents always carry the text that triggered
    /// them; only context updates may be label-less.
    pub fn validate(&self) -> Result<(), ProtocolError> {
        if self.kind != IntentKind::ContextUpdate && self.label.trim().is_empty() {
            return Err(ProtocolError::InvalidPayload(format!(
                "{} intent without a label",
                self.kind
            )));
        }
        Ok(())
    }
}

/// Navigation-derived context, sent as `CONTEXT_UPDATE`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContextUpdate {
    pub url: String,
    /// Document title.
    #[serde(default)]
    pub title: String,
    /// Visible page header that triggered the update.
    pub page_header: String,
    /// Kind of the most recent explicit intent, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recent_intent: Option<IntentKind>,
    /// Connector guess at the time of the update. May be empty.
    #[serde(default)]
    pub connector: String,
}

impl ContextUpdate {
    pub fn validate(&self) -> Result<(), ProtocolError> {
        if self.page_header.trim().is_empty() {
            return Err(ProtocolError::InvalidPayload(
                "context update without a page header".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "intent_tests.rs"]
mod tests;
