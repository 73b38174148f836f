//! Intra-extension message protocol.
//!
//! Messages travel between two execution contexts that share no memory:
//!
//! ```text
//! page context ── USER_INTENT / CONTEXT_UPDATE ──▶ panel context
//! page context ◀── GET_PAGE_CONTENT ──────────── panel context
//!              ──── { html } ───────────────────▶
//! page context ◀── LOCK_FIELD_CLASS ──────────── panel context
//! ```
//!
//! On the wire every message is `{"type": "...", "payload": {...}}`.
//! Unknown types and malformed payloads are rejected at the boundary.

use serde::{Deserialize, Serialize};

use crate::error::ProtocolError;
use crate::intent::{ContextUpdate, Intent};

/// Page → panel message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PanelMessage {
    UserIntent(Intent),
    ContextUpdate(ContextUpdate),
}

impl PanelMessage {
    /// Wire type name.
    pub fn type_name(&self) -> &'static str {
        match self {
            PanelMessage::UserIntent(_) => "USER_INTENT",
            PanelMessage::ContextUpdate(_) => "CONTEXT_UPDATE",
        }
    }

    /// Validate the payload.
    pub fn validate(&self) -> Result<(), ProtocolError> {
        match self {
            PanelMessage::UserIntent(intent) => intent.validate(),
            PanelMessage::ContextUpdate(update) => update.validate(),
        }
    }

    /// Parse and validate a wire message.
    pub fn from_json(raw: &str) -> Result<Self, ProtocolError> {
        let message: PanelMessage = serde_json::from_str(raw)?;
        message.validate()?;
        Ok(message)
    }

    /// Serialize to the wire format.
    pub fn to_json(&self) -> Result<String, ProtocolError> {
        Ok(serde_json::to_string(self)?)
    }
}

/// Panel → page request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PageRequest {
    GetPageContent,
    /// The user confirmed a dynamic field class; stop reporting its fields.
    LockFieldClass { class: String },
}

/// Response to [`PageRequest::GetPageContent`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageContent {
    #[serde(default)]
    pub html: String,
    /// URL of the page the snippet was taken from.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub url: String,
}

impl PageContent {
    pub fn new(html: impl Into<String>) -> Self {
        Self {
            html: html.into(),
            url: String::new(),
        }
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = url.into();
        self
    }

    /// The "no extra context available" response.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.html.is_empty()
    }
}

#[cfg(test)]
#[path = "message_tests.rs"]
mod tests;
