//! Panel transcript: the advice shown to the administrator.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use shadowpilot_intent::MessageId;
use shadowpilot_protocols::IntentKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Advice from the backend.
    Assistant,
    /// Inline notices, e.g. backend failures.
    System,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranscriptEntry {
    pub id: MessageId,
    pub role: Role,
    pub text: String,
    /// Kind of the intent that produced the entry.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub intent: Option<IntentKind>,
    pub created_at: DateTime<Utc>,
}

/// Append-only list of entries with a single highlight marker.
#[derive(Debug, Default, Clone)]
pub struct Transcript {
    entries: Vec<TranscriptEntry>,
    next_id: u64,
    highlighted: Option<MessageId>,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&mut self, role: Role, text: impl Into<String>, intent: Option<IntentKind>) -> MessageId {
        self.next_id += 1;
        let id = MessageId(self.next_id);
        self.entries.push(TranscriptEntry {
            id,
            role,
            text: text.into(),
            intent,
            created_at: Utc::now(),
        });
        id
    }

    pub fn get(&self, id: MessageId) -> Option<&TranscriptEntry> {
        self.entries.iter().find(|e| e.id == id)
    }

    /// Mark an existing entry. Returns `false` for unknown ids.
    pub fn highlight(&mut self, id: MessageId) -> bool {
        if self.get(id).is_none() {
            return false;
        }
        self.highlighted = Some(id);
        true
    }

    pub fn highlighted(&self) -> Option<MessageId> {
        self.highlighted
    }

    pub fn entries(&self) -> &[TranscriptEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
