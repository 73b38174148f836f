//! Raw signals emitted by the observer, before debounce and dedup.

use serde::{Deserialize, Serialize};

use crate::page::NodeId;

/// What the observer saw.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SignalKind {
    /// Focus-in on a labelled interactive control.
    FieldFocus,
    /// Focus left the current control.
    Blur,
    /// Click on a next/save/validate button.
    StepProgression,
    /// Click on an add/setup button.
    ConnectionStart,
    /// Click on a non-button element whose surroundings name a connector.
    ConnectorHint,
    /// Page re-scanned after navigation settled.
    PageScan,
    /// URL changed; the page is not settled yet.
    Navigation,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawSignal {
    pub kind: SignalKind,
    /// Field label, button text or page header.
    pub label: String,
    pub value: String,
    pub connector_guess: Option<String>,
    pub url: String,
    pub title: String,
    pub target: Option<NodeId>,
}

impl RawSignal {
    pub fn new(kind: SignalKind, url: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            kind,
            label: String::new(),
            value: String::new(),
            connector_guess: None,
            url: url.into(),
            title: title.into(),
            target: None,
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    pub fn with_value(mut self, value: impl Into<String>) -> Self {
        self.value = value.into();
        self
    }

    pub fn with_connector(mut self, connector: Option<String>) -> Self {
        self.connector_guess = connector;
        self
    }

    pub fn with_target(mut self, target: NodeId) -> Self {
        self.target = Some(target);
        self
    }
}
