//! Outbound message composition.
//!
//! The backend recognises field focus by the `field_focus` tag and the
//! "focused on field" phrase, and reads the connector from
//! `Connector context: '<name>'`. Every message carries that trailer.

use shadowpilot_protocols::{ContextUpdate, Intent, IntentKind, UNKNOWN_CONNECTOR};

pub fn compose_intent(intent: &Intent) -> String {
    let connector = intent.connector_or_unknown();
    match intent.kind {
        IntentKind::FieldFocus => {
            let value = if intent.value.is_empty() {
                String::new()
            } else {
                format!(" (current value: '{}')", intent.value)
            };
            format!(
                "[{}] User focused on field '{}'{}. Connector context: '{}'.",
                intent.kind, intent.label, value, connector
            )
        }
        IntentKind::StepProgression => format!(
            "[{}] User clicked '{}' to move to the next step. Connector context: '{}'.",
            intent.kind, intent.label, connector
        ),
        IntentKind::InitializeConnection => format!(
            "[{}] User clicked '{}' to start setting up a new connection. Connector context: '{}'.",
            intent.kind, intent.label, connector
        ),
        IntentKind::ContextUpdate => format!(
            "[{}] User is now on '{}'. Connector context: '{}'.",
            intent.kind, intent.label, connector
        ),
    }
}

pub fn compose_context(update: &ContextUpdate) -> String {
    let connector = if update.connector.trim().is_empty() {
        UNKNOWN_CONNECTOR
    } else {
        update.connector.as_str()
    };
    let recent = update
        .recent_intent
        .map(|k| format!(" Last action: {}.", k))
        .unwrap_or_default();
    format!(
        "[{}] User navigated to '{}'.{} Connector context: '{}'.",
        IntentKind::ContextUpdate,
        update.page_header,
        recent,
        connector
    )
}
