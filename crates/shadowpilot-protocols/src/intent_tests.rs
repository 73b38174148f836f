use super::*;

#[test]
fn test_kind_wire_names() {
    assert_eq!(IntentKind::FieldFocus.as_str(), "field_focus");
    assert_eq!(IntentKind::StepProgression.as_str(), "step_progression");
    assert_eq!(IntentKind::InitializeConnection.as_str(), "initialize_connection");
    assert_eq!(IntentKind::ContextUpdate.as_str(), "context_update");
}

#[test]
fn test_kind_serde_matches_as_str() {
    for kind in [
        IntentKind::FieldFocus,
        IntentKind::StepProgression,
        IntentKind::InitializeConnection,
        IntentKind::ContextUpdate,
    ] {
        let json = serde_json::to_string(&kind).unwrap();
        assert_eq!(json, format!("\"{}\"", kind.as_str()));
    }
}

#[test]
fn test_only_context_update_is_inferred() {
    assert!(IntentKind::FieldFocus.is_explicit());
    assert!(IntentKind::StepProgression.is_explicit());
    assert!(IntentKind::InitializeConnection.is_explicit());
    assert!(!IntentKind::ContextUpdate.is_explicit());
}

#[test]
fn test_intent_builder() {
    let intent = Intent::new(IntentKind::FieldFocus, "Display Name", 1200)
        .with_value("Jira Tickets")
        .with_connector("Jira");
    assert_eq!(intent.label, "Display Name");
    assert_eq!(intent.value, "Jira Tickets");
    assert_eq!(intent.connector, "Jira");
    assert_eq!(intent.timestamp_ms, 1200);
}

#[test]
fn test_connector_or_unknown() {
    let intent = Intent::new(IntentKind::FieldFocus, "Description", 0);
    assert_eq!(intent.connector_or_unknown(), UNKNOWN_CONNECTOR);

    let intent = intent.with_connector("ServiceNow");
    assert_eq!(intent.connector_or_unknown(), "ServiceNow");
}

#[test]
fn test_blank_connector_is_unknown() {
    let intent = Intent::new(IntentKind::StepProgression, "Next", 0).with_connector("   ");
    assert_eq!(intent.connector_or_unknown(), UNKNOWN_CONNECTOR);
}

#[test]
fn test_validate_rejects_unlabelled_field_focus() {
    let intent = Intent::new(IntentKind::FieldFocus, "  ", 0);
    let err = intent.validate().unwrap_err();
    assert!(err.to_string().contains("field_focus"));
}

#[test]
fn test_validate_accepts_labelled_intents() {
    assert!(Intent::new(IntentKind::InitializeConnection, "Add", 0).validate().is_ok());
    assert!(Intent::new(IntentKind::ContextUpdate, "", 0).validate().is_ok());
}

#[test]
fn test_intent_deserialization_defaults() {
    let json = r#"{"kind":"step_progression","label":"Next","timestamp_ms":5}"#;
    let intent: Intent = serde_json::from_str(json).unwrap();
    assert_eq!(intent.kind, IntentKind::StepProgression);
    assert!(intent.value.is_empty());
    assert!(intent.connector.is_empty());
}

#[test]
fn test_context_update_requires_header() {
    let update = ContextUpdate {
        url: "https://admin.example.com/connectors".to_string(),
        title: "Admin".to_string(),
        page_header: String::new(),
        recent_intent: None,
        connector: String::new(),
    };
    assert!(update.validate().is_err());
}

#[test]
fn test_context_update_omits_missing_recent_intent() {
    let update = ContextUpdate {
        url: "u".to_string(),
        title: "t".to_string(),
        page_header: "Data sources".to_string(),
        recent_intent: None,
        connector: String::new(),
    };
    let json = serde_json::to_string(&update).unwrap();
    assert!(!json.contains("recent_intent"));
}
