use super::*;
use crate::intent::IntentKind;

fn focus_intent() -> Intent {
    Intent::new(IntentKind::FieldFocus, "Display Name", 812).with_connector("Jira")
}

#[test]
fn test_user_intent_wire_shape() {
    let msg = PanelMessage::UserIntent(focus_intent());
    let value: serde_json::Value = serde_json::from_str(&msg.to_json().unwrap()).unwrap();
    assert_eq!(value["type"], "USER_INTENT");
    assert_eq!(value["payload"]["kind"], "field_focus");
    assert_eq!(value["payload"]["label"], "Display Name");
}

#[test]
fn test_context_update_wire_shape() {
    let msg = PanelMessage::ContextUpdate(ContextUpdate {
        url: "https://admin.example.com/#/connectors".to_string(),
        title: "Microsoft 365 admin center".to_string(),
        page_header: "Data sources".to_string(),
        recent_intent: Some(IntentKind::StepProgression),
        connector: String::new(),
    });
    let value: serde_json::Value = serde_json::from_str(&msg.to_json().unwrap()).unwrap();
    assert_eq!(value["type"], "CONTEXT_UPDATE");
    assert_eq!(value["payload"]["page_header"], "Data sources");
    assert_eq!(value["payload"]["recent_intent"], "step_progression");
}

#[test]
fn test_from_json_parses_user_intent() {
    let raw = r#"{"type":"USER_INTENT","payload":{"kind":"initialize_connection","label":"Add","connector":"ServiceNow","timestamp_ms":10}}"#;
    let msg = PanelMessage::from_json(raw).unwrap();
    match msg {
        PanelMessage::UserIntent(intent) => {
            assert_eq!(intent.kind, IntentKind::InitializeConnection);
            assert_eq!(intent.connector, "ServiceNow");
        }
        other => panic!("unexpected message: {:?}", other),
    }
}

#[test]
fn test_from_json_rejects_unknown_type() {
    let raw = r#"{"type":"SCROLL_TO","payload":{}}"#;
    let err = PanelMessage::from_json(raw).unwrap_err();
    assert!(matches!(err, ProtocolError::Serialization(_)));
}

#[test]
fn test_from_json_rejects_unknown_kind() {
    let raw = r#"{"type":"USER_INTENT","payload":{"kind":"hover","label":"x","timestamp_ms":1}}"#;
    assert!(PanelMessage::from_json(raw).is_err());
}

#[test]
fn test_from_json_rejects_unlabelled_focus() {
    let raw = r#"{"type":"USER_INTENT","payload":{"kind":"field_focus","label":"","timestamp_ms":1}}"#;
    let err = PanelMessage::from_json(raw).unwrap_err();
    assert!(matches!(err, ProtocolError::InvalidPayload(_)));
}

#[test]
fn test_type_name() {
    assert_eq!(PanelMessage::UserIntent(focus_intent()).type_name(), "USER_INTENT");
}

#[test]
fn test_page_request_wire_shape() {
    let json = serde_json::to_string(&PageRequest::GetPageContent).unwrap();
    assert_eq!(json, r#"{"type":"GET_PAGE_CONTENT"}"#);

    let lock = PageRequest::LockFieldClass {
        class: "connector_agent".to_string(),
    };
    let json = serde_json::to_string(&lock).unwrap();
    assert_eq!(json, r#"{"type":"LOCK_FIELD_CLASS","class":"connector_agent"}"#);
}

#[test]
fn test_page_content_empty() {
    assert!(PageContent::empty().is_empty());
    assert!(!PageContent::new("<main></main>").is_empty());
    let parsed: PageContent = serde_json::from_str("{}").unwrap();
    assert!(parsed.is_empty());
}

#[test]
fn test_page_content_wire_shape() {
    let json = serde_json::to_string(&PageContent::new("<p>x</p>")).unwrap();
    assert_eq!(json, r#"{"html":"<p>x</p>"}"#);
    let with_url = PageContent::new("").with_url("https://admin");
    assert!(serde_json::to_string(&with_url).unwrap().contains("\"url\""));
}
