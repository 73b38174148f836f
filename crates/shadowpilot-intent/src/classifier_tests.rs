use super::*;
use shadowpilot_config::PanelConfig;
use shadowpilot_observer::NodeId;

const URL: &str = "https://admin.microsoft.com/#/connectors";

fn classifier(origin: Instant) -> IntentClassifier {
    IntentClassifier::new(&TimingConfig::default(), &ObserverConfig::default(), origin)
}

fn with_dynamic_fields(origin: Instant) -> IntentClassifier {
    classifier(origin).with_dynamic_fields(PanelConfig::default().dynamic_fields)
}

fn ms(n: u64) -> Duration {
    Duration::from_millis(n)
}

fn focus(target: usize, label: &str) -> RawSignal {
    RawSignal::new(SignalKind::FieldFocus, URL, "Connectors")
        .with_label(label)
        .with_value("current")
        .with_target(NodeId(target))
}

fn click(kind: SignalKind, label: &str, connector: Option<&str>) -> RawSignal {
    RawSignal::new(kind, URL, "Connectors")
        .with_label(label)
        .with_connector(connector.map(str::to_string))
}

fn scan(url: &str, header: &str, connector: Option<&str>) -> RawSignal {
    RawSignal::new(SignalKind::PageScan, url, "Admin")
        .with_label(header)
        .with_connector(connector.map(str::to_string))
}

fn intent(messages: &[PanelMessage]) -> &Intent {
    match messages {
        [PanelMessage::UserIntent(intent)] => intent,
        other => panic!("expected one intent, got {:?}", other),
    }
}

#[test]
fn test_focus_fires_after_debounce() {
    let t0 = Instant::now();
    let mut c = classifier(t0);
    assert!(c.on_signal(focus(1, "Display Name"), t0).is_empty());
    assert_eq!(c.next_deadline(), Some(t0 + ms(800)));
    assert!(c.poll(t0 + ms(799)).is_empty());

    let out = c.poll(t0 + ms(800));
    let intent = intent(&out);
    assert_eq!(intent.kind, IntentKind::FieldFocus);
    assert_eq!(intent.label, "Display Name");
    assert_eq!(intent.value, "current");
    assert_eq!(intent.timestamp_ms, 800);
    assert!(c.next_deadline().is_none());
}

#[test]
fn test_blur_cancels_pending_focus() {
    let t0 = Instant::now();
    let mut c = classifier(t0);
    c.on_signal(focus(1, "Display Name"), t0);
    c.on_signal(RawSignal::new(SignalKind::Blur, URL, ""), t0 + ms(300));
    assert!(c.poll(t0 + ms(2000)).is_empty());
}

#[test]
fn test_refocus_elsewhere_restarts_debounce() {
    let t0 = Instant::now();
    let mut c = classifier(t0);
    c.on_signal(focus(1, "Display Name"), t0);
    c.on_signal(focus(2, "Description"), t0 + ms(500));
    assert!(c.poll(t0 + ms(800)).is_empty());
    let out = c.poll(t0 + ms(1300));
    assert_eq!(intent(&out).label, "Description");
}

#[test]
fn test_navigation_cancels_pending_focus() {
    let t0 = Instant::now();
    let mut c = classifier(t0);
    c.on_signal(focus(1, "Display Name"), t0);
    c.on_signal(
        RawSignal::new(SignalKind::Navigation, "https://admin/#/connectors/2", ""),
        t0 + ms(100),
    );
    assert!(!c.has_pending_focus());
}

#[test]
fn test_same_field_within_cooldown_suppressed() {
    let t0 = Instant::now();
    let mut c = classifier(t0);
    c.on_signal(focus(1, "Display Name"), t0);
    assert_eq!(c.poll(t0 + ms(800)).len(), 1);

    // Same target, different label text.
    c.on_signal(focus(1, "Display name *"), t0 + ms(1200));
    assert!(!c.has_pending_focus());
    // Same label, different element.
    c.on_signal(focus(7, "Display Name"), t0 + ms(1700));
    assert!(!c.has_pending_focus());
}

#[test]
fn test_same_field_after_cooldown_reported_again() {
    let t0 = Instant::now();
    let mut c = classifier(t0);
    c.on_signal(focus(1, "Display Name"), t0);
    c.poll(t0 + ms(800));
    c.on_signal(focus(1, "Display Name"), t0 + ms(1800));
    assert_eq!(c.poll(t0 + ms(2600)).len(), 1);
}

#[test]
fn test_click_cooldown_after_any_intent() {
    let t0 = Instant::now();
    let mut c = classifier(t0);
    c.on_signal(focus(1, "Display Name"), t0);
    c.poll(t0 + ms(800));

    let out = c.on_signal(click(SignalKind::StepProgression, "Next", None), t0 + ms(1500));
    assert!(out.is_empty());
    let out = c.on_signal(click(SignalKind::StepProgression, "Next", None), t0 + ms(2900));
    assert_eq!(intent(&out).kind, IntentKind::StepProgression);
}

#[test]
fn test_focus_not_subject_to_general_cooldown() {
    let t0 = Instant::now();
    let mut c = classifier(t0);
    c.on_signal(click(SignalKind::StepProgression, "Next", None), t0);
    c.on_signal(focus(1, "Display Name"), t0 + ms(100));
    assert_eq!(c.poll(t0 + ms(900)).len(), 1);
}

#[test]
fn test_start_click_uses_captured_connector() {
    let t0 = Instant::now();
    let mut c = classifier(t0);
    c.on_signal(click(SignalKind::ConnectorHint, "ServiceNow", Some("ServiceNow")), t0);
    let out = c.on_signal(click(SignalKind::ConnectionStart, "Add", None), t0 + ms(200));
    let intent = intent(&out);
    assert_eq!(intent.kind, IntentKind::InitializeConnection);
    assert_eq!(intent.connector, "ServiceNow");
    assert_eq!(c.session().detected_connector(), Some("ServiceNow"));
}

#[test]
fn test_start_click_ancestor_connector_wins() {
    let t0 = Instant::now();
    let mut c = classifier(t0);
    c.on_signal(click(SignalKind::ConnectorHint, "Jira", Some("Jira")), t0);
    let out = c.on_signal(
        click(SignalKind::ConnectionStart, "Add", Some("Confluence")),
        t0 + ms(100),
    );
    assert_eq!(intent(&out).connector, "Confluence");
}

#[test]
fn test_connector_falls_back_to_title() {
    let t0 = Instant::now();
    let mut c = classifier(t0);
    let signal = RawSignal::new(SignalKind::ConnectionStart, URL, "Salesforce - Admin").with_label("Add");
    let out = c.on_signal(signal, t0);
    assert_eq!(intent(&out).connector, "Salesforce");
}

#[test]
fn test_unresolved_connector_is_empty() {
    let t0 = Instant::now();
    let mut c = classifier(t0);
    let out = c.on_signal(click(SignalKind::StepProgression, "Save", None), t0);
    let intent = intent(&out);
    assert!(intent.connector.is_empty());
    assert_eq!(intent.connector_or_unknown(), "Unknown Context");
}

#[test]
fn test_focus_connector_from_session() {
    let t0 = Instant::now();
    let mut c = classifier(t0);
    c.on_signal(scan(URL, "Jira Cloud", Some("Jira")), t0);
    c.on_signal(focus(3, "Site URL"), t0 + ms(100));
    let out = c.poll(t0 + ms(900));
    assert_eq!(intent(&out).connector, "Jira");
}

#[test]
fn test_scan_emits_context_update() {
    let t0 = Instant::now();
    let mut c = classifier(t0);
    let out = c.on_signal(scan(URL, "Add a Jira connection", Some("Jira")), t0);
    match out.as_slice() {
        [PanelMessage::ContextUpdate(update)] => {
            assert_eq!(update.page_header, "Add a Jira connection");
            assert_eq!(update.connector, "Jira");
            assert!(update.recent_intent.is_none());
        }
        other => panic!("expected context update, got {:?}", other),
    }
}

#[test]
fn test_scan_without_header_is_silent() {
    let t0 = Instant::now();
    let mut c = classifier(t0);
    assert!(c.on_signal(scan(URL, "", Some("Jira")), t0).is_empty());
    assert_eq!(c.session().detected_connector(), Some("Jira"));
}

#[test]
fn test_identical_context_not_resent() {
    let t0 = Instant::now();
    let mut c = classifier(t0);
    assert_eq!(c.on_signal(scan(URL, "Header", None), t0).len(), 1);
    assert!(c.on_signal(scan(URL, "Header", None), t0 + ms(10_000)).is_empty());
    assert_eq!(c.on_signal(scan(URL, "Other", None), t0 + ms(20_000)).len(), 1);
}

#[test]
fn test_context_update_waits_for_idle() {
    let t0 = Instant::now();
    let mut c = classifier(t0);
    c.on_signal(click(SignalKind::StepProgression, "Next", None), t0);

    assert!(c.on_signal(scan(URL, "Step 2", None), t0 + ms(1000)).is_empty());
    let out = c.on_signal(scan(URL, "Step 2", None), t0 + ms(5000));
    match out.as_slice() {
        [PanelMessage::ContextUpdate(update)] => {
            assert_eq!(update.recent_intent, Some(IntentKind::StepProgression));
        }
        other => panic!("expected context update, got {:?}", other),
    }
}

#[test]
fn test_context_update_within_intent_cooldown_suppressed() {
    let t0 = Instant::now();
    let mut c = classifier(t0);
    let first = t0 + ms(10_000);
    assert_eq!(c.on_signal(scan(URL, "Connectors", None), first).len(), 1);

    let add = "https://admin.microsoft.com/#/connectors/add";
    assert!(c.on_signal(scan(add, "Add a connection", None), first + ms(1500)).is_empty());
    let out = c.on_signal(scan(add, "Add a connection", None), first + ms(2500));
    match out.as_slice() {
        [PanelMessage::ContextUpdate(update)] => {
            assert_eq!(update.page_header, "Add a connection");
            assert_eq!(update.url, add);
        }
        other => panic!("expected context update, got {:?}", other),
    }
}

#[test]
fn test_context_update_cooldown_after_update() {
    let t0 = Instant::now();
    let mut c = classifier(t0);
    c.on_signal(click(SignalKind::StepProgression, "Next", None), t0);
    assert_eq!(c.on_signal(scan(URL, "Step 1", None), t0 + ms(5000)).len(), 1);
    // Idle since the click, but within the cooldown of the last update.
    assert!(c.on_signal(scan(URL, "Step 2", None), t0 + ms(6000)).is_empty());
    assert_eq!(c.on_signal(scan(URL, "Step 2", None), t0 + ms(7000)).len(), 1);
}

#[test]
fn test_locked_field_class_not_reported() {
    let t0 = Instant::now();
    let mut c = with_dynamic_fields(t0);
    c.on_signal(focus(9, "Graph connector agent"), t0);
    assert_eq!(c.poll(t0 + ms(800)).len(), 1);

    assert!(c.lock_field_class("connector_agent"));
    c.on_signal(focus(9, "Graph connector agent"), t0 + ms(5000));
    assert!(!c.has_pending_focus());
    assert!(c.poll(t0 + ms(6000)).is_empty());

    c.on_signal(focus(1, "Display Name"), t0 + ms(7000));
    assert_eq!(intent(&c.poll(t0 + ms(7800))).label, "Display Name");
}

#[test]
fn test_lock_drops_pending_focus_of_class() {
    let t0 = Instant::now();
    let mut c = with_dynamic_fields(t0);
    c.on_signal(focus(9, "Graph connector agent"), t0);
    assert!(c.lock_field_class("connector_agent"));
    assert!(!c.has_pending_focus());
    assert!(c.poll(t0 + ms(800)).is_empty());
}

#[test]
fn test_lock_keeps_pending_focus_of_other_fields() {
    let t0 = Instant::now();
    let mut c = with_dynamic_fields(t0);
    c.on_signal(focus(1, "Display Name"), t0);
    c.lock_field_class("connector_agent");
    assert_eq!(c.poll(t0 + ms(800)).len(), 1);
}

#[test]
fn test_relocking_is_noop() {
    let t0 = Instant::now();
    let mut c = with_dynamic_fields(t0);
    assert!(c.lock_field_class("connector_agent"));
    assert!(!c.lock_field_class("connector_agent"));
}

#[test]
fn test_lock_without_rules_drops_nothing() {
    let t0 = Instant::now();
    let mut c = classifier(t0);
    c.lock_field_class("connector_agent");
    c.on_signal(focus(9, "Graph connector agent"), t0);
    assert_eq!(c.poll(t0 + ms(800)).len(), 1);
}

#[test]
fn test_sticky_connector_across_scans() {
    let t0 = Instant::now();
    let mut c = classifier(t0);
    let detections = [Some("Jira"), None, None, Some("ServiceNow")];
    let mut resolved = Vec::new();
    for (i, detection) in detections.iter().enumerate() {
        c.on_signal(scan(URL, "", *detection), t0 + ms(i as u64 * 100));
        resolved.push(c.session().detected_connector().unwrap_or_default().to_string());
    }
    assert_eq!(resolved, vec!["Jira", "Jira", "Jira", "ServiceNow"]);
}
