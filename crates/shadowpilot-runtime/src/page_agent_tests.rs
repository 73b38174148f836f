use super::*;
use shadowpilot_bridge::{channel, BridgeConfig, PanelEndpoint};
use shadowpilot_observer::ElementSpec;
use shadowpilot_protocols::IntentKind;

const URL: &str = "https://admin.microsoft.com/#/connectors/add";

fn form_page(url: &str) -> PageDocument {
    PageDocument::new(
        url,
        "Connectors - Microsoft 365 admin center",
        ElementSpec::new("body").child(ElementSpec::new("main").children([
            ElementSpec::new("h1").text("Add a Jira connection"),
            ElementSpec::new("label").attr("for", "name").text("Display Name"),
            ElementSpec::new("input").attr("id", "name").attr("value", "HR wiki"),
            ElementSpec::new("input")
                .attr("id", "agent")
                .attr("aria-label", "Graph connector agent"),
            ElementSpec::new("button").attr("id", "next").text("Next"),
        ])),
    )
}

/// The name field and the Next button.
fn targets() -> (NodeId, NodeId) {
    let doc = form_page(URL);
    (doc.find_by_id("name").unwrap(), doc.find_by_id("next").unwrap())
}

fn start(document: PageDocument) -> (PageAgentHandle, PanelEndpoint, CancellationToken, tokio::task::JoinHandle<()>) {
    let (page, panel) = channel(BridgeConfig::default());
    let cancel = CancellationToken::new();
    let (agent, handle) = PageAgent::new(&Config::default(), document, page, cancel.clone()).unwrap();
    let task = tokio::spawn(agent.run());
    (handle, panel, cancel, task)
}

async fn drain(mut panel: PanelEndpoint) -> Vec<PanelMessage> {
    let mut messages = Vec::new();
    while let Some(envelope) = panel.recv().await {
        messages.push(envelope.acknowledge().unwrap());
    }
    messages
}

#[tokio::test(start_paused = true)]
async fn test_focus_dispatched_after_debounce() {
    let (handle, mut panel, _cancel, _task) = start(form_page(URL));
    let (field, _) = targets();
    handle.send(PageEvent::FocusIn(field)).await.unwrap();

    let started = Instant::now();
    let envelope = panel.recv().await.unwrap();
    assert!(started.elapsed() >= Duration::from_millis(800));
    assert!(envelope.wants_ack());
    match envelope.acknowledge().unwrap() {
        PanelMessage::UserIntent(intent) => {
            assert_eq!(intent.kind, IntentKind::FieldFocus);
            assert_eq!(intent.label, "Display Name");
            assert_eq!(intent.value, "HR wiki");
            assert_eq!(intent.connector, "Jira");
        }
        other => panic!("unexpected {:?}", other),
    }
}

#[tokio::test(start_paused = true)]
async fn test_rapid_refocus_yields_one_intent() {
    let (handle, panel, _cancel, task) = start(form_page(URL));
    let (field, _) = targets();
    handle.send(PageEvent::FocusIn(field)).await.unwrap();
    handle.send(PageEvent::FocusOut).await.unwrap();
    handle.send(PageEvent::FocusIn(field)).await.unwrap();
    tokio::time::sleep(Duration::from_millis(900)).await;
    handle.send(PageEvent::FocusIn(field)).await.unwrap();

    drop(handle);
    task.await.unwrap();
    let messages = drain(panel).await;
    assert_eq!(messages.len(), 1, "{:?}", messages);
}

#[tokio::test(start_paused = true)]
async fn test_focus_on_non_field_acts_as_blur() {
    let (handle, panel, _cancel, task) = start(form_page(URL));
    let (field, next) = targets();
    handle.send(PageEvent::FocusIn(field)).await.unwrap();
    handle.send(PageEvent::FocusIn(next)).await.unwrap();

    drop(handle);
    task.await.unwrap();
    let messages = drain(panel).await;
    // Only the settle scan's context update remains.
    assert!(messages
        .iter()
        .all(|m| matches!(m, PanelMessage::ContextUpdate(_))));
}

#[tokio::test(start_paused = true)]
async fn test_settle_scan_sends_context_update() {
    let (handle, mut panel, _cancel, _task) = start(form_page(URL));

    let envelope = panel.recv().await.unwrap();
    assert!(!envelope.wants_ack());
    match envelope.acknowledge().unwrap() {
        PanelMessage::ContextUpdate(update) => {
            assert_eq!(update.url, URL);
            assert_eq!(update.page_header, "Add a Jira connection");
            assert_eq!(update.connector, "Jira");
        }
        other => panic!("unexpected {:?}", other),
    }

    // Past the general intent cooldown of the first update.
    tokio::time::sleep(Duration::from_millis(2000)).await;
    let next = format!("{}/step2", URL);
    handle
        .send(PageEvent::Navigated { url: next.clone() })
        .await
        .unwrap();
    match panel.recv().await.unwrap().acknowledge().unwrap() {
        PanelMessage::ContextUpdate(update) => assert_eq!(update.url, next),
        other => panic!("unexpected {:?}", other),
    }
}

#[tokio::test(start_paused = true)]
async fn test_locked_field_class_not_dispatched() {
    let (handle, panel, _cancel, task) = start(form_page(URL));
    let doc = form_page(URL);
    let agent = doc.find_by_id("agent").unwrap();
    let (field, _) = targets();

    panel.requester().lock_field_class("connector_agent").await.unwrap();
    tokio::time::sleep(Duration::from_millis(100)).await;
    handle.send(PageEvent::FocusIn(agent)).await.unwrap();
    tokio::time::sleep(Duration::from_millis(1000)).await;
    handle.send(PageEvent::FocusIn(field)).await.unwrap();
    tokio::time::sleep(Duration::from_millis(1000)).await;

    drop(handle);
    task.await.unwrap();
    let labels: Vec<_> = drain(panel)
        .await
        .into_iter()
        .filter_map(|m| match m {
            PanelMessage::UserIntent(intent) => Some(intent.label),
            _ => None,
        })
        .collect();
    assert_eq!(labels, vec!["Display Name".to_string()]);
}

#[tokio::test(start_paused = true)]
async fn test_page_content_request_answered() {
    let (_handle, panel, _cancel, _task) = start(form_page(URL));
    let content = panel.requester().fetch_page_content().await;
    assert_eq!(content.url, URL);
    assert!(content.html.contains("Display Name"));
    assert!(content.html.starts_with("<main"));
}

#[tokio::test(start_paused = true)]
async fn test_closed_panel_does_not_stop_agent() {
    let (handle, panel, cancel, task) = start(form_page(URL));
    let (field, next) = targets();
    drop(panel);
    handle.send(PageEvent::FocusIn(field)).await.unwrap();
    tokio::time::sleep(Duration::from_millis(2000)).await;
    handle.send(PageEvent::Click(next)).await.unwrap();

    cancel.cancel();
    task.await.unwrap();
    assert!(handle.send(PageEvent::FocusOut).await.is_err());
}
