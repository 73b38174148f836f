//! Page context actor.
//!
//! Owns the document, the observer and the classifier. DOM events arrive as
//! [`PageEvent`]s; the focus debounce and the settle scan are deadlines kept
//! in actor state and awaited in the select loop.

use std::time::Duration;

use shadowpilot_bridge::{ContentRequest, PageEndpoint, PageSender, PanelRequest};
use shadowpilot_config::Config;
use shadowpilot_intent::IntentClassifier;
use shadowpilot_observer::{NodeId, PageDocument, PageObserver, RawSignal};
use shadowpilot_protocols::{PageContent, PageRequest, PanelMessage};
use tokio::sync::mpsc;
use tokio::time::{sleep_until, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::error::RuntimeError;

const EVENT_QUEUE: usize = 64;

/// Something that happened in the page.
#[derive(Debug, Clone)]
pub enum PageEvent {
    /// The element tree was replaced.
    Rendered(PageDocument),
    /// Client-side route change; the tree stays.
    Navigated { url: String },
    FocusIn(NodeId),
    FocusOut,
    Click(NodeId),
}

/// Feeds events to a running [`PageAgent`].
#[derive(Debug, Clone)]
pub struct PageAgentHandle {
    tx: mpsc::Sender<PageEvent>,
}

impl PageAgentHandle {
    pub async fn send(&self, event: PageEvent) -> Result<(), RuntimeError> {
        self.tx
            .send(event)
            .await
            .map_err(|_| RuntimeError::Stopped("page"))
    }
}

pub struct PageAgent {
    document: PageDocument,
    observer: PageObserver,
    classifier: IntentClassifier,
    settle_delay: Duration,
    settle_at: Option<Instant>,
    sender: PageSender,
    requests: mpsc::Receiver<PanelRequest>,
    events: mpsc::Receiver<PageEvent>,
    cancel: CancellationToken,
}

impl PageAgent {
    pub fn new(
        config: &Config,
        document: PageDocument,
        endpoint: PageEndpoint,
        cancel: CancellationToken,
    ) -> Result<(Self, PageAgentHandle), RuntimeError> {
        let observer = PageObserver::new(config.observer.clone())?;
        let classifier = IntentClassifier::new(&config.timing, &config.observer, Instant::now())
            .with_dynamic_fields(config.panel.dynamic_fields.clone());
        let (sender, requests) = endpoint.split();
        let (tx, events) = mpsc::channel(EVENT_QUEUE);

        let agent = Self {
            document,
            observer,
            classifier,
            settle_delay: config.timing.settle_delay(),
            settle_at: None,
            sender,
            requests,
            events,
            cancel,
        };
        Ok((agent, PageAgentHandle { tx }))
    }

    /// Run until cancelled, or until every handle is dropped and the
    /// pending timers have fired.
    pub async fn run(mut self) {
        info!(url = %self.document.url(), "Page agent started");
        self.schedule_settle();
        let mut events_open = true;
        let mut requests_open = true;

        loop {
            let focus_deadline = self.classifier.next_deadline();
            let settle_deadline = self.settle_at;
            if !events_open && focus_deadline.is_none() && settle_deadline.is_none() {
                break;
            }

            tokio::select! {
                _ = self.cancel.cancelled() => {
                    debug!("Page agent cancelled");
                    break;
                }
                event = self.events.recv(), if events_open => match event {
                    Some(event) => self.on_event(event).await,
                    None => events_open = false,
                },
                request = self.requests.recv(), if requests_open => match request {
                    Some(request) => self.on_request(request),
                    None => requests_open = false,
                },
                _ = sleep_until(focus_deadline.unwrap_or_else(Instant::now)), if focus_deadline.is_some() => {
                    let messages = self.classifier.poll(Instant::now());
                    self.dispatch(messages).await;
                }
                _ = sleep_until(settle_deadline.unwrap_or_else(Instant::now)), if settle_deadline.is_some() => {
                    self.settle_at = None;
                    let signal = self.observer.scan(&self.document);
                    self.feed(signal).await;
                }
            }
        }
        info!("Page agent stopped");
    }

    async fn on_event(&mut self, event: PageEvent) {
        match event {
            PageEvent::Rendered(document) => {
                let navigated = document.url() != self.document.url();
                self.document = document;
                if navigated {
                    self.on_navigation().await;
                } else {
                    self.schedule_settle();
                }
            }
            PageEvent::Navigated { url } => {
                if url != self.document.url() {
                    self.document.set_url(url);
                    self.on_navigation().await;
                }
            }
            PageEvent::FocusIn(id) => {
                let signal = self
                    .observer
                    .focus_signal(&self.document, id)
                    .unwrap_or_else(|| self.observer.blur_signal(&self.document));
                self.feed(signal).await;
            }
            PageEvent::FocusOut => {
                let signal = self.observer.blur_signal(&self.document);
                self.feed(signal).await;
            }
            PageEvent::Click(id) => {
                if let Some(signal) = self.observer.click_signal(&self.document, id) {
                    self.feed(signal).await;
                }
            }
        }
    }

    async fn on_navigation(&mut self) {
        debug!(url = %self.document.url(), "Page navigated");
        let signal = self.observer.navigation_signal(&self.document);
        self.feed(signal).await;
        self.schedule_settle();
    }

    fn schedule_settle(&mut self) {
        self.settle_at = Some(Instant::now() + self.settle_delay);
    }

    fn on_request(&mut self, request: PanelRequest) {
        match request {
            PanelRequest::Content(request) => self.answer(request),
            PanelRequest::Notice(PageRequest::LockFieldClass { class }) => {
                self.classifier.lock_field_class(&class);
            }
            PanelRequest::Notice(PageRequest::GetPageContent) => {
                debug!("Page content notice has no reply slot, ignored");
            }
        }
    }

    fn answer(&self, request: ContentRequest) {
        let html = self.observer.extract_snippet(&self.document);
        let content = PageContent::new(html).with_url(self.document.url());
        request.respond(content);
    }

    async fn feed(&mut self, signal: RawSignal) {
        let messages = self.classifier.on_signal(signal, Instant::now());
        self.dispatch(messages).await;
    }

    /// Intents ask the panel for an acknowledgment, awaited off the loop.
    async fn dispatch(&mut self, messages: Vec<PanelMessage>) {
        for message in messages {
            let type_name = message.type_name();
            let sent = match message {
                PanelMessage::UserIntent(_) => self
                    .sender
                    .send_with_ack(message)
                    .await
                    .map(|pending| {
                        tokio::spawn(async move {
                            if let Err(e) = pending.wait().await {
                                debug!("USER_INTENT not acknowledged: {}", e);
                            }
                        });
                    }),
                PanelMessage::ContextUpdate(_) => self.sender.dispatch(message).await,
            };
            if let Err(e) = sent {
                warn!("Failed to dispatch {} to panel: {}", type_name, e);
            }
        }
    }
}

#[cfg(test)]
#[path = "page_agent_tests.rs"]
mod tests;
