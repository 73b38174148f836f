//! # ShadowPilot Bridge
//!
//! Typed channels between the page context and the panel context.
//!
//! - Page → panel: [`PanelMessage`]s, delivered at most once, in order,
//!   without re-filtering. They cross as wire JSON and are validated when
//!   the panel opens the [`Envelope`]. [`PageSender::send_with_ack`]
//!   additionally hands back a [`PendingAck`] for the panel's receipt.
//! - Panel → page: `GET_PAGE_CONTENT`, answered with [`PageContent`], and
//!   `LOCK_FIELD_CLASS` notices. [`ContentRequester::request_page_content`]
//!   is bounded by a timeout and resolves to an empty string on timeout,
//!   closed channel or absent responder. A reply arriving after the timeout
//!   goes nowhere.

use std::time::Duration;

use shadowpilot_config::TimingConfig;
use shadowpilot_protocols::{BridgeError, PageContent, PageRequest, PanelMessage, ProtocolError};
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, warn};

/// Bridge configuration.
#[derive(Debug, Clone)]
pub struct BridgeConfig {
    /// Queue depth in each direction.
    pub capacity: usize,
    /// Bound on a page content request.
    pub request_timeout: Duration,
    /// How long a [`PendingAck`] waits for the panel.
    pub ack_timeout: Duration,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            capacity: 64,
            request_timeout: Duration::from_millis(2000),
            ack_timeout: Duration::from_millis(1000),
        }
    }
}

impl BridgeConfig {
    pub fn from_timing(timing: &TimingConfig) -> Self {
        Self {
            request_timeout: timing.snippet_timeout(),
            ..Default::default()
        }
    }
}

/// A wire-encoded page → panel message with an optional acknowledgment handle.
#[derive(Debug)]
pub struct Envelope {
    raw: String,
    ack: Option<oneshot::Sender<()>>,
}

impl Envelope {
    pub fn wants_ack(&self) -> bool {
        self.ack.is_some()
    }

    /// The message as it crossed the bridge.
    pub fn raw(&self) -> &str {
        &self.raw
    }

    /// Acknowledge receipt, then parse and validate the message. The
    /// acknowledgment is a no-op when the sender did not ask for one or
    /// stopped waiting.
    pub fn acknowledge(mut self) -> Result<PanelMessage, ProtocolError> {
        if let Some(ack) = self.ack.take() {
            let _ = ack.send(());
        }
        PanelMessage::from_json(&self.raw)
    }
}

/// Receipt of a message sent with [`PageSender::send_with_ack`].
#[derive(Debug)]
pub struct PendingAck {
    rx: oneshot::Receiver<()>,
    timeout: Duration,
}

impl PendingAck {
    /// Wait for the panel's acknowledgment, up to the configured timeout.
    pub async fn wait(self) -> Result<(), BridgeError> {
        match tokio::time::timeout(self.timeout, self.rx).await {
            Ok(Ok(())) => Ok(()),
            Ok(Err(_)) => Err(BridgeError::AckDropped),
            Err(_) => Err(BridgeError::Timeout(self.timeout.as_millis() as u64)),
        }
    }
}

/// Panel → page traffic.
#[derive(Debug)]
pub enum PanelRequest {
    /// `GET_PAGE_CONTENT`, expecting an answer.
    Content(ContentRequest),
    /// A request that expects no answer, such as `LOCK_FIELD_CLASS`.
    Notice(PageRequest),
}

/// A `GET_PAGE_CONTENT` request awaiting the page's answer.
#[derive(Debug)]
pub struct ContentRequest {
    reply: oneshot::Sender<PageContent>,
}

impl ContentRequest {
    /// Answer the request. Returns `false` when the requester already gave up.
    pub fn respond(self, content: PageContent) -> bool {
        let delivered = self.reply.send(content).is_ok();
        if !delivered {
            debug!("Page content reply arrived after the requester gave up");
        }
        delivered
    }

    pub fn is_abandoned(&self) -> bool {
        self.reply.is_closed()
    }
}

/// Create a connected pair of endpoints.
pub fn channel(config: BridgeConfig) -> (PageEndpoint, PanelEndpoint) {
    let capacity = config.capacity.max(1);
    let (message_tx, message_rx) = mpsc::channel(capacity);
    let (request_tx, request_rx) = mpsc::channel(capacity);

    let page = PageEndpoint {
        sender: PageSender {
            tx: message_tx,
            ack_timeout: config.ack_timeout,
        },
        requests: request_rx,
    };
    let panel = PanelEndpoint {
        messages: message_rx,
        requester: ContentRequester {
            tx: request_tx,
            timeout: config.request_timeout,
        },
    };
    (page, panel)
}

/// The page context's end of the bridge.
#[derive(Debug)]
pub struct PageEndpoint {
    sender: PageSender,
    requests: mpsc::Receiver<PanelRequest>,
}

impl PageEndpoint {
    pub fn sender(&self) -> &PageSender {
        &self.sender
    }

    /// Next request from the panel. `None` once the panel is gone.
    pub async fn next_request(&mut self) -> Option<PanelRequest> {
        self.requests.recv().await
    }

    /// Split into the sending half and the request stream, for select loops.
    pub fn split(self) -> (PageSender, mpsc::Receiver<PanelRequest>) {
        (self.sender, self.requests)
    }
}

/// Sends page → panel messages.
#[derive(Debug, Clone)]
pub struct PageSender {
    tx: mpsc::Sender<Envelope>,
    ack_timeout: Duration,
}

impl PageSender {
    /// Deliver a message at most once, without waiting for the panel.
    pub async fn dispatch(&self, message: PanelMessage) -> Result<(), BridgeError> {
        self.enqueue(&message, None).await
    }

    /// Deliver a message and return a handle on the panel's acknowledgment.
    /// The message is queued, in order, before this returns.
    pub async fn send_with_ack(&self, message: PanelMessage) -> Result<PendingAck, BridgeError> {
        let (ack_tx, ack_rx) = oneshot::channel();
        self.enqueue(&message, Some(ack_tx)).await?;
        Ok(PendingAck {
            rx: ack_rx,
            timeout: self.ack_timeout,
        })
    }

    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }

    async fn enqueue(
        &self,
        message: &PanelMessage,
        ack: Option<oneshot::Sender<()>>,
    ) -> Result<(), BridgeError> {
        let raw = message.to_json()?;
        self.tx
            .send(Envelope { raw, ack })
            .await
            .map_err(|_| BridgeError::ChannelClosed)?;
        debug!(message = message.type_name(), "Dispatched to panel");
        Ok(())
    }
}

/// The panel context's end of the bridge.
#[derive(Debug)]
pub struct PanelEndpoint {
    messages: mpsc::Receiver<Envelope>,
    requester: ContentRequester,
}

impl PanelEndpoint {
    /// Next message from the page. `None` once the page is gone.
    pub async fn recv(&mut self) -> Option<Envelope> {
        self.messages.recv().await
    }

    pub fn requester(&self) -> ContentRequester {
        self.requester.clone()
    }

    pub async fn request_page_content(&self) -> String {
        self.requester.request_page_content().await
    }

    /// Split into the message stream and the requester, for select loops.
    pub fn split(self) -> (mpsc::Receiver<Envelope>, ContentRequester) {
        (self.messages, self.requester)
    }
}

/// Issues bounded `GET_PAGE_CONTENT` requests and page notices. Cheap to clone.
#[derive(Debug, Clone)]
pub struct ContentRequester {
    tx: mpsc::Sender<PanelRequest>,
    timeout: Duration,
}

impl ContentRequester {
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// The page's current snippet, or `""` when it cannot be had in time.
    pub async fn request_page_content(&self) -> String {
        self.fetch_page_content().await.html
    }

    /// Full page content, or [`PageContent::empty`] when it cannot be had in time.
    pub async fn fetch_page_content(&self) -> PageContent {
        match self.try_request_page_content().await {
            Ok(content) => content,
            Err(e) => {
                warn!("Page content unavailable: {}", e);
                PageContent::empty()
            }
        }
    }

    /// Like [`ContentRequester::request_page_content`], reporting why it failed.
    pub async fn try_request_page_content(&self) -> Result<PageContent, BridgeError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        let request = PanelRequest::Content(ContentRequest { reply: reply_tx });
        let timeout_ms = self.timeout.as_millis() as u64;

        let exchange = async {
            self.tx
                .send(request)
                .await
                .map_err(|_| BridgeError::ChannelClosed)?;
            reply_rx.await.map_err(|_| BridgeError::ChannelClosed)
        };

        tokio::time::timeout(self.timeout, exchange)
            .await
            .map_err(|_| BridgeError::Timeout(timeout_ms))?
    }

    /// Tell the page to stop reporting fields of a confirmed dynamic class.
    pub async fn lock_field_class(&self, class: &str) -> Result<(), BridgeError> {
        self.tx
            .send(PanelRequest::Notice(PageRequest::LockFieldClass {
                class: class.to_string(),
            }))
            .await
            .map_err(|_| BridgeError::ChannelClosed)?;
        debug!(class = %class, "Field class lock sent to page");
        Ok(())
    }
}

#[cfg(test)]
#[path = "lib_tests.rs"]
mod tests;
