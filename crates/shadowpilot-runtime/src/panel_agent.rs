//! Panel context actor.
//!
//! Receives intents from the page, decides per intent whether to reuse an
//! earlier answer or ask the backend, and keeps the transcript. Backend
//! calls run on spawned tasks; their completions are folded back into the
//! actor loop so all state stays on one task.

use std::fmt;
use std::sync::Arc;

use serde::Serialize;
use shadowpilot_bridge::{ContentRequester, Envelope, PanelEndpoint};
use shadowpilot_config::Config;
use shadowpilot_intent::{AdviceRouter, AdviceTicket, MessageId, RouteDecision, SessionContext};
use shadowpilot_protocols::{
    AdviceService, BackendError, ChatRequest, ContextUpdate, Intent, IntentKind, PanelMessage,
    ToolService,
};
use tokio::sync::{broadcast, mpsc, watch};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::compose::{compose_context, compose_intent};
use crate::error::RuntimeError;
use crate::transcript::{Role, Transcript};

const COMMAND_QUEUE: usize = 16;
const EVENT_BUFFER: usize = 256;

const ACTION_SCHEME: &str = "action:";

/// Host actions linked from advice text as `[label](action:<name>)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PanelAction {
    OpenPowerShell,
}

impl PanelAction {
    /// Parse a link target such as `action:open-powershell`.
    pub fn from_link(href: &str) -> Option<Self> {
        match href.trim().strip_prefix(ACTION_SCHEME)? {
            "open-powershell" => Some(PanelAction::OpenPowerShell),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            PanelAction::OpenPowerShell => "open-powershell",
        }
    }
}

impl fmt::Display for PanelAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// User actions taken in the panel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PanelCommand {
    /// Terminal confirmation of a dynamic field class.
    Confirm(String),
    /// An action link in an answer was clicked.
    RunAction(PanelAction),
}

/// What the panel shows, for whoever renders it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum PanelEvent {
    MessageAppended {
        id: MessageId,
        role: Role,
        text: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        intent: Option<IntentKind>,
    },
    /// Scroll to and highlight an existing message.
    Highlight { id: MessageId },
    Notice { text: String },
}

/// Sends commands to a running [`PanelAgent`] and subscribes to its events.
#[derive(Debug, Clone)]
pub struct PanelAgentHandle {
    commands: mpsc::Sender<PanelCommand>,
    events: broadcast::Sender<PanelEvent>,
}

impl PanelAgentHandle {
    pub async fn confirm(&self, class: impl Into<String>) -> Result<(), RuntimeError> {
        self.commands
            .send(PanelCommand::Confirm(class.into()))
            .await
            .map_err(|_| RuntimeError::Stopped("panel"))
    }

    pub async fn run_action(&self, action: PanelAction) -> Result<(), RuntimeError> {
        self.commands
            .send(PanelCommand::RunAction(action))
            .await
            .map_err(|_| RuntimeError::Stopped("panel"))
    }

    pub fn subscribe(&self) -> broadcast::Receiver<PanelEvent> {
        self.events.subscribe()
    }
}

/// Result of one spawned backend call.
struct Completion {
    ticket: AdviceTicket,
    kind: IntentKind,
    result: Result<String, BackendError>,
}

pub struct PanelAgent {
    session_id: Uuid,
    session: SessionContext,
    router: AdviceRouter,
    transcript: Transcript,
    advice: Arc<dyn AdviceService>,
    tools: Option<Arc<dyn ToolService>>,
    requester: ContentRequester,
    messages: mpsc::Receiver<Envelope>,
    commands: mpsc::Receiver<PanelCommand>,
    events: broadcast::Sender<PanelEvent>,
    authenticated: watch::Receiver<bool>,
    completions_tx: mpsc::UnboundedSender<Completion>,
    completions_rx: mpsc::UnboundedReceiver<Completion>,
    pending: usize,
    cancel: CancellationToken,
}

impl PanelAgent {
    pub fn new(
        config: &Config,
        endpoint: PanelEndpoint,
        advice: Arc<dyn AdviceService>,
        authenticated: watch::Receiver<bool>,
        cancel: CancellationToken,
    ) -> (Self, PanelAgentHandle) {
        let (messages, requester) = endpoint.split();
        let (commands_tx, commands) = mpsc::channel(COMMAND_QUEUE);
        let (events, _) = broadcast::channel(EVENT_BUFFER);
        let (completions_tx, completions_rx) = mpsc::unbounded_channel();

        let handle = PanelAgentHandle {
            commands: commands_tx,
            events: events.clone(),
        };
        let agent = Self {
            session_id: Uuid::new_v4(),
            session: SessionContext::new(config.observer.connector_context_markers.clone()),
            router: AdviceRouter::new(config.panel.dynamic_fields.clone()),
            transcript: Transcript::new(),
            advice,
            tools: None,
            requester,
            messages,
            commands,
            events,
            authenticated,
            completions_tx,
            completions_rx,
            pending: 0,
            cancel,
        };
        (agent, handle)
    }

    /// Back action links with host tools. Without them, actions only
    /// produce a notice.
    pub fn with_tools(mut self, tools: Arc<dyn ToolService>) -> Self {
        self.tools = Some(tools);
        self
    }

    pub fn session_id(&self) -> Uuid {
        self.session_id
    }

    /// Run until cancelled, or until the page is gone and every backend
    /// call has completed. Returns the transcript.
    pub async fn run(mut self) -> Transcript {
        info!(session = %self.session_id, "Panel agent started");
        let mut page_open = true;
        let mut commands_open = true;
        let mut auth_open = true;

        loop {
            if !page_open && self.pending == 0 {
                break;
            }

            tokio::select! {
                _ = self.cancel.cancelled() => {
                    debug!("Panel agent cancelled");
                    break;
                }
                envelope = self.messages.recv(), if page_open => match envelope {
                    Some(envelope) => match envelope.acknowledge() {
                        Ok(message) => self.on_message(message),
                        Err(e) => warn!("Rejected message from page: {}", e),
                    },
                    None => page_open = false,
                },
                command = self.commands.recv(), if commands_open => match command {
                    Some(command) => self.on_command(command),
                    None => commands_open = false,
                },
                changed = self.authenticated.changed(), if auth_open => match changed {
                    Ok(()) => self.on_auth_changed(),
                    Err(_) => auth_open = false,
                },
                Some(completion) = self.completions_rx.recv() => self.on_completion(completion),
            }
        }

        info!(
            session = %self.session_id,
            entries = self.transcript.len(),
            "Panel agent stopped"
        );
        self.transcript
    }

    fn on_message(&mut self, message: PanelMessage) {
        match message {
            PanelMessage::ContextUpdate(update) => {
                self.session.mirror(&update.url, &update.connector);
                if self.is_authenticated() {
                    self.on_context(update);
                } else {
                    debug!(header = %update.page_header, "Not signed in, context update ignored");
                }
            }
            PanelMessage::UserIntent(intent) => {
                self.session.observe_detection(Some(&intent.connector));
                if self.is_authenticated() {
                    self.on_intent(intent);
                } else {
                    debug!(kind = %intent.kind, "Not signed in, intent ignored");
                }
            }
        }
    }

    fn on_context(&mut self, update: ContextUpdate) {
        let ticket = AdviceTicket {
            key: None,
            dynamic_class: None,
        };
        let message = compose_context(&update);
        self.ask(ticket, IntentKind::ContextUpdate, message);
    }

    fn on_intent(&mut self, intent: Intent) {
        match self.router.route(&self.session, &intent) {
            RouteDecision::Reuse(id) => {
                if self.transcript.highlight(id) {
                    self.emit(PanelEvent::Highlight { id });
                }
            }
            RouteDecision::Ignore(reason) => {
                debug!(label = %intent.label, reason = ?reason, "Intent ignored");
            }
            RouteDecision::Ask(ticket) => {
                let message = compose_intent(&intent);
                self.ask(ticket, intent.kind, message);
            }
        }
    }

    fn on_command(&mut self, command: PanelCommand) {
        match command {
            PanelCommand::Confirm(class) => {
                if self.session.confirm(&class) {
                    info!(class = %class, "Dynamic field confirmed");
                    self.emit(PanelEvent::Notice {
                        text: format!("'{}' confirmed", class),
                    });
                    self.lock_on_page(class);
                }
            }
            PanelCommand::RunAction(action) => self.run_action(action),
        }
    }

    /// Run a host tool off the actor task and report the outcome as a notice.
    fn run_action(&self, action: PanelAction) {
        let Some(tools) = self.tools.clone() else {
            warn!(action = %action, "No host tools, action ignored");
            self.emit(PanelEvent::Notice {
                text: format!("'{}' is not available", action),
            });
            return;
        };
        info!(action = %action, "Running action");
        let events = self.events.clone();
        tokio::spawn(async move {
            let outcome = match action {
                PanelAction::OpenPowerShell => tools.open_powershell().await,
            };
            let text = match outcome {
                Ok(response) if response.is_success() && !response.message.is_empty() => {
                    response.message
                }
                Ok(response) if response.is_success() => format!("'{}' done", action),
                Ok(response) => format!("'{}' failed: {}", action, response.message),
                Err(e) => {
                    error!(action = %action, "Action failed: {}", e);
                    format!("'{}' failed: {}", action, e)
                }
            };
            let _ = events.send(PanelEvent::Notice { text });
        });
    }

    /// Forward a confirmation so the page stops reporting the class.
    fn lock_on_page(&self, class: String) {
        let requester = self.requester.clone();
        tokio::spawn(async move {
            if let Err(e) = requester.lock_field_class(&class).await {
                warn!(class = %class, "Could not lock field class on page: {}", e);
            }
        });
    }

    fn on_auth_changed(&mut self) {
        let text = if self.is_authenticated() {
            "Signed in"
        } else {
            "Signed out, guidance paused"
        };
        info!("{}", text);
        self.emit(PanelEvent::Notice {
            text: text.to_string(),
        });
    }

    /// Fetch the page snippet and call the backend off the actor task.
    fn ask(&mut self, ticket: AdviceTicket, kind: IntentKind, message: String) {
        self.pending += 1;
        let advice = Arc::clone(&self.advice);
        let requester = self.requester.clone();
        let completions = self.completions_tx.clone();
        let fallback_url = self.session.current_url().to_string();
        let session_id = self.session_id;

        tokio::spawn(async move {
            let content = requester.fetch_page_content().await;
            let context_url = if content.url.is_empty() {
                fallback_url
            } else {
                content.url
            };
            debug!(
                session = %session_id,
                kind = %kind,
                snippet_chars = content.html.len(),
                "Requesting advice"
            );
            let request = ChatRequest::new(message)
                .with_context_url(context_url)
                .with_dom_snippet(content.html);
            let result = advice.advise(request).await;
            let _ = completions.send(Completion {
                ticket,
                kind,
                result,
            });
        });
    }

    fn on_completion(&mut self, completion: Completion) {
        self.pending = self.pending.saturating_sub(1);
        self.router.complete(&completion.ticket);

        match completion.result {
            Ok(text) if text.trim().is_empty() => {
                debug!(kind = %completion.kind, "Backend had nothing to add");
            }
            Ok(text) => {
                let id = self
                    .transcript
                    .append(Role::Assistant, text.clone(), Some(completion.kind));
                if completion.ticket.is_cacheable() {
                    if let Some(key) = completion.ticket.key {
                        self.session.history_insert(key, id);
                    }
                }
                self.emit(PanelEvent::MessageAppended {
                    id,
                    role: Role::Assistant,
                    text,
                    intent: Some(completion.kind),
                });
            }
            Err(e) => {
                error!(kind = %completion.kind, "Advice request failed: {}", e);
                let text = format!("Could not get guidance: {}", e);
                let id = self
                    .transcript
                    .append(Role::System, text.clone(), Some(completion.kind));
                self.emit(PanelEvent::MessageAppended {
                    id,
                    role: Role::System,
                    text,
                    intent: Some(completion.kind),
                });
            }
        }
    }

    fn is_authenticated(&self) -> bool {
        *self.authenticated.borrow()
    }

    fn emit(&self, event: PanelEvent) {
        // No subscribers is fine.
        let _ = self.events.send(event);
    }
}

#[cfg(test)]
#[path = "panel_agent_tests.rs"]
mod tests;
