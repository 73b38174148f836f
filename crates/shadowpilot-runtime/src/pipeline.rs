//! End-to-end wiring: page agent, bridge and panel agent, plus replay of
//! recorded sessions.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use shadowpilot_bridge::{channel, BridgeConfig};
use shadowpilot_config::Config;
use shadowpilot_observer::{NodeId, PageDocument, PageSnapshot};
use shadowpilot_protocols::{AdviceService, ToolService};
use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;
use tokio::time::{sleep_until, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::error::RuntimeError;
use crate::page_agent::{PageAgent, PageAgentHandle, PageEvent};
use crate::panel_agent::{PanelAction, PanelAgent, PanelAgentHandle, PanelEvent};
use crate::transcript::Transcript;

/// A recorded page session: the initial page and timed user actions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordedSession {
    pub page: PageSnapshot,
    #[serde(default)]
    pub steps: Vec<RecordedStep>,
}

impl RecordedSession {
    pub fn from_json(json: &str) -> Result<Self, RuntimeError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn load(path: &Path) -> Result<Self, RuntimeError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordedStep {
    /// Offset from the start of the replay.
    pub at_ms: u64,
    #[serde(flatten)]
    pub action: RecordedAction,
}

/// Element targets are CSS selectors resolved against the current page.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum RecordedAction {
    Render { page: PageSnapshot },
    Navigate { url: String },
    Focus { selector: String },
    Blur,
    Click { selector: String },
    /// Terminal confirmation in the panel.
    Confirm { class: String },
    /// Click on an action link in an answer, e.g. `action:open-powershell`.
    Action { link: String },
}

/// A running page/panel pair connected by the bridge.
pub struct Pipeline {
    page: PageAgentHandle,
    panel: PanelAgentHandle,
    document: PageDocument,
    page_task: JoinHandle<()>,
    panel_task: JoinHandle<Transcript>,
}

impl Pipeline {
    pub fn start(
        config: &Config,
        document: PageDocument,
        advice: Arc<dyn AdviceService>,
        authenticated: watch::Receiver<bool>,
        cancel: CancellationToken,
    ) -> Result<Self, RuntimeError> {
        Self::start_with_tools(config, document, advice, None, authenticated, cancel)
    }

    /// Like [`Pipeline::start`], with host tools behind action links.
    pub fn start_with_tools(
        config: &Config,
        document: PageDocument,
        advice: Arc<dyn AdviceService>,
        tools: Option<Arc<dyn ToolService>>,
        authenticated: watch::Receiver<bool>,
        cancel: CancellationToken,
    ) -> Result<Self, RuntimeError> {
        let (page_end, panel_end) = channel(BridgeConfig::from_timing(&config.timing));
        let (page_agent, page) = PageAgent::new(config, document.clone(), page_end, cancel.clone())?;
        let (panel_agent, panel) = PanelAgent::new(config, panel_end, advice, authenticated, cancel);
        let panel_agent = match tools {
            Some(tools) => panel_agent.with_tools(tools),
            None => panel_agent,
        };
        info!(session = %panel_agent.session_id(), url = %document.url(), "Pipeline started");

        Ok(Self {
            page,
            panel,
            document,
            page_task: tokio::spawn(page_agent.run()),
            panel_task: tokio::spawn(panel_agent.run()),
        })
    }

    pub fn subscribe(&self) -> broadcast::Receiver<PanelEvent> {
        self.panel.subscribe()
    }

    pub fn document(&self) -> &PageDocument {
        &self.document
    }

    /// Play `steps` at their recorded offsets from now.
    pub async fn replay(&mut self, steps: &[RecordedStep]) -> Result<(), RuntimeError> {
        let origin = Instant::now();
        for step in steps {
            sleep_until(origin + Duration::from_millis(step.at_ms)).await;
            debug!(at_ms = step.at_ms, action = ?step.action, "Replaying step");
            self.apply(&step.action).await?;
        }
        Ok(())
    }

    pub async fn apply(&mut self, action: &RecordedAction) -> Result<(), RuntimeError> {
        match action {
            RecordedAction::Render { page } => {
                self.document = PageDocument::from_snapshot(page.clone());
                self.page.send(PageEvent::Rendered(self.document.clone())).await
            }
            RecordedAction::Navigate { url } => {
                self.document.set_url(url.clone());
                self.page.send(PageEvent::Navigated { url: url.clone() }).await
            }
            RecordedAction::Focus { selector } => match self.resolve(selector)? {
                Some(id) => self.page.send(PageEvent::FocusIn(id)).await,
                None => Ok(()),
            },
            RecordedAction::Blur => self.page.send(PageEvent::FocusOut).await,
            RecordedAction::Click { selector } => match self.resolve(selector)? {
                Some(id) => self.page.send(PageEvent::Click(id)).await,
                None => Ok(()),
            },
            RecordedAction::Confirm { class } => self.panel.confirm(class.clone()).await,
            RecordedAction::Action { link } => match PanelAction::from_link(link) {
                Some(action) => self.panel.run_action(action).await,
                None => {
                    warn!(link = %link, "Unknown action link, skipped");
                    Ok(())
                }
            },
        }
    }

    /// Close the page side and wait for outstanding work. Returns the transcript.
    pub async fn finish(self) -> Result<Transcript, RuntimeError> {
        drop(self.page);
        self.page_task
            .await
            .map_err(|_| RuntimeError::Stopped("page"))?;
        self.panel_task
            .await
            .map_err(|_| RuntimeError::Stopped("panel"))
    }

    fn resolve(&self, selector: &str) -> Result<Option<NodeId>, RuntimeError> {
        let target = self.document.query(selector)?;
        if target.is_none() {
            warn!(selector = %selector, "Replay target not found, step skipped");
        }
        Ok(target)
    }
}
