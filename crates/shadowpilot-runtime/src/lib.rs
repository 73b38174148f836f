//! # ShadowPilot Runtime
//!
//! The two execution contexts and their wiring.
//!
//! - [`PageAgent`] owns the page model, the observer and the intent
//!   classifier, and answers `GET_PAGE_CONTENT`.
//! - [`PanelAgent`] owns the panel session, the advice router and the
//!   transcript, and talks to the backend.
//! - [`AuthMonitor`] publishes the signed-in flag the panel gates on.
//! - [`Pipeline`] connects a page and a panel over the bridge and replays
//!   [`RecordedSession`]s.

mod auth;
mod compose;
mod error;
mod page_agent;
mod panel_agent;
mod pipeline;
mod transcript;

pub use auth::{fixed_auth, AuthMonitor};
pub use compose::{compose_context, compose_intent};
pub use error::RuntimeError;
pub use page_agent::{PageAgent, PageAgentHandle, PageEvent};
pub use panel_agent::{PanelAction, PanelAgent, PanelAgentHandle, PanelCommand, PanelEvent};
pub use pipeline::{Pipeline, RecordedAction, RecordedSession, RecordedStep};
pub use transcript::{Role, Transcript, TranscriptEntry};
