//! # ShadowPilot Protocols
//!
//! Types and traits shared by the page context, the panel context and the
//! backend collaborator. Contains only definitions - no behaviour beyond
//! validation at the boundary.
//!
//! ## Core Types
//!
//! - [`Intent`] - a classified, deduplicated user action
//! - [`PanelMessage`] - page → panel messages (`USER_INTENT`, `CONTEXT_UPDATE`)
//! - [`PageRequest`] / [`PageContent`] - panel → page `GET_PAGE_CONTENT` and `LOCK_FIELD_CLASS`
//! - [`AdviceService`] / [`AuthService`] / [`ToolService`] - the remote backend, as seen by the panel

pub mod backend;
pub mod error;
pub mod intent;
pub mod message;

pub use backend::{
    AdviceService, AuthService, AuthStatus, AuthStatusResponse, ChatRequest, ChatResponse,
    HealthResponse, ProfileResponse, ToolResponse, ToolService,
};
pub use error::{BackendError, BridgeError, ProtocolError};
pub use intent::{ContextUpdate, Intent, IntentKind, UNKNOWN_CONNECTOR};
pub use message::{PageContent, PageRequest, PanelMessage};
