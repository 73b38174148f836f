//! Backend collaborator definitions.
//!
//! The backend is a stateless relay to a model provider: the panel sends
//! sanitized context and receives markdown text. Authentication status is
//! polled separately and only gates whether intents are acted on. A small
//! set of host tools (opening a PowerShell window) backs the action links
//! found in advice text.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::BackendError;

/// Outbound advice request (`POST /agent/chat`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatRequest {
    pub message: String,
    #[serde(default)]
    pub context_url: String,
    #[serde(default)]
    pub dom_snippet: String,
}

impl ChatRequest {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            context_url: String::new(),
            dom_snippet: String::new(),
        }
    }

    pub fn with_context_url(mut self, url: impl Into<String>) -> Self {
        self.context_url = url.into();
        self
    }

    pub fn with_dom_snippet(mut self, snippet: impl Into<String>) -> Self {
        self.dom_snippet = snippet.into();
        self
    }
}

/// Advice response. An empty `response` means "nothing to say about this".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatResponse {
    #[serde(default)]
    pub response: String,
}

/// Authentication status reported by the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthStatus {
    /// Login started; the device code is not available yet.
    PendingInteraction,
    /// Login call found an existing session.
    Success,
    /// A device code is available for the user.
    Present,
    Authenticated,
    Waiting,
    #[serde(other)]
    Unknown,
}

impl AuthStatus {
    pub fn is_authenticated(&self) -> bool {
        matches!(self, AuthStatus::Success | AuthStatus::Authenticated)
    }
}

/// Body of `/auth/login` and `/auth/code` responses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthStatusResponse {
    pub status: AuthStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub verification_uri: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_on: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl AuthStatusResponse {
    pub fn new(status: AuthStatus) -> Self {
        Self {
            status,
            user_code: None,
            verification_uri: None,
            expires_on: None,
            message: None,
            error: None,
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.status.is_authenticated()
    }
}

/// Body of `GET /`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    #[serde(default)]
    pub service: String,
    #[serde(default)]
    pub auth_status: String,
}

/// Body of `GET /me`: the signed-in directory user.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileResponse {
    #[serde(rename = "displayName", default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub mail: Option<String>,
    #[serde(default)]
    pub id: Option<String>,
}

impl ProfileResponse {
    /// Display name, then mail, then id.
    pub fn name(&self) -> Option<&str> {
        self.display_name
            .as_deref()
            .or(self.mail.as_deref())
            .or(self.id.as_deref())
    }
}

/// Body of `/tools/*` responses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolResponse {
    pub status: String,
    #[serde(default)]
    pub message: String,
}

impl ToolResponse {
    /// Tools report failure in the body with a 200 status.
    pub fn is_success(&self) -> bool {
        self.status == "success"
    }
}

/// Remote advice ("send sanitized context, receive text").
#[async_trait]
pub trait AdviceService: Send + Sync {
    /// Request advice. Returns the markdown text, possibly empty.
    async fn advise(&self, request: ChatRequest) -> Result<String, BackendError>;
}

/// Remote authentication status.
#[async_trait]
pub trait AuthService: Send + Sync {
    /// Start the login flow.
    async fn login(&self) -> Result<AuthStatusResponse, BackendError>;

    /// Poll the current status.
    async fn status(&self) -> Result<AuthStatusResponse, BackendError>;

    /// The signed-in user. Fails with [`BackendError::Api`] (401) until
    /// sign-in has completed.
    async fn profile(&self) -> Result<ProfileResponse, BackendError>;
}

/// Host tools triggered from action links in advice text.
#[async_trait]
pub trait ToolService: Send + Sync {
    /// Open a PowerShell window on the backend host.
    async fn open_powershell(&self) -> Result<ToolResponse, BackendError>;
}
