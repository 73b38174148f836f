//! Backend client implementation.

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use tracing::debug;
use url::Url;

use shadowpilot_config::BackendConfig;
use shadowpilot_protocols::{
    AdviceService, AuthService, AuthStatusResponse, BackendError, ChatRequest, ChatResponse,
    HealthResponse, ProfileResponse, ToolResponse, ToolService,
};

const CHAT_PATH: &str = "/agent/chat";
const LOGIN_PATH: &str = "/auth/login";
const CODE_PATH: &str = "/auth/code";
const ME_PATH: &str = "/me";
const POWERSHELL_PATH: &str = "/tools/open-powershell";

/// Talks to the local backend relay. No retries.
pub struct HttpBackendClient {
    base_url: String,
    client: reqwest::Client,
}

impl HttpBackendClient {
    pub fn new(config: &BackendConfig) -> Result<Self, BackendError> {
        let parsed = Url::parse(&config.base_url)
            .map_err(|e| BackendError::NotConfigured(format!("{}: {}", config.base_url, e)))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(BackendError::NotConfigured(format!(
                "unsupported scheme '{}'",
                parsed.scheme()
            )));
        }
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .build()
            .map_err(|e| BackendError::NotConfigured(e.to_string()))?;

        Ok(Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            client,
        })
    }

    /// Create a client for `base_url` with default settings.
    pub fn with_url(base_url: impl Into<String>) -> Result<Self, BackendError> {
        Self::new(&BackendConfig {
            base_url: base_url.into(),
            ..Default::default()
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// `GET /`.
    pub async fn health(&self) -> Result<HealthResponse, BackendError> {
        let response = self
            .client
            .get(self.endpoint("/"))
            .send()
            .await
            .map_err(|e| BackendError::Network(e.to_string()))?;
        Self::decode(response).await
    }

    /// `GET /me`. The backend answers 401 until sign-in has completed.
    pub async fn me(&self) -> Result<ProfileResponse, BackendError> {
        let response = self
            .client
            .get(self.endpoint(ME_PATH))
            .send()
            .await
            .map_err(|e| BackendError::Network(e.to_string()))?;
        Self::decode(response).await
    }

    /// `POST /tools/open-powershell`.
    pub async fn open_powershell(&self) -> Result<ToolResponse, BackendError> {
        debug!("POST {}", POWERSHELL_PATH);
        let response = self
            .client
            .post(self.endpoint(POWERSHELL_PATH))
            .send()
            .await
            .map_err(|e| BackendError::Network(e.to_string()))?;
        Self::decode(response).await
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn decode<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, BackendError> {
        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| BackendError::Network(e.to_string()))?;

        if !status.is_success() {
            return Err(BackendError::Api {
                status: status.as_u16(),
                message: body,
            });
        }

        serde_json::from_str(&body).map_err(|e| BackendError::Malformed(e.to_string()))
    }
}

#[async_trait]
impl AdviceService for HttpBackendClient {
    async fn advise(&self, request: ChatRequest) -> Result<String, BackendError> {
        debug!(
            context_url = %request.context_url,
            snippet_chars = request.dom_snippet.len(),
            "POST {}",
            CHAT_PATH
        );
        let response = self
            .client
            .post(self.endpoint(CHAT_PATH))
            .json(&request)
            .send()
            .await
            .map_err(|e| BackendError::Network(e.to_string()))?;
        let chat: ChatResponse = Self::decode(response).await?;
        Ok(chat.response)
    }
}

#[async_trait]
impl AuthService for HttpBackendClient {
    async fn login(&self) -> Result<AuthStatusResponse, BackendError> {
        let response = self
            .client
            .post(self.endpoint(LOGIN_PATH))
            .send()
            .await
            .map_err(|e| BackendError::Network(e.to_string()))?;
        Self::decode(response).await
    }

    async fn status(&self) -> Result<AuthStatusResponse, BackendError> {
        let response = self
            .client
            .get(self.endpoint(CODE_PATH))
            .send()
            .await
            .map_err(|e| BackendError::Network(e.to_string()))?;
        Self::decode(response).await
    }

    async fn profile(&self) -> Result<ProfileResponse, BackendError> {
        self.me().await
    }
}

#[async_trait]
impl ToolService for HttpBackendClient {
    async fn open_powershell(&self) -> Result<ToolResponse, BackendError> {
        HttpBackendClient::open_powershell(self).await
    }
}

#[cfg(test)]
#[path = "client_tests.rs"]
mod tests;
