//! HTTP transport to the OpenAI-compatible upstream
//!
//! [`CompletionTransport`] is the seam between the retry loop and the
//! network. [`UpstreamClient`] is the reqwest-backed implementation; tests
//! substitute scripted transports.

use crate::client::failure::{CompletionFailure, FailureKind};
use crate::conversation::{Message, Role};
use crate::error::{AppError, AppResult};
use crate::router::ModelRequest;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::time::Duration;
use thiserror::Error;

/// Path of the chat completions endpoint, relative to the base URL
pub const CHAT_COMPLETIONS_PATH: &str = "chat/completions";
/// Path of the image generation endpoint, relative to the base URL
pub const IMAGE_GENERATIONS_PATH: &str = "images/generations";

/// Bearer credential for the upstream API
///
/// The secret never appears in `Debug` output.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential(String);

impl Credential {
    /// Wrap a secret, rejecting blank values
    pub fn new(secret: impl Into<String>) -> Option<Self> {
        let secret = secret.into();
        let trimmed = secret.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(Self(trimmed.to_string()))
        }
    }

    /// Read the credential from the named environment variable
    pub fn from_env(var: &str) -> Option<Self> {
        std::env::var(var).ok().and_then(Self::new)
    }

    pub fn expose(&self) -> &str {
        &self.0
    }

    /// Length of the secret, safe to report to clients
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Credential(<redacted {} chars>)", self.0.len())
    }
}

/// Transport-level failure talking to the upstream
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TransportError {
    #[error("No API credential configured")]
    MissingCredential,

    #[error("Could not connect to {endpoint}: {reason}")]
    Connect { endpoint: String, reason: String },

    #[error("Request to {endpoint} timed out after {timeout_seconds} seconds")]
    Timeout {
        endpoint: String,
        timeout_seconds: u64,
    },

    #[error("Upstream returned HTTP {status}: {message}")]
    Status {
        status: u16,
        message: String,
        body: Value,
    },

    #[error("Invalid response format")]
    InvalidResponse(String),

    #[error("Request failed: {0}")]
    Request(String),
}

impl TransportError {
    /// Failure class for this error
    pub fn failure_kind(&self) -> FailureKind {
        match self {
            TransportError::MissingCredential => FailureKind::AuthFailure,
            TransportError::Connect { .. } => FailureKind::NetworkUnreachable,
            TransportError::Status { status, .. } => FailureKind::from_status(*status),
            TransportError::Timeout { .. }
            | TransportError::InvalidResponse(_)
            | TransportError::Request(_) => FailureKind::Other,
        }
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            TransportError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Only rate limiting is worth another attempt
    pub fn is_retryable(&self) -> bool {
        self.failure_kind() == FailureKind::RateLimited
    }
}

impl From<&TransportError> for CompletionFailure {
    fn from(error: &TransportError) -> Self {
        let message = match error {
            TransportError::Status { message, .. } => message.clone(),
            other => other.to_string(),
        };
        CompletionFailure::new(error.failure_kind(), error.status(), message)
    }
}

/// Message as it appears on the wire (no timestamp)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WireMessage {
    pub role: Role,
    pub content: String,
}

impl From<&Message> for WireMessage {
    fn from(message: &Message) -> Self {
        Self {
            role: message.role,
            content: message.content.clone(),
        }
    }
}

/// Body of a chat completions request
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChatRequestBody {
    pub model: String,
    pub messages: Vec<WireMessage>,
    pub temperature: f64,
    pub max_tokens: u32,
}

impl ChatRequestBody {
    pub fn new(request: &ModelRequest, messages: &[Message]) -> Self {
        Self {
            model: request.resolved_model().to_string(),
            messages: messages.iter().map(WireMessage::from).collect(),
            temperature: request.temperature(),
            max_tokens: request.max_tokens(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct ChatResponseBody {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

/// Pull `choices[0].message.content` out of a completions response
pub fn parse_completion_text(body: &Value) -> Result<String, TransportError> {
    let parsed: ChatResponseBody = serde_json::from_value(body.clone())
        .map_err(|e| TransportError::InvalidResponse(e.to_string()))?;
    parsed
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message.content)
        .ok_or_else(|| {
            TransportError::InvalidResponse("response has no choices[0].message.content".into())
        })
}

/// Best human-readable message in an upstream error body
pub fn upstream_error_message(status: u16, body: &Value) -> String {
    body.get("error")
        .and_then(|e| e.get("message").or(Some(e)))
        .and_then(Value::as_str)
        .map(str::to_string)
        .or_else(|| body.as_str().filter(|s| !s.is_empty()).map(str::to_string))
        .unwrap_or_else(|| {
            reqwest::StatusCode::from_u16(status)
                .ok()
                .and_then(|s| s.canonical_reason())
                .unwrap_or("Unknown error")
                .to_string()
        })
}

/// Sends one chat completion attempt
#[async_trait]
pub trait CompletionTransport: Send + Sync {
    /// Send the request once and return the completion text
    async fn send(
        &self,
        body: &ChatRequestBody,
        timeout: Duration,
    ) -> Result<String, TransportError>;
}

/// Raw upstream response, status included
#[derive(Debug, Clone, PartialEq)]
pub struct UpstreamResponse {
    pub status: u16,
    pub body: Value,
}

impl UpstreamResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// reqwest client bound to one upstream base URL
#[derive(Clone)]
pub struct UpstreamClient {
    http: reqwest::Client,
    base_url: String,
    credential: Option<Credential>,
}

impl fmt::Debug for UpstreamClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UpstreamClient")
            .field("base_url", &self.base_url)
            .field("credential", &self.credential)
            .finish()
    }
}

impl UpstreamClient {
    pub fn new(base_url: impl Into<String>, credential: Option<Credential>) -> AppResult<Self> {
        let http = reqwest::Client::builder()
            .build()
            .map_err(|e| AppError::Internal(format!("Failed to create HTTP client: {}", e)))?;
        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            credential,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn credential(&self) -> Option<&Credential> {
        self.credential.as_ref()
    }

    pub fn has_credential(&self) -> bool {
        self.credential.is_some()
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    /// POST a JSON body and return whatever the upstream answered
    ///
    /// Non-2xx statuses are returned as responses, not errors. Errors are
    /// reserved for transport failures and a missing credential.
    pub async fn post_json(
        &self,
        path: &str,
        body: &Value,
        timeout: Duration,
    ) -> Result<UpstreamResponse, TransportError> {
        let credential = self
            .credential
            .as_ref()
            .ok_or(TransportError::MissingCredential)?;
        let url = self.url(path);

        tracing::debug!(url = %url, timeout_seconds = timeout.as_secs(), "Sending upstream request");

        let exchange = async {
            let response = self
                .http
                .post(&url)
                .bearer_auth(credential.expose())
                .json(body)
                .send()
                .await?;
            let status = response.status();
            let text = response.text().await?;
            Ok::<_, reqwest::Error>((status, text))
        };

        let (status, text) = match tokio::time::timeout(timeout, exchange).await {
            Ok(Ok(pair)) => pair,
            Ok(Err(e)) => return Err(classify_reqwest_error(&url, timeout, e)),
            Err(_) => {
                return Err(TransportError::Timeout {
                    endpoint: url,
                    timeout_seconds: timeout.as_secs(),
                });
            }
        };

        let body = serde_json::from_str(&text).unwrap_or(Value::String(text));
        Ok(UpstreamResponse {
            status: status.as_u16(),
            body,
        })
    }
}

fn classify_reqwest_error(url: &str, timeout: Duration, error: reqwest::Error) -> TransportError {
    if error.is_timeout() {
        TransportError::Timeout {
            endpoint: url.to_string(),
            timeout_seconds: timeout.as_secs(),
        }
    } else if error.is_connect() {
        TransportError::Connect {
            endpoint: url.to_string(),
            reason: error.to_string(),
        }
    } else {
        TransportError::Request(error.to_string())
    }
}

#[async_trait]
impl CompletionTransport for UpstreamClient {
    async fn send(
        &self,
        body: &ChatRequestBody,
        timeout: Duration,
    ) -> Result<String, TransportError> {
        let payload = serde_json::to_value(body)
            .map_err(|e| TransportError::Request(format!("Failed to encode request: {}", e)))?;
        let response = self
            .post_json(CHAT_COMPLETIONS_PATH, &payload, timeout)
            .await?;

        if !response.is_success() {
            return Err(TransportError::Status {
                status: response.status,
                message: upstream_error_message(response.status, &response.body),
                body: response.body,
            });
        }

        parse_completion_text(&response.body)
    }
}
