//! Completion outcomes and the failure taxonomy
//!
//! Every failure class renders as a personalized message instead of a raw
//! status code.

use serde::{Deserialize, Serialize};

/// Classified reason a completion call did not succeed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    NetworkUnreachable,
    AuthFailure,
    RateLimited,
    ServerError,
    NotFound,
    Other,
}

impl FailureKind {
    /// Label used in logs and metrics
    pub fn as_str(&self) -> &'static str {
        match self {
            FailureKind::NetworkUnreachable => "network_unreachable",
            FailureKind::AuthFailure => "auth_failure",
            FailureKind::RateLimited => "rate_limited",
            FailureKind::ServerError => "server_error",
            FailureKind::NotFound => "not_found",
            FailureKind::Other => "other",
        }
    }

    /// Classify an upstream HTTP status
    pub fn from_status(status: u16) -> Self {
        match status {
            401 => FailureKind::AuthFailure,
            404 => FailureKind::NotFound,
            429 => FailureKind::RateLimited,
            500..=599 => FailureKind::ServerError,
            _ => FailureKind::Other,
        }
    }

    /// User-facing message for this failure class
    ///
    /// `detail` is only shown for [`FailureKind::Other`].
    pub fn user_message(&self, display_name: &str, detail: &str) -> String {
        match self {
            FailureKind::NetworkUnreachable => format!(
                "Hi {}! I'm having trouble connecting to the AI service right now. \
                The API endpoint might not be available.",
                display_name
            ),
            FailureKind::AuthFailure => format!(
                "Hi {}! There's an authentication issue with the AI service. \
                Please check the API key configuration.",
                display_name
            ),
            FailureKind::RateLimited => format!(
                "Hi {}! The AI service is currently rate-limited. I've tried multiple times. \
                Please try again in a few minutes.",
                display_name
            ),
            FailureKind::ServerError => format!(
                "Hi {}! The AI service is experiencing server issues. Please try again later.",
                display_name
            ),
            FailureKind::NotFound => format!(
                "Hi {}! The AI service endpoint was not found. This might be a deployment issue.",
                display_name
            ),
            FailureKind::Other => format!(
                "Hi {}! I'm having trouble processing your request right now. Error: {}",
                display_name, detail
            ),
        }
    }
}

/// A classified failed completion
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompletionFailure {
    pub kind: FailureKind,
    pub http_status: Option<u16>,
    pub message: String,
}

impl CompletionFailure {
    pub fn new(kind: FailureKind, http_status: Option<u16>, message: impl Into<String>) -> Self {
        Self {
            kind,
            http_status,
            message: message.into(),
        }
    }

    /// Personalized message for the caller
    pub fn user_message(&self, display_name: &str) -> String {
        self.kind.user_message(display_name, &self.message)
    }
}

/// Outcome of a completion call
#[derive(Debug, Clone, PartialEq)]
pub enum CompletionResult {
    Success { text: String },
    Failure(CompletionFailure),
}

impl CompletionResult {
    pub fn is_success(&self) -> bool {
        matches!(self, CompletionResult::Success { .. })
    }

    /// Completion text, if the call succeeded
    pub fn text(&self) -> Option<&str> {
        match self {
            CompletionResult::Success { text } => Some(text),
            CompletionResult::Failure(_) => None,
        }
    }

    pub fn failure(&self) -> Option<&CompletionFailure> {
        match self {
            CompletionResult::Success { .. } => None,
            CompletionResult::Failure(failure) => Some(failure),
        }
    }
}
