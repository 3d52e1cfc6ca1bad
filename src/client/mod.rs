//! Completion client
//!
//! Sends a framed conversation upstream, retries rate-limited attempts with
//! exponential backoff, and classifies whatever failure remains.

pub mod failure;
pub mod retry;
pub mod transport;

use crate::conversation::Conversation;
use crate::metrics::{Metrics, Outcome};
use crate::router::ModelRequest;
use chrono::NaiveDate;
use std::sync::Arc;
use std::time::{Duration, Instant};

pub use failure::{CompletionFailure, CompletionResult, FailureKind};
pub use retry::{PipelineState, RetryPolicy, RetryState};
pub use transport::{ChatRequestBody, CompletionTransport, Credential, TransportError, UpstreamClient};

/// Per-call settings for a completion
#[derive(Debug, Clone)]
pub struct CompletionConfig {
    model: ModelRequest,
    display_name: String,
    timeout: Duration,
    today: NaiveDate,
}

impl CompletionConfig {
    pub fn new(model: ModelRequest, display_name: impl Into<String>, timeout: Duration) -> Self {
        Self {
            model,
            display_name: display_name.into(),
            timeout,
            today: chrono::Local::now().date_naive(),
        }
    }

    /// Override the date placed in the system prompt
    pub fn with_date(mut self, today: NaiveDate) -> Self {
        self.today = today;
        self
    }

    pub fn model(&self) -> &ModelRequest {
        &self.model
    }

    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}

/// Completion client over any [`CompletionTransport`]
#[derive(Clone)]
pub struct CompletionClient {
    transport: Arc<dyn CompletionTransport>,
    policy: RetryPolicy,
    metrics: Option<Arc<Metrics>>,
}

impl CompletionClient {
    pub fn new(transport: Arc<dyn CompletionTransport>, policy: RetryPolicy) -> Self {
        Self {
            transport,
            policy,
            metrics: None,
        }
    }

    pub fn with_metrics(mut self, metrics: Arc<Metrics>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Run one completion call and return its outcome
    pub async fn complete(
        &self,
        conversation: &Conversation,
        config: &CompletionConfig,
    ) -> CompletionResult {
        self.complete_tracked(conversation, config).await.0
    }

    /// Like [`complete`](Self::complete), also returning the final retry state
    pub async fn complete_tracked(
        &self,
        conversation: &Conversation,
        config: &CompletionConfig,
    ) -> (CompletionResult, RetryState) {
        let started = Instant::now();
        let mut state = RetryState::new();

        if !conversation.has_user_message() {
            state.fail();
            let failure = CompletionFailure::new(
                FailureKind::Other,
                None,
                "conversation must contain at least one user message",
            );
            self.record(Outcome::Failure(failure.kind), started);
            return (CompletionResult::Failure(failure), state);
        }

        let framed = conversation.framed(config.display_name(), config.today);
        let body = ChatRequestBody::new(config.model(), &framed);
        let max_attempts = self.policy.max_attempts();
        let mut last_error = None;

        for _ in 0..max_attempts {
            let attempt = state.begin_attempt();
            if let Some(metrics) = &self.metrics {
                metrics.record_attempt();
            }

            tracing::debug!(
                attempt = attempt,
                max_attempts = max_attempts,
                model = %body.model,
                message_count = body.messages.len(),
                "Sending completion attempt"
            );

            match self.transport.send(&body, config.timeout()).await {
                Ok(text) => {
                    state.succeed();
                    tracing::info!(
                        attempt = attempt,
                        response_length = text.len(),
                        "Completion succeeded"
                    );
                    self.record(Outcome::Success, started);
                    return (CompletionResult::Success { text }, state);
                }
                Err(error) => {
                    tracing::warn!(
                        attempt = attempt,
                        max_attempts = max_attempts,
                        failure_kind = error.failure_kind().as_str(),
                        error = %error,
                        "Completion attempt failed"
                    );

                    if error.is_retryable() && attempt < max_attempts {
                        let backoff = self.policy.backoff(attempt);
                        tracing::info!(
                            attempt = attempt,
                            backoff_ms = backoff.as_millis() as u64,
                            "Rate limited, retrying after backoff"
                        );
                        state.record_backoff(backoff);
                        tokio::time::sleep(backoff).await;
                        last_error = Some(error);
                        continue;
                    }

                    last_error = Some(error);
                    break;
                }
            }
        }

        state.fail();
        let failure = match &last_error {
            Some(error) => CompletionFailure::from(error),
            None => CompletionFailure::new(FailureKind::Other, None, "no attempts were made"),
        };
        tracing::error!(
            attempts = state.attempt(),
            failure_kind = failure.kind.as_str(),
            http_status = ?failure.http_status,
            "Completion failed"
        );
        self.record(Outcome::Failure(failure.kind), started);
        (CompletionResult::Failure(failure), state)
    }

    fn record(&self, outcome: Outcome, started: Instant) {
        let Some(metrics) = &self.metrics else {
            return;
        };
        if let Err(e) = metrics.record_result(outcome) {
            tracing::error!(error = %e, outcome = outcome.as_str(), "Failed to record completion result");
        }
        let elapsed_ms = started.elapsed().as_secs_f64() * 1000.0;
        if let Err(e) = metrics.record_duration(outcome, elapsed_ms) {
            tracing::error!(error = %e, outcome = outcome.as_str(), "Failed to record completion duration");
        }
    }
}
