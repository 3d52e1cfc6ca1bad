//! Chat pipeline
//!
//! Runs a completion and, when it fails for good, answers with the offline
//! fallback responder instead. Callers always get a reply.

use crate::client::{
    CompletionClient, CompletionConfig, CompletionFailure, CompletionResult, PipelineState,
};
use crate::conversation::Conversation;
use crate::fallback;
use crate::metrics::Metrics;
use serde::Serialize;
use std::sync::Arc;

/// Where a reply came from
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "source", rename_all = "snake_case")]
pub enum ReplySource {
    Upstream,
    Fallback { failure: CompletionFailure },
}

/// Text returned to the caller plus its provenance
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Reply {
    pub text: String,
    #[serde(flatten)]
    pub source: ReplySource,
    /// Personalized explanation of the failure, when the fallback answered
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notice: Option<String>,
    pub state: PipelineState,
    pub attempts: usize,
}

impl Reply {
    pub fn is_fallback(&self) -> bool {
        matches!(self.source, ReplySource::Fallback { .. })
    }
}

#[derive(Clone)]
pub struct ChatPipeline {
    client: CompletionClient,
    metrics: Option<Arc<Metrics>>,
}

impl ChatPipeline {
    pub fn new(client: CompletionClient) -> Self {
        Self {
            client,
            metrics: None,
        }
    }

    pub fn with_metrics(mut self, metrics: Arc<Metrics>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    pub fn client(&self) -> &CompletionClient {
        &self.client
    }

    /// Produce a reply for the conversation
    pub async fn reply(&self, conversation: &Conversation, config: &CompletionConfig) -> Reply {
        let (result, mut state) = self.client.complete_tracked(conversation, config).await;

        match result {
            CompletionResult::Success { text } => Reply {
                text,
                source: ReplySource::Upstream,
                notice: None,
                state: state.state(),
                attempts: state.attempt(),
            },
            CompletionResult::Failure(failure) => {
                let last = conversation.last_user_message().unwrap_or_default();
                let text = fallback::respond(last);
                state.mark_handled();
                if let Some(metrics) = &self.metrics {
                    metrics.record_fallback_reply();
                }

                tracing::info!(
                    failure_kind = failure.kind.as_str(),
                    attempts = state.attempt(),
                    "Answered with fallback reply"
                );

                Reply {
                    text,
                    notice: Some(failure.user_message(config.display_name())),
                    source: ReplySource::Fallback { failure },
                    state: state.state(),
                    attempts: state.attempt(),
                }
            }
        }
    }
}
