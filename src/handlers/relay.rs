//! Chat completions relay
//!
//! Forwards a client's completion request to the upstream with the server's
//! credential attached. Messages pass through untouched; only the model name
//! is remapped and missing sampling parameters are filled from config.

use crate::client::TransportError;
use crate::client::transport::{CHAT_COMPLETIONS_PATH, upstream_error_message};
use crate::config::CompletionDefaults;
use crate::error::{AppError, AppResult};
use crate::handlers::{ApiJson, AppState};
use crate::metrics::Outcome;
use crate::middleware::RequestId;
use crate::router::ModelRequest;
use axum::{
    Extension, Json,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use serde_json::{Value, json};

/// Relay request body
///
/// Mirrors the upstream chat completions shape.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RelayRequest {
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub messages: Vec<Value>,
    #[serde(default)]
    pub temperature: Option<f64>,
    #[serde(default)]
    pub max_tokens: Option<u32>,
}

impl RelayRequest {
    /// Upstream payload with the model resolved and defaults applied
    pub fn to_upstream_body(&self, defaults: &CompletionDefaults) -> AppResult<Value> {
        let model = ModelRequest::new(
            self.model.as_deref().or(Some(defaults.model.as_str())),
            self.temperature.unwrap_or(defaults.temperature),
            self.max_tokens.unwrap_or(defaults.max_tokens),
        )
        .map_err(|e| AppError::Validation(e.to_string()))?;

        if model.requested_model() != model.resolved_model() {
            tracing::debug!(
                requested_model = %model.requested_model(),
                resolved_model = %model.resolved_model(),
                "Remapped model for upstream"
            );
        }

        Ok(json!({
            "model": model.resolved_model(),
            "messages": self.messages,
            "temperature": model.temperature(),
            "max_tokens": model.max_tokens(),
        }))
    }
}

/// POST /api/chat
pub async fn handler(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    ApiJson(request): ApiJson<RelayRequest>,
) -> AppResult<Response> {
    let upstream = state.upstream();
    if !upstream.has_credential() {
        tracing::error!(request_id = %request_id, "Relay called without an API key configured");
        return Err(AppError::MissingCredential);
    }

    let body = request.to_upstream_body(&state.config().completion)?;
    tracing::info!(
        request_id = %request_id,
        model = %body["model"],
        message_count = request.messages.len(),
        "Relaying chat completion"
    );

    let metrics = state.metrics();
    metrics.record_attempt();

    let result = upstream
        .post_json(
            CHAT_COMPLETIONS_PATH,
            &body,
            state.config().upstream.chat_timeout(),
        )
        .await;

    match result {
        Ok(response) if response.is_success() => {
            record_outcome(&state, Outcome::Success);
            let status = StatusCode::from_u16(response.status).unwrap_or(StatusCode::OK);
            Ok((status, Json(response.body)).into_response())
        }
        Ok(response) => {
            let error = TransportError::Status {
                status: response.status,
                message: upstream_error_message(response.status, &response.body),
                body: response.body,
            };
            tracing::warn!(
                request_id = %request_id,
                status = response.status,
                kind = error.failure_kind().as_str(),
                "Upstream rejected relayed request"
            );
            record_outcome(&state, Outcome::Failure(error.failure_kind()));
            Err(error.into())
        }
        Err(error) => {
            tracing::warn!(
                request_id = %request_id,
                error = %error,
                kind = error.failure_kind().as_str(),
                "Relayed request failed"
            );
            record_outcome(&state, Outcome::Failure(error.failure_kind()));
            Err(error.into())
        }
    }
}

fn record_outcome(state: &AppState, outcome: Outcome) {
    if let Err(e) = state.metrics().record_result(outcome) {
        tracing::warn!(error = %e, outcome = outcome.as_str(), "Failed to record relay outcome");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_fill_missing_parameters() {
        let request: RelayRequest = serde_json::from_value(json!({
            "messages": [{"role": "user", "content": "hi"}]
        }))
        .unwrap();
        let body = request
            .to_upstream_body(&CompletionDefaults::default())
            .unwrap();
        assert_eq!(body["model"], "gpt-4o-mini");
        assert_eq!(body["temperature"], 0.7);
        assert_eq!(body["max_tokens"], 1024);
        assert_eq!(body["messages"][0]["content"], "hi");
    }

    #[test]
    fn test_aspirational_model_is_remapped() {
        let request = RelayRequest {
            model: Some("o1-preview".to_string()),
            temperature: Some(0.0),
            max_tokens: Some(50),
            ..Default::default()
        };
        let body = request
            .to_upstream_body(&CompletionDefaults::default())
            .unwrap();
        assert_eq!(body["model"], "gpt-4o-mini");
        assert_eq!(body["temperature"], 0.0);
        assert_eq!(body["max_tokens"], 50);
    }

    #[test]
    fn test_messages_pass_through_verbatim() {
        let messages = json!([
            {"role": "system", "content": "be brief", "name": "setup"},
            {"role": "user", "content": "hello"}
        ]);
        let request: RelayRequest =
            serde_json::from_value(json!({ "model": "gpt-3.5-turbo", "messages": messages }))
                .unwrap();
        let body = request
            .to_upstream_body(&CompletionDefaults::default())
            .unwrap();
        assert_eq!(body["messages"], messages);
        assert_eq!(body["model"], "gpt-3.5-turbo");
    }

    #[test]
    fn test_out_of_range_temperature_is_rejected() {
        let request = RelayRequest {
            temperature: Some(3.5),
            ..Default::default()
        };
        let err = request
            .to_upstream_body(&CompletionDefaults::default())
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }
}
