//! Per-mode chat endpoints
//!
//! Each chat mode keeps its own transcript in the session. A new message is
//! sent upstream together with the most recent part of that transcript, and
//! both the message and the reply are appended afterwards.

use crate::conversation::{Conversation, Message};
use crate::documents::{code_review_prompt, code_review_request};
use crate::error::{AppError, AppResult};
use crate::extract::{CodeBlock, extract_code_blocks};
use crate::handlers::{ApiJson, AppState};
use crate::middleware::RequestId;
use crate::pipeline::Reply;
use crate::session::ChatMode;
use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
};
use serde::{Deserialize, Serialize};

/// Body of a new chat message
#[derive(Debug, Clone, Deserialize)]
pub struct SendMessageRequest {
    pub message: String,
    #[serde(default)]
    pub model: Option<String>,
}

/// Body of a code review request
#[derive(Debug, Clone, Deserialize)]
pub struct CodeReviewRequest {
    #[serde(default = "default_language")]
    pub language: String,
    pub code: String,
}

fn default_language() -> String {
    "javascript".to_string()
}

/// Reply returned by every pipeline-backed endpoint
///
/// `message` is the assistant turn as recorded in the transcript; the
/// remaining fields describe where the text came from.
#[derive(Debug, Clone, Serialize)]
pub struct ChatResponse {
    pub message: Message,
    #[serde(flatten)]
    pub reply: Reply,
    /// Fenced code blocks found in the reply
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub code_blocks: Vec<CodeBlock>,
}

/// A mode's transcript
#[derive(Debug, Clone, Serialize)]
pub struct TranscriptResponse {
    pub mode: ChatMode,
    pub messages: Vec<Message>,
}

pub(crate) fn parse_mode(mode: &str) -> AppResult<ChatMode> {
    mode.parse::<ChatMode>().map_err(AppError::Validation)
}

pub(crate) fn require_text<'a>(value: &'a str, field: &str) -> AppResult<&'a str> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        Err(AppError::Validation(format!("{} is required", field)))
    } else {
        Ok(trimmed)
    }
}

/// Run `prompt` through the pipeline and record `user_entry` plus the reply in `mode`
///
/// `history` is the context sent ahead of the prompt.
pub(crate) async fn converse(
    state: &AppState,
    mode: ChatMode,
    history: Conversation,
    prompt: &str,
    user_entry: String,
    model: Option<&str>,
) -> AppResult<ChatResponse> {
    let display_name = state.session().read().await.display_name().to_string();
    let config = state.completion_config(model, &display_name)?;

    let mut conversation = history;
    conversation.push(Message::user(prompt));
    let reply = state.pipeline().reply(&conversation, &config).await;

    let message = Message::assistant(reply.text.clone());
    {
        let mut session = state.session().write().await;
        session.append(mode, Message::user(user_entry));
        session.append(mode, message.clone());
    }

    Ok(ChatResponse {
        code_blocks: extract_code_blocks(&reply.text),
        message,
        reply,
    })
}

/// GET /api/modes/{mode}/messages
pub async fn list_messages(
    State(state): State<AppState>,
    Path(mode): Path<String>,
) -> AppResult<Json<TranscriptResponse>> {
    let mode = parse_mode(&mode)?;
    let messages = state
        .session()
        .read()
        .await
        .transcript(mode)
        .messages()
        .to_vec();
    Ok(Json(TranscriptResponse { mode, messages }))
}

/// POST /api/modes/{mode}/messages
pub async fn send_message(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    Path(mode): Path<String>,
    ApiJson(request): ApiJson<SendMessageRequest>,
) -> AppResult<Json<ChatResponse>> {
    let mode = parse_mode(&mode)?;
    let text = require_text(&request.message, "Message")?;

    let history = state
        .session()
        .read()
        .await
        .transcript(mode)
        .recent(state.config().completion.history_limit);

    tracing::debug!(
        request_id = %request_id,
        mode = mode.as_str(),
        context_messages = history.len(),
        "Sending chat message"
    );

    let response = converse(
        &state,
        mode,
        history,
        text,
        text.to_string(),
        request.model.as_deref(),
    )
    .await?;

    if response.reply.is_fallback() {
        tracing::info!(
            request_id = %request_id,
            mode = mode.as_str(),
            "Chat message answered by fallback responder"
        );
    }

    Ok(Json(response))
}

/// DELETE /api/modes/{mode}/messages
pub async fn clear_messages(
    State(state): State<AppState>,
    Path(mode): Path<String>,
) -> AppResult<StatusCode> {
    let mode = parse_mode(&mode)?;
    state.session().write().await.clear_transcript(mode);
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/code-review
pub async fn code_review(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<CodeReviewRequest>,
) -> AppResult<Json<ChatResponse>> {
    if request.code.trim().is_empty() {
        return Err(AppError::Validation("Code is required".to_string()));
    }
    let language = require_text(&request.language, "Language")?;

    let prompt = code_review_prompt(language, &request.code);
    let entry = code_review_request(language, &request.code);
    let response = converse(
        &state,
        ChatMode::Code,
        Conversation::new(),
        &prompt,
        entry,
        None,
    )
    .await?;

    Ok(Json(response))
}
