//! Chat history archive endpoints

use crate::error::{AppError, AppResult};
use crate::handlers::AppState;
use crate::session::{ChatMode, ChatRecord};
use axum::{
    Json,
    extract::{Query, State},
    http::StatusCode,
};
use serde::Deserialize;

const NOTHING_TO_ARCHIVE: &str =
    "No messages to save. Start a conversation in any chat section first!";

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ArchiveQuery {
    /// Mode to archive; the first non-empty mode when absent
    #[serde(default)]
    pub mode: Option<String>,
}

/// GET /api/history
pub async fn list(State(state): State<AppState>) -> Json<Vec<ChatRecord>> {
    Json(state.session().read().await.history().to_vec())
}

/// POST /api/history?mode=<mode>
pub async fn archive(
    State(state): State<AppState>,
    Query(query): Query<ArchiveQuery>,
) -> AppResult<(StatusCode, Json<ChatRecord>)> {
    let mode = query
        .mode
        .as_deref()
        .map(str::parse::<ChatMode>)
        .transpose()
        .map_err(AppError::Validation)?;

    let record = state
        .session()
        .write()
        .await
        .archive(mode)
        .ok_or_else(|| AppError::Validation(NOTHING_TO_ARCHIVE.to_string()))?;

    tracing::info!(
        mode = record.mode.as_str(),
        message_count = record.message_count,
        "Archived chat"
    );
    Ok((StatusCode::CREATED, Json(record)))
}

/// DELETE /api/history
pub async fn clear(State(state): State<AppState>) -> StatusCode {
    state.session().write().await.clear_history();
    StatusCode::NO_CONTENT
}
