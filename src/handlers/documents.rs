//! Document upload and question endpoints
//!
//! Uploads arrive as a raw request body with the file name in the query
//! string. Validation runs before any parsing; extraction runs on the
//! blocking pool.

use crate::documents::{DocumentSummary, document_question_prompt};
use crate::error::{AppError, AppResult};
use crate::extract::{self, sanitize_file_name};
use crate::handlers::chat::{ChatResponse, converse, require_text};
use crate::handlers::{ApiJson, AppState};
use crate::middleware::RequestId;
use crate::session::ChatMode;
use axum::{
    Extension, Json,
    body::Bytes,
    extract::{Path, Query, State, rejection::BytesRejection},
    http::StatusCode,
};
use serde::Deserialize;
use uuid::Uuid;

#[derive(Debug, Clone, Deserialize)]
pub struct UploadQuery {
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AskRequest {
    pub question: String,
}

/// POST /api/documents?name=<file>
pub async fn upload(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    Query(query): Query<UploadQuery>,
    body: Result<Bytes, BytesRejection>,
) -> AppResult<(StatusCode, Json<DocumentSummary>)> {
    let name = query
        .name
        .as_deref()
        .map(str::trim)
        .filter(|n| !n.is_empty())
        .map(sanitize_file_name)
        .ok_or_else(|| AppError::Validation("File name is required".to_string()))?;
    let max_bytes = state.config().documents.max_file_bytes;

    let bytes = match body {
        Ok(bytes) => bytes,
        Err(rejection) if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE => {
            return Err(AppError::UploadRejected {
                errors: extract::validate(&name, max_bytes.saturating_add(1), max_bytes),
                name,
                too_large: true,
            });
        }
        Err(rejection) => return Err(AppError::Validation(rejection.body_text())),
    };

    let byte_size = bytes.len() as u64;
    let errors = extract::validate(&name, byte_size, max_bytes);
    if !errors.is_empty() {
        tracing::info!(
            request_id = %request_id,
            name = %name,
            byte_size,
            errors = ?errors,
            "Rejected upload"
        );
        return Err(AppError::UploadRejected {
            too_large: byte_size > max_bytes,
            name,
            errors,
        });
    }

    let extract_name = name.clone();
    let document = tokio::task::spawn_blocking(move || extract::extract(&extract_name, &bytes))
        .await
        .map_err(|e| AppError::Internal(format!("Extraction task failed: {}", e)))?
        .map_err(|source| {
            tracing::warn!(
                request_id = %request_id,
                name = %name,
                error = %source,
                "Document extraction failed"
            );
            AppError::Extraction {
                name: name.clone(),
                source,
            }
        })?;

    if let Err(e) = state.metrics().record_document(document.category) {
        tracing::warn!(error = %e, "Failed to record document metric");
    }
    tracing::info!(
        request_id = %request_id,
        name = %document.name,
        category = document.category.as_str(),
        byte_size,
        "Stored document"
    );

    let summary = state.session().write().await.documents_mut().insert(document);
    Ok((StatusCode::CREATED, Json(summary)))
}

/// GET /api/documents
pub async fn list(State(state): State<AppState>) -> Json<Vec<DocumentSummary>> {
    Json(state.session().read().await.documents().summaries())
}

/// DELETE /api/documents/{id}
pub async fn remove(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<StatusCode> {
    state
        .session()
        .write()
        .await
        .documents_mut()
        .remove(id)
        .map(|_| StatusCode::NO_CONTENT)
        .ok_or_else(|| AppError::NotFound(format!("Document {} not found", id)))
}

/// POST /api/documents/{id}/ask
pub async fn ask(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    ApiJson(request): ApiJson<AskRequest>,
) -> AppResult<Json<ChatResponse>> {
    let question = require_text(&request.question, "Question")?;

    let document = state
        .session()
        .read()
        .await
        .documents()
        .get(id)
        .cloned()
        .ok_or_else(|| AppError::NotFound(format!("Document {} not found", id)))?;

    let prompt = document_question_prompt(&document, question);
    let response = converse(
        &state,
        ChatMode::Document,
        Default::default(),
        &prompt,
        question.to_string(),
        None,
    )
    .await?;

    Ok(Json(response))
}
