//! Image generation endpoint
//!
//! Served at both `/generate-image` and `/api/generate-image`.

use crate::error::{AppError, AppResult};
use crate::handlers::{ApiJson, AppState};
use crate::image::{self, ImageSize};
use axum::{Json, extract::State};
use serde::Deserialize;
use serde_json::Value;

/// Image generation request body
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ImageRequest {
    #[serde(default)]
    pub prompt: Option<String>,
    #[serde(default)]
    pub size: Option<String>,
}

impl ImageRequest {
    /// Validated prompt and size
    pub fn validate(&self) -> AppResult<(&str, ImageSize)> {
        let prompt = self
            .prompt
            .as_deref()
            .filter(|p| !p.trim().is_empty())
            .ok_or_else(|| AppError::Validation("Prompt is required".to_string()))?;
        let size = match self.size.as_deref() {
            Some(size) => size.parse::<ImageSize>().map_err(AppError::Validation)?,
            None => ImageSize::default(),
        };
        Ok((prompt, size))
    }
}

/// POST /generate-image
///
/// Always answers 200 with an image response once the request is valid;
/// upstream failures are answered with a placeholder.
pub async fn handler(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<ImageRequest>,
) -> AppResult<Json<Value>> {
    let (prompt, size) = request.validate()?;

    let outcome = image::generate(
        state.upstream(),
        prompt,
        size,
        state.config().upstream.image_timeout(),
    )
    .await;

    if outcome.is_fallback() {
        state.metrics().record_image_fallback();
    }

    Ok(Json(outcome.into_body()))
}
