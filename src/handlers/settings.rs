//! Settings and credential status endpoints

use crate::error::{AppError, AppResult};
use crate::handlers::{ApiJson, AppState};
use crate::session::{FeatureUpdate, PersistedState};
use axum::{Json, extract::State};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Whether the server holds an upstream credential
///
/// Only the length is reported, never the value.
#[derive(Debug, Clone, Serialize)]
pub struct CredentialStatus {
    pub has_api_key: bool,
    pub api_key_length: usize,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SettingsUpdate {
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub features: Option<FeatureUpdate>,
}

/// GET /api/credential-status
pub async fn credential_status(State(state): State<AppState>) -> Json<CredentialStatus> {
    let credential = state.upstream().credential();
    Json(CredentialStatus {
        has_api_key: credential.is_some(),
        api_key_length: credential.map_or(0, |c| c.len()),
        timestamp: Utc::now(),
    })
}

/// GET /api/settings
pub async fn get_settings(State(state): State<AppState>) -> Json<PersistedState> {
    Json(state.session().read().await.persisted())
}

/// PUT /api/settings
///
/// The update is all-or-nothing: a blank display name leaves the features
/// untouched as well.
pub async fn update_settings(
    State(state): State<AppState>,
    ApiJson(update): ApiJson<SettingsUpdate>,
) -> AppResult<Json<PersistedState>> {
    let mut session = state.session().write().await;

    if let Some(name) = update.display_name.as_deref() {
        session
            .set_display_name(name)
            .map_err(AppError::Validation)?;
    }
    if let Some(features) = update.features {
        session.update_features(features);
    }

    tracing::debug!(display_name = %session.display_name(), "Updated settings");
    Ok(Json(session.persisted()))
}
