//! Settings API endpoint
//!
//! Provides POST /api/settings/provider_api_key so the recognition provider
//! key can be configured from the Web UI.
//!
//! **Behavior:**
//! 1. Validate key (non-empty, non-whitespace)
//! 2. Write to database (authoritative)
//! 3. Sync to TOML (best-effort backup)
//! 4. Swap the live recognition client, leaving mock mode

use axum::{extract::State, routing::post, Json, Router};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::{ApiError, ApiResult};
use crate::services::recognition_client::RecognitionClient;
use crate::AppState;

/// Request payload for setting the provider API key
#[derive(Debug, Deserialize)]
pub struct SetApiKeyRequest {
    pub api_key: String,
}

/// Response payload for API key configuration
#[derive(Debug, Serialize)]
pub struct SetApiKeyResponse {
    pub success: bool,
    pub message: String,
}

/// POST /api/settings/provider_api_key handler
///
/// **Errors:**
/// - 400 Bad Request: empty or whitespace-only key
/// - 500 Internal Server Error: database write failure
///
/// TOML write failures log warnings but do not fail the request.
pub async fn set_provider_api_key(
    State(state): State<AppState>,
    Json(payload): Json<SetApiKeyRequest>,
) -> ApiResult<Json<SetApiKeyResponse>> {
    if !crate::config::is_valid_key(&payload.api_key) {
        return Err(ApiError::BadRequest(
            "API key cannot be empty or whitespace-only".to_string(),
        ));
    }

    // Write to database (authoritative)
    crate::db::settings::set_provider_api_key(&state.db, payload.api_key.clone())
        .await
        .map_err(|e| ApiError::Internal(format!("Failed to save API key to database: {}", e)))?;

    info!("Provider API key configured via Web UI");

    // Sync to TOML (best-effort backup)
    let toml_path = crate::config::config_file_path();
    if let Err(e) = crate::config::sync_key_to_toml(&payload.api_key, &toml_path) {
        warn!("TOML sync failed (database write succeeded): {}", e);
    }

    // Swap the live client so the new key takes effect immediately
    match RecognitionClient::new(Some(payload.api_key)) {
        Ok(client) => {
            *state.recognition.write().await = client;
            info!("Recognition client now using the configured key");
        }
        Err(e) => {
            warn!("Recognition client rebuild failed; restart to apply key: {}", e);
        }
    }

    Ok(Json(SetApiKeyResponse {
        success: true,
        message: "Provider API key configured successfully".to_string(),
    }))
}

/// Build settings routes
pub fn settings_routes() -> Router<AppState> {
    Router::new().route("/api/settings/provider_api_key", post(set_provider_api_key))
}
