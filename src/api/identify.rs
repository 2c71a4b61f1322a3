//! Image identification endpoint
//!
//! **[LFL-API-020]** POST /api/identify: boundary-check the uploaded image,
//! call the recognition provider, normalize the response, and derive the
//! auto-fill form values. An unidentifiable photo is a soft outcome
//! (`success: false` plus advisory), not an error status.

use axum::{extract::State, routing::post, Json, Router};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{ApiError, ApiResult};
use crate::models::plant::PlantDetails;
use crate::services::care_notes::{seed_form, FormSeed};
use crate::services::image_gate;
use crate::services::normalizer;
use crate::services::recognition_client::{IdentifyError, MOCK_REASON};
use crate::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IdentifyRequest {
    /// Encoded still image as a base64 data URI
    pub image: String,
    /// Add-plant session tracking this flow, if any
    #[serde(default)]
    pub session_id: Option<Uuid>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IdentifyResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<PlantDetails>,
    /// Auto-fill values derived from the match
    #[serde(skip_serializing_if = "Option::is_none")]
    pub form: Option<FormSeed>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub advisory: Option<String>,
    #[serde(skip_serializing_if = "is_false")]
    pub is_mock: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mock_reason: Option<String>,
}

fn is_false(value: &bool) -> bool {
    !*value
}

/// POST /api/identify handler
pub async fn identify(
    State(state): State<AppState>,
    Json(payload): Json<IdentifyRequest>,
) -> ApiResult<Json<IdentifyResponse>> {
    // Boundary checks run before any network call
    let checked = image_gate::check_data_uri(&payload.image)
        .map_err(|e| ApiError::BadRequest(e.to_string()))?;

    tracing::debug!(
        media_type = %checked.media_type,
        bytes = checked.byte_len,
        "Image accepted for identification"
    );

    let token = match payload.session_id {
        Some(id) => Some((id, super::sessions::begin_session_identify(&state, id).await?)),
        None => None,
    };

    let recognition = state.recognition.read().await;
    let is_mock = recognition.is_mock();
    let outcome = match recognition.identify(&payload.image).await {
        Ok(provider_payload) => normalizer::normalize_identification(&provider_payload),
        Err(err) => Err(err),
    };
    drop(recognition);

    match outcome {
        Ok(details) => {
            tracing::info!(
                plant = %details.scientific_name,
                confidence = ?details.confidence,
                mock = is_mock,
                "Plant identified"
            );

            if let Some((id, token)) = token {
                super::sessions::complete_session_identify(&state, id, token, Ok(details.clone()))
                    .await;
            }

            let form = seed_form(&details);
            Ok(Json(IdentifyResponse {
                success: true,
                data: Some(details),
                form: Some(form),
                advisory: None,
                is_mock,
                mock_reason: is_mock.then(|| MOCK_REASON.to_string()),
            }))
        }
        Err(IdentifyError::NoMatch) => {
            let advisory = IdentifyError::NoMatch.advisory().to_string();
            if let Some((id, token)) = token {
                super::sessions::complete_session_identify(&state, id, token, Err(advisory.clone()))
                    .await;
            }

            Ok(Json(IdentifyResponse {
                success: false,
                data: None,
                form: None,
                advisory: Some(advisory),
                is_mock,
                mock_reason: is_mock.then(|| MOCK_REASON.to_string()),
            }))
        }
        Err(err) => {
            state.record_error(err.to_string()).await;
            if let Some((id, token)) = token {
                super::sessions::complete_session_identify(
                    &state,
                    id,
                    token,
                    Err(err.advisory().to_string()),
                )
                .await;
            }
            Err(ApiError::Identify(err))
        }
    }
}

/// Build identify routes
pub fn identify_routes() -> Router<AppState> {
    Router::new().route("/api/identify", post(identify))
}
