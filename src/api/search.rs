//! Plant name search endpoint
//!
//! **[LFL-API-030]** GET /api/search?name= runs the text path of the
//! identification pipeline. Zero matches leaves the form untouched: the
//! response is `success: false` with the "no plants found" advisory, never
//! an error status.

use axum::{
    extract::{Query, State},
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{ApiError, ApiResult};
use crate::models::plant::PlantDetails;
use crate::services::normalizer;
use crate::services::recognition_client::{IdentifyError, MOCK_REASON};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct SearchParams {
    pub name: String,
    #[serde(default)]
    pub session_id: Option<Uuid>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResponse {
    pub success: bool,
    pub data: SearchData,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub advisory: Option<String>,
    #[serde(skip_serializing_if = "is_false")]
    pub is_mock: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mock_reason: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SearchData {
    pub suggestions: Vec<PlantDetails>,
}

fn is_false(value: &bool) -> bool {
    !*value
}

/// GET /api/search handler
pub async fn search(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> ApiResult<Json<SearchResponse>> {
    let query = params.name.trim();
    if query.is_empty() {
        return Err(ApiError::BadRequest("Search name is required".to_string()));
    }

    let token = match params.session_id {
        Some(id) => Some((id, super::sessions::begin_session_identify(&state, id).await?)),
        None => None,
    };

    let recognition = state.recognition.read().await;
    let is_mock = recognition.is_mock();
    let outcome = match recognition.search(query).await {
        Ok(provider_payload) => normalizer::normalize_search(&provider_payload),
        Err(err) => Err(err),
    };
    drop(recognition);

    match outcome {
        Ok(suggestions) => {
            tracing::info!(
                query = %query,
                matches = suggestions.len(),
                mock = is_mock,
                "Plant search finished"
            );

            // The first (highest-ranked) suggestion is canonical for the session
            if let Some((id, token)) = token {
                super::sessions::complete_session_identify(
                    &state,
                    id,
                    token,
                    Ok(suggestions[0].clone()),
                )
                .await;
            }

            Ok(Json(SearchResponse {
                success: true,
                data: SearchData { suggestions },
                advisory: None,
                is_mock,
                mock_reason: is_mock.then(|| MOCK_REASON.to_string()),
            }))
        }
        Err(IdentifyError::NoMatch) => {
            let advisory = format!(
                "No plants found matching \"{}\". Try a different name or add it manually.",
                query
            );
            if let Some((id, token)) = token {
                super::sessions::complete_session_identify(&state, id, token, Err(advisory.clone()))
                    .await;
            }

            Ok(Json(SearchResponse {
                success: false,
                data: SearchData {
                    suggestions: Vec::new(),
                },
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

/// Build search routes
pub fn search_routes() -> Router<AppState> {
    Router::new().route("/api/search", get(search))
}
