//! Plant record endpoints
//!
//! **[LFL-API-040]** Submission validates the minimal required fields,
//! persists the record, and returns the stored row reshaped into the
//! UI-facing summary. Persistence failure is a generic recoverable advisory;
//! nothing server-side prevents an immediate resubmission.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::db;
use crate::error::{ApiError, ApiResult};
use crate::models::plant::{PlantRecord, StoredPlantSummary};
use crate::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePlantRequest {
    #[serde(flatten)]
    pub record: PlantRecord,
    /// Add-plant session tracking this flow, if any
    #[serde(default)]
    pub session_id: Option<Uuid>,
}

/// POST /api/plants handler
pub async fn create_plant(
    State(state): State<AppState>,
    Json(payload): Json<CreatePlantRequest>,
) -> ApiResult<(StatusCode, Json<StoredPlantSummary>)> {
    // Name is the only required field; the image is optional because
    // identification is optional
    if payload.record.name.trim().is_empty() {
        return Err(ApiError::BadRequest("Plant name is required".to_string()));
    }

    if let Some(id) = payload.session_id {
        super::sessions::begin_session_submit(&state, id).await?;
    }

    match db::plants::save_plant(&state.db, &payload.record).await {
        Ok(stored) => {
            tracing::info!(plant_id = %stored.id, name = %stored.name, "Plant record saved");
            if let Some(id) = payload.session_id {
                super::sessions::complete_session_submit(&state, id, Ok(())).await;
            }
            Ok((StatusCode::CREATED, Json(stored.into_summary())))
        }
        Err(err) => {
            tracing::error!(error = %err, "Plant record save failed");
            state.record_error(err.to_string()).await;
            let advisory = "Failed to save plant. Please try again.".to_string();
            if let Some(id) = payload.session_id {
                super::sessions::complete_session_submit(&state, id, Err(advisory.clone())).await;
            }
            Err(ApiError::Internal(advisory))
        }
    }
}

/// GET /api/plants handler
pub async fn list_plants(
    State(state): State<AppState>,
) -> ApiResult<Json<Vec<StoredPlantSummary>>> {
    let plants = db::plants::list_plants(&state.db).await?;
    Ok(Json(
        plants.into_iter().map(|plant| plant.into_summary()).collect(),
    ))
}

/// GET /api/plants/{id} handler
pub async fn get_plant(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<StoredPlantSummary>> {
    let plant = db::plants::load_plant(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Unknown plant {}", id)))?;
    Ok(Json(plant.into_summary()))
}

/// POST /api/plants/{id}/watered handler
pub async fn water_plant(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<StoredPlantSummary>> {
    let plant = db::plants::mark_watered(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Unknown plant {}", id)))?;
    tracing::info!(plant_id = %id, "Watering recorded");
    Ok(Json(plant.into_summary()))
}

/// Build plant record routes
pub fn plant_routes() -> Router<AppState> {
    Router::new()
        .route("/api/plants", post(create_plant))
        .route("/api/plants", get(list_plants))
        .route("/api/plants/:id", get(get_plant))
        .route("/api/plants/:id/watered", post(water_plant))
}
