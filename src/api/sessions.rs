//! Add-plant session endpoints
//!
//! **[LFL-SES-030]** The browser drives the session state machine over HTTP:
//! create, inspect, switch to manual entry, reopen the capture stage, or
//! cancel. Identification and submission transitions happen inside the
//! identify/search/plants handlers.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{delete, get, post},
    Json, Router,
};
use uuid::Uuid;

use crate::error::{ApiError, ApiResult};
use crate::models::plant::PlantDetails;
use crate::models::session::{AddPlantSession, SessionError};
use crate::AppState;

/// POST /api/sessions
pub async fn create_session(
    State(state): State<AppState>,
) -> (StatusCode, Json<AddPlantSession>) {
    let session = AddPlantSession::new();
    tracing::info!(session_id = %session.session_id, "Add-plant session created");

    state
        .sessions
        .write()
        .await
        .insert(session.session_id, session.clone());

    (StatusCode::CREATED, Json(session))
}

/// GET /api/sessions/{id}
pub async fn get_session(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<AddPlantSession>> {
    let sessions = state.sessions.read().await;
    let session = sessions.get(&id).ok_or_else(|| unknown_session(id))?;
    Ok(Json(session.clone()))
}

/// POST /api/sessions/{id}/capture
///
/// User opened the camera/file picker again; clears the previous result.
pub async fn reopen_capture(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<AddPlantSession>> {
    let mut sessions = state.sessions.write().await;
    let session = sessions.get_mut(&id).ok_or_else(|| unknown_session(id))?;
    session.begin_capture().map_err(conflict)?;
    Ok(Json(session.clone()))
}

/// POST /api/sessions/{id}/manual
///
/// User bypassed identification; converges into the review/submit path.
pub async fn manual_entry(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<AddPlantSession>> {
    let mut sessions = state.sessions.write().await;
    let session = sessions.get_mut(&id).ok_or_else(|| unknown_session(id))?;
    session.apply_manual_entry().map_err(conflict)?;
    tracing::info!(session_id = %id, "Session switched to manual entry");
    Ok(Json(session.clone()))
}

/// DELETE /api/sessions/{id}
///
/// Cancellation: the session and its transient state are dropped.
pub async fn cancel_session(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    let removed = state.sessions.write().await.remove(&id);
    if removed.is_none() {
        return Err(unknown_session(id));
    }
    tracing::info!(session_id = %id, "Add-plant session cancelled");
    Ok(StatusCode::NO_CONTENT)
}

/// Build session routes
pub fn session_routes() -> Router<AppState> {
    Router::new()
        .route("/api/sessions", post(create_session))
        .route("/api/sessions/:id", get(get_session))
        .route("/api/sessions/:id", delete(cancel_session))
        .route("/api/sessions/:id/capture", post(reopen_capture))
        .route("/api/sessions/:id/manual", post(manual_entry))
}

fn unknown_session(id: Uuid) -> ApiError {
    ApiError::NotFound(format!("Unknown session {}", id))
}

fn conflict(err: SessionError) -> ApiError {
    ApiError::Conflict(err.to_string())
}

// ----------------------------------------------------------------------------
// Helpers shared with the identify/search/plants handlers
// ----------------------------------------------------------------------------

/// Issue an identification request token for a tracked session
pub(crate) async fn begin_session_identify(state: &AppState, id: Uuid) -> ApiResult<u64> {
    let mut sessions = state.sessions.write().await;
    let session = sessions.get_mut(&id).ok_or_else(|| unknown_session(id))?;
    session.begin_identify().map_err(conflict)
}

/// Deliver an identification outcome to a tracked session
///
/// **[LFL-SES-020]** A stale token is logged and dropped; the session keeps
/// the state of the newer request.
pub(crate) async fn complete_session_identify(
    state: &AppState,
    id: Uuid,
    token: u64,
    outcome: Result<PlantDetails, String>,
) {
    let mut sessions = state.sessions.write().await;
    let Some(session) = sessions.get_mut(&id) else {
        tracing::debug!(session_id = %id, "Identification finished for a cancelled session");
        return;
    };

    match session.complete_identify(token, outcome) {
        Ok(transition) => {
            tracing::debug!(
                session_id = %id,
                from = ?transition.old_phase,
                to = ?transition.new_phase,
                "Session phase advanced"
            );
        }
        Err(SessionError::StaleToken { token, latest }) => {
            tracing::debug!(
                session_id = %id,
                token,
                latest,
                "Discarded stale identification response"
            );
        }
        Err(err) => {
            tracing::warn!(session_id = %id, error = %err, "Session completion rejected");
        }
    }
}

/// Move a tracked session into the submitting phase
pub(crate) async fn begin_session_submit(state: &AppState, id: Uuid) -> ApiResult<()> {
    let mut sessions = state.sessions.write().await;
    let session = sessions.get_mut(&id).ok_or_else(|| unknown_session(id))?;
    session.begin_submit().map_err(conflict)?;
    Ok(())
}

/// Deliver a submission outcome to a tracked session
pub(crate) async fn complete_session_submit(
    state: &AppState,
    id: Uuid,
    outcome: Result<(), String>,
) {
    let mut sessions = state.sessions.write().await;
    if let Some(session) = sessions.get_mut(&id) {
        session.complete_submit(outcome);
    }
}
