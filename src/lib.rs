//! Leafling library interface
//!
//! **[LFL-OV-010]** Backend for a consumer plant-care web app: identify a
//! plant from a photo or name via a third-party recognition provider,
//! normalize the provider's schema-unstable response, derive auto-fill form
//! values, and persist submitted plant records to SQLite.

pub mod api;
pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod services;

pub use crate::error::{ApiError, ApiResult, Error, Result};

use axum::Router;
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use uuid::Uuid;

use crate::models::session::AddPlantSession;
use crate::services::recognition_client::RecognitionClient;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool
    pub db: SqlitePool,
    /// Recognition provider client; swapped when the key is reconfigured
    pub recognition: Arc<RwLock<RecognitionClient>>,
    /// Active add-plant sessions **[LFL-SES-010]**
    pub sessions: Arc<RwLock<HashMap<Uuid, AddPlantSession>>>,
    /// Service startup timestamp for uptime tracking
    pub startup_time: DateTime<Utc>,
    /// Last error for diagnostic purposes
    pub last_error: Arc<RwLock<Option<String>>>,
}

impl AppState {
    pub fn new(db: SqlitePool, recognition: RecognitionClient) -> Self {
        Self {
            db,
            recognition: Arc::new(RwLock::new(recognition)),
            sessions: Arc::new(RwLock::new(HashMap::new())),
            startup_time: Utc::now(),
            last_error: Arc::new(RwLock::new(None)),
        }
    }

    /// Remember the most recent failure for the health endpoint
    pub async fn record_error(&self, message: String) {
        *self.last_error.write().await = Some(message);
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .merge(api::health_routes())
        .merge(api::identify_routes())
        .merge(api::search_routes())
        .merge(api::plant_routes())
        .merge(api::session_routes())
        .merge(api::settings_routes())
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
