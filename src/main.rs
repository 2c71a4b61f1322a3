//! leafling - Plant identification and care journal service
//!
//! **Module Identity:**
//! - Name: leafling
//! - Port: 5760 (default)
//!
//! **[LFL-OV-010]** Serves the browser UI's JSON API: plant identification
//! via a third-party recognition provider, name search, and persistence of
//! plant records.

use anyhow::Result;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use leafling::services::recognition_client::RecognitionClient;
use leafling::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    info!("Starting leafling (plant care) service");
    info!("Version: {}", env!("CARGO_PKG_VERSION"));

    // Step 1: Load TOML config (missing file is fine)
    let toml_path = leafling::config::config_file_path();
    let toml_config = leafling::config::load_toml_config(&toml_path)
        .map_err(|e| anyhow::anyhow!("Failed to load config {}: {}", toml_path.display(), e))?;

    // Step 2: Open or create database
    let db_path = leafling::config::resolve_database_path(&toml_config);
    info!("Database: {}", db_path.display());

    let db_pool = leafling::db::init_database_pool(&db_path).await?;
    info!("Database connection established");

    // Step 3: Resolve provider API key (Database -> ENV -> TOML); a missing
    // key starts the service in mock identification mode
    let api_key = leafling::config::resolve_provider_api_key(&db_pool, &toml_config).await?;
    let recognition = match toml_config.provider_base_url.clone() {
        Some(base_url) => RecognitionClient::with_base_url(api_key, base_url),
        None => RecognitionClient::new(api_key),
    }
    .map_err(|e| anyhow::anyhow!("Failed to create recognition client: {}", e))?;

    if recognition.is_mock() {
        info!("Identification mode: mock (no provider API key)");
    } else {
        info!("Identification mode: live");
    }

    // Create application state
    let state = AppState::new(db_pool, recognition);

    // Build router
    let app = leafling::build_router(state);

    // Start server
    let port = leafling::config::resolve_port(&toml_config);
    let listener = tokio::net::TcpListener::bind(("127.0.0.1", port)).await?;
    info!("Listening on http://127.0.0.1:{}", port);
    info!("Health check: http://127.0.0.1:{}/health", port);

    axum::serve(listener, app).await?;

    Ok(())
}
