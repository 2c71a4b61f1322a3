//! Configuration resolution for Leafling
//!
//! **[LFL-CFG-010]** The recognition provider API key resolves through three
//! tiers with Database → ENV → TOML priority. A missing key is not fatal:
//! the service starts in mock identification mode.

use serde::{Deserialize, Serialize};
use sqlx::{Pool, Sqlite};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::error::{Error, Result};

/// Environment variable holding the provider API key
pub const ENV_PROVIDER_API_KEY: &str = "LEAFLING_PROVIDER_API_KEY";

/// Environment variable overriding the database path
pub const ENV_DATABASE_PATH: &str = "LEAFLING_DB";

/// Environment variable overriding the listen port
pub const ENV_PORT: &str = "LEAFLING_PORT";

/// Default listen port
pub const DEFAULT_PORT: u16 = 5760;

/// TOML config file shape (~/.config/leafling/leafling.toml)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TomlConfig {
    pub provider_api_key: Option<String>,
    pub provider_base_url: Option<String>,
    pub database_path: Option<String>,
    pub port: Option<u16>,
}

/// Path of the TOML config file
pub fn config_file_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("leafling")
        .join("leafling.toml")
}

/// Load the TOML config; a missing file yields defaults
pub fn load_toml_config(path: &Path) -> Result<TomlConfig> {
    if !path.exists() {
        return Ok(TomlConfig::default());
    }

    let content = std::fs::read_to_string(path)
        .map_err(|e| Error::Config(format!("Read TOML failed: {}", e)))?;
    toml::from_str(&content).map_err(|e| Error::Config(format!("Parse TOML failed: {}", e)))
}

/// Write the TOML config (best-effort atomic: temp file then rename)
pub fn write_toml_config(config: &TomlConfig, path: &Path) -> Result<()> {
    let content = toml::to_string_pretty(config)
        .map_err(|e| Error::Config(format!("Serialize TOML failed: {}", e)))?;

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let tmp_path = path.with_extension("toml.tmp");
    std::fs::write(&tmp_path, content)?;
    std::fs::rename(&tmp_path, path)?;

    Ok(())
}

/// Validate API key (non-empty, non-whitespace)
pub fn is_valid_key(key: &str) -> bool {
    !key.trim().is_empty()
}

/// Resolve the provider API key from 3-tier configuration
///
/// **Priority:** Database → ENV → TOML
///
/// **[LFL-CFG-010]** Returns None when no tier holds a valid key; the caller
/// then runs in mock identification mode rather than failing startup.
pub async fn resolve_provider_api_key(
    db: &Pool<Sqlite>,
    toml_config: &TomlConfig,
) -> Result<Option<String>> {
    let db_key = crate::db::settings::get_provider_api_key(db)
        .await?
        .filter(|key| is_valid_key(key));
    let env_key = std::env::var(ENV_PROVIDER_API_KEY)
        .ok()
        .filter(|key| is_valid_key(key));
    let toml_key = toml_config
        .provider_api_key
        .clone()
        .filter(|key| is_valid_key(key));

    let mut sources = Vec::new();
    if db_key.is_some() {
        sources.push("database");
    }
    if env_key.is_some() {
        sources.push("environment");
    }
    if toml_key.is_some() {
        sources.push("TOML");
    }

    if sources.len() > 1 {
        warn!(
            "Provider API key found in multiple sources: {}. Using {} (highest priority).",
            sources.join(", "),
            sources[0]
        );
    }

    if let Some(key) = db_key {
        info!("Provider API key loaded from database");
        return Ok(Some(key));
    }
    if let Some(key) = env_key {
        info!("Provider API key loaded from environment variable");
        return Ok(Some(key));
    }
    if let Some(key) = toml_key {
        info!("Provider API key loaded from TOML config");
        return Ok(Some(key));
    }

    warn!(
        "No provider API key configured. Identification runs in mock mode. Configure one via:\n\
         1. Web UI: POST /api/settings/provider_api_key\n\
         2. Environment: {}=your-key-here\n\
         3. TOML config: {} (provider_api_key = \"your-key\")",
        ENV_PROVIDER_API_KEY,
        config_file_path().display()
    );
    Ok(None)
}

/// Sync the provider API key to the TOML file (best-effort backup; database
/// remains authoritative)
pub fn sync_key_to_toml(key: &str, toml_path: &Path) -> Result<()> {
    let mut config = load_toml_config(toml_path).unwrap_or_default();
    config.provider_api_key = Some(key.to_string());

    match write_toml_config(&config, toml_path) {
        Ok(()) => {
            info!("Provider API key synced to TOML: {}", toml_path.display());
            Ok(())
        }
        Err(e) => {
            warn!("TOML write failed (database write succeeded): {}", e);
            Ok(())
        }
    }
}

/// Resolve the SQLite database path: ENV → TOML → platform data dir
pub fn resolve_database_path(toml_config: &TomlConfig) -> PathBuf {
    if let Ok(path) = std::env::var(ENV_DATABASE_PATH) {
        return PathBuf::from(path);
    }
    if let Some(path) = &toml_config.database_path {
        return PathBuf::from(path);
    }
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("leafling")
        .join("leafling.db")
}

/// Resolve the listen port: ENV → TOML → default
pub fn resolve_port(toml_config: &TomlConfig) -> u16 {
    if let Ok(raw) = std::env::var(ENV_PORT) {
        match raw.parse::<u16>() {
            Ok(port) => return port,
            Err(_) => warn!("Ignoring invalid {}={}", ENV_PORT, raw),
        }
    }
    toml_config.port.unwrap_or(DEFAULT_PORT)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use sqlx::SqlitePool;

    async fn setup_test_db() -> SqlitePool {
        let pool = SqlitePool::connect(":memory:").await.unwrap();
        sqlx::query("CREATE TABLE settings (key TEXT PRIMARY KEY, value TEXT NOT NULL)")
            .execute(&pool)
            .await
            .unwrap();
        pool
    }

    #[test]
    fn test_is_valid_key() {
        assert!(is_valid_key("abc"));
        assert!(!is_valid_key(""));
        assert!(!is_valid_key("   "));
    }

    #[test]
    fn test_load_missing_toml_defaults() {
        let config = load_toml_config(Path::new("/nonexistent/leafling.toml")).unwrap();
        assert!(config.provider_api_key.is_none());
        assert!(config.port.is_none());
    }

    #[test]
    fn test_toml_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("leafling.toml");

        let config = TomlConfig {
            provider_api_key: Some("toml_key".to_string()),
            provider_base_url: None,
            database_path: Some("/tmp/leafling.db".to_string()),
            port: Some(6000),
        };
        write_toml_config(&config, &path).unwrap();

        let loaded = load_toml_config(&path).unwrap();
        assert_eq!(loaded.provider_api_key.as_deref(), Some("toml_key"));
        assert_eq!(loaded.port, Some(6000));
    }

    #[test]
    fn test_sync_key_preserves_other_fields() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("leafling.toml");

        write_toml_config(
            &TomlConfig {
                provider_api_key: None,
                provider_base_url: None,
                database_path: None,
                port: Some(6001),
            },
            &path,
        )
        .unwrap();

        sync_key_to_toml("fresh_key", &path).unwrap();

        let loaded = load_toml_config(&path).unwrap();
        assert_eq!(loaded.provider_api_key.as_deref(), Some("fresh_key"));
        assert_eq!(loaded.port, Some(6001));
    }

    #[tokio::test]
    #[serial]
    async fn test_resolve_key_database_wins() {
        let pool = setup_test_db().await;
        crate::db::settings::set_provider_api_key(&pool, "db_key".to_string())
            .await
            .unwrap();
        std::env::set_var(ENV_PROVIDER_API_KEY, "env_key");

        let config = TomlConfig {
            provider_api_key: Some("toml_key".to_string()),
            ..Default::default()
        };
        let resolved = resolve_provider_api_key(&pool, &config).await.unwrap();

        std::env::remove_var(ENV_PROVIDER_API_KEY);
        assert_eq!(resolved.as_deref(), Some("db_key"));
    }

    #[tokio::test]
    #[serial]
    async fn test_resolve_key_env_beats_toml() {
        let pool = setup_test_db().await;
        std::env::set_var(ENV_PROVIDER_API_KEY, "env_key");

        let config = TomlConfig {
            provider_api_key: Some("toml_key".to_string()),
            ..Default::default()
        };
        let resolved = resolve_provider_api_key(&pool, &config).await.unwrap();

        std::env::remove_var(ENV_PROVIDER_API_KEY);
        assert_eq!(resolved.as_deref(), Some("env_key"));
    }

    #[tokio::test]
    #[serial]
    async fn test_resolve_key_none_means_mock_mode() {
        let pool = setup_test_db().await;
        std::env::remove_var(ENV_PROVIDER_API_KEY);

        let resolved = resolve_provider_api_key(&pool, &TomlConfig::default())
            .await
            .unwrap();
        assert!(resolved.is_none());
    }

    #[tokio::test]
    #[serial]
    async fn test_whitespace_key_is_ignored() {
        let pool = setup_test_db().await;
        crate::db::settings::set_provider_api_key(&pool, "   ".to_string())
            .await
            .unwrap();
        std::env::remove_var(ENV_PROVIDER_API_KEY);

        let config = TomlConfig {
            provider_api_key: Some("toml_key".to_string()),
            ..Default::default()
        };
        let resolved = resolve_provider_api_key(&pool, &config).await.unwrap();
        assert_eq!(resolved.as_deref(), Some("toml_key"));
    }

    #[test]
    #[serial]
    fn test_resolve_port_env_override() {
        std::env::set_var(ENV_PORT, "7001");
        let port = resolve_port(&TomlConfig::default());
        std::env::remove_var(ENV_PORT);
        assert_eq!(port, 7001);
    }

    #[test]
    #[serial]
    fn test_resolve_port_default() {
        std::env::remove_var(ENV_PORT);
        assert_eq!(resolve_port(&TomlConfig::default()), DEFAULT_PORT);
    }
}
