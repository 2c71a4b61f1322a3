//! Settings database operations
//!
//! **[LFL-DB-030]** Key-value settings table; currently holds the
//! recognition provider API key (the database is the authoritative tier of
//! the key resolution chain).

use sqlx::{Pool, Sqlite};

use crate::error::{Error, Result};

const PROVIDER_API_KEY: &str = "provider_api_key";

/// Get the provider API key, None when never configured
pub async fn get_provider_api_key(db: &Pool<Sqlite>) -> Result<Option<String>> {
    get_setting::<String>(db, PROVIDER_API_KEY).await
}

/// Set the provider API key
pub async fn set_provider_api_key(db: &Pool<Sqlite>, key: String) -> Result<()> {
    set_setting(db, PROVIDER_API_KEY, key).await
}

/// Generic setting getter (internal)
async fn get_setting<T>(db: &Pool<Sqlite>, key: &str) -> Result<Option<T>>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    let row: Option<(String,)> = sqlx::query_as("SELECT value FROM settings WHERE key = ?")
        .bind(key)
        .fetch_optional(db)
        .await
        .map_err(Error::Database)?;

    match row {
        Some((value,)) => {
            let parsed = value
                .parse::<T>()
                .map_err(|e| Error::Config(format!("Parse setting failed: {}", e)))?;
            Ok(Some(parsed))
        }
        None => Ok(None),
    }
}

/// Generic setting setter (internal)
async fn set_setting<T>(db: &Pool<Sqlite>, key: &str, value: T) -> Result<()>
where
    T: std::fmt::Display,
{
    sqlx::query(
        "INSERT INTO settings (key, value) VALUES (?, ?)
         ON CONFLICT(key) DO UPDATE SET value = excluded.value",
    )
    .bind(key)
    .bind(value.to_string())
    .execute(db)
    .await
    .map_err(Error::Database)?;

    Ok(())
}
