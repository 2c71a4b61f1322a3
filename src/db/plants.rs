//! Plant record persistence
//!
//! **[LFL-DB-020]** Every submission inserts a new row; records are keyed by
//! a generated UUID and timestamps are stored as RFC 3339 text.

use chrono::{DateTime, Utc};
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::models::plant::{
    human_date, watered_display, PlantRecord, ScientificDetails, StoredPlantSummary,
};

/// Stored plant row
#[derive(Debug, Clone)]
pub struct StoredPlant {
    pub id: Uuid,
    pub name: String,
    pub species: String,
    pub nickname: String,
    pub main_image: Option<String>,
    pub notes: String,
    pub status: String,
    pub scientific_details: Option<ScientificDetails>,
    pub last_watered_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl StoredPlant {
    /// Reshape into the UI-facing summary, rendering dates as human text and
    /// substituting the placeholder when the plant was never watered
    pub fn into_summary(self) -> StoredPlantSummary {
        StoredPlantSummary {
            id: self.id,
            name: self.name,
            species: self.species,
            nickname: self.nickname,
            image: self.main_image,
            notes: self.notes,
            status: self.status,
            last_watered: watered_display(self.last_watered_at),
            added_on: human_date(self.created_at),
        }
    }
}

/// Insert a new plant record, returning the stored row
pub async fn save_plant(pool: &SqlitePool, record: &PlantRecord) -> Result<StoredPlant> {
    let id = Uuid::new_v4();
    let now = Utc::now();

    let scientific_json = record
        .scientific_details
        .as_ref()
        .map(serde_json::to_string)
        .transpose()
        .map_err(|e| Error::Internal(format!("Serialize scientific details failed: {}", e)))?;

    sqlx::query(
        r#"
        INSERT INTO plants (
            id, name, species, nickname, main_image, notes, status,
            scientific_details, last_watered_at, created_at, updated_at
        ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, NULL, ?, ?)
        "#,
    )
    .bind(id.to_string())
    .bind(&record.name)
    .bind(&record.species)
    .bind(&record.nickname)
    .bind(&record.main_image)
    .bind(&record.notes)
    .bind(&record.status)
    .bind(&scientific_json)
    .bind(now.to_rfc3339())
    .bind(now.to_rfc3339())
    .execute(pool)
    .await?;

    Ok(StoredPlant {
        id,
        name: record.name.clone(),
        species: record.species.clone(),
        nickname: record.nickname.clone(),
        main_image: record.main_image.clone(),
        notes: record.notes.clone(),
        status: record.status.clone(),
        scientific_details: record.scientific_details.clone(),
        last_watered_at: None,
        created_at: now,
        updated_at: now,
    })
}

/// Load one plant by id
pub async fn load_plant(pool: &SqlitePool, id: Uuid) -> Result<Option<StoredPlant>> {
    let row = sqlx::query(
        r#"
        SELECT id, name, species, nickname, main_image, notes, status,
               scientific_details, last_watered_at, created_at, updated_at
        FROM plants
        WHERE id = ?
        "#,
    )
    .bind(id.to_string())
    .fetch_optional(pool)
    .await?;

    row.map(plant_from_row).transpose()
}

/// All plants, newest first
pub async fn list_plants(pool: &SqlitePool) -> Result<Vec<StoredPlant>> {
    let rows = sqlx::query(
        r#"
        SELECT id, name, species, nickname, main_image, notes, status,
               scientific_details, last_watered_at, created_at, updated_at
        FROM plants
        ORDER BY created_at DESC
        "#,
    )
    .fetch_all(pool)
    .await?;

    rows.into_iter().map(plant_from_row).collect()
}

/// Record a watering now
pub async fn mark_watered(pool: &SqlitePool, id: Uuid) -> Result<Option<StoredPlant>> {
    let now = Utc::now();

    let updated = sqlx::query(
        "UPDATE plants SET last_watered_at = ?, updated_at = ? WHERE id = ?",
    )
    .bind(now.to_rfc3339())
    .bind(now.to_rfc3339())
    .bind(id.to_string())
    .execute(pool)
    .await?;

    if updated.rows_affected() == 0 {
        return Ok(None);
    }

    load_plant(pool, id).await
}

fn plant_from_row(row: sqlx::sqlite::SqliteRow) -> Result<StoredPlant> {
    let id_str: String = row.get("id");
    let id = Uuid::parse_str(&id_str)
        .map_err(|e| Error::Internal(format!("Corrupt plant id: {}", e)))?;

    let scientific_json: Option<String> = row.get("scientific_details");
    let scientific_details = scientific_json
        .as_deref()
        .map(serde_json::from_str::<ScientificDetails>)
        .transpose()
        .map_err(|e| Error::Internal(format!("Corrupt scientific details: {}", e)))?;

    Ok(StoredPlant {
        id,
        name: row.get("name"),
        species: row.get("species"),
        nickname: row.get("nickname"),
        main_image: row.get("main_image"),
        notes: row.get("notes"),
        status: row.get("status"),
        scientific_details,
        last_watered_at: parse_timestamp_opt(row.get("last_watered_at"))?,
        created_at: parse_timestamp(row.get("created_at"))?,
        updated_at: parse_timestamp(row.get("updated_at"))?,
    })
}

fn parse_timestamp(text: String) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(&text)
        .map(|ts| ts.with_timezone(&Utc))
        .map_err(|e| Error::Internal(format!("Corrupt timestamp '{}': {}", text, e)))
}

fn parse_timestamp_opt(text: Option<String>) -> Result<Option<DateTime<Utc>>> {
    text.map(parse_timestamp).transpose()
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn setup_test_db() -> SqlitePool {
        let pool = SqlitePool::connect("sqlite::memory:")
            .await
            .expect("Failed to create in-memory database");
        crate::db::init_tables(&pool)
            .await
            .expect("Failed to initialize tables");
        pool
    }

    fn test_record(name: &str) -> PlantRecord {
        PlantRecord {
            name: name.to_string(),
            species: "Spathiphyllum wallisii".to_string(),
            nickname: "Lily".to_string(),
            main_image: None,
            notes: "Keep moist.".to_string(),
            status: "healthy".to_string(),
            scientific_details: None,
        }
    }

    #[tokio::test]
    async fn test_save_and_load_plant() {
        let pool = setup_test_db().await;

        let stored = save_plant(&pool, &test_record("Peace Lily")).await.unwrap();
        let loaded = load_plant(&pool, stored.id).await.unwrap().unwrap();

        assert_eq!(loaded.name, "Peace Lily");
        assert_eq!(loaded.species, "Spathiphyllum wallisii");
        assert_eq!(loaded.notes, "Keep moist.");
        assert!(loaded.last_watered_at.is_none());
    }

    #[tokio::test]
    async fn test_load_missing_plant_is_none() {
        let pool = setup_test_db().await;
        let loaded = load_plant(&pool, Uuid::new_v4()).await.unwrap();
        assert!(loaded.is_none());
    }

    #[tokio::test]
    async fn test_list_newest_first() {
        let pool = setup_test_db().await;

        // Distinct created_at values matter for ordering; insert directly
        for (name, ts) in [
            ("Older", "2026-01-01T10:00:00+00:00"),
            ("Newer", "2026-02-01T10:00:00+00:00"),
        ] {
            sqlx::query(
                "INSERT INTO plants (id, name, created_at, updated_at) VALUES (?, ?, ?, ?)",
            )
            .bind(Uuid::new_v4().to_string())
            .bind(name)
            .bind(ts)
            .bind(ts)
            .execute(&pool)
            .await
            .unwrap();
        }

        let plants = list_plants(&pool).await.unwrap();
        assert_eq!(plants.len(), 2);
        assert_eq!(plants[0].name, "Newer");
        assert_eq!(plants[1].name, "Older");
    }

    #[tokio::test]
    async fn test_mark_watered_sets_timestamp() {
        let pool = setup_test_db().await;

        let stored = save_plant(&pool, &test_record("Fern")).await.unwrap();
        let watered = mark_watered(&pool, stored.id).await.unwrap().unwrap();

        assert!(watered.last_watered_at.is_some());
        let summary = watered.into_summary();
        assert_ne!(summary.last_watered, "Not watered yet");
    }

    #[tokio::test]
    async fn test_mark_watered_missing_plant() {
        let pool = setup_test_db().await;
        let result = mark_watered(&pool, Uuid::new_v4()).await.unwrap();
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn test_scientific_details_roundtrip() {
        let pool = setup_test_db().await;

        let mut record = test_record("Peace Lily");
        record.scientific_details = Some(ScientificDetails {
            scientific_name: "Spathiphyllum wallisii".to_string(),
            common_names: vec!["Peace Lily".to_string(), "White Sails".to_string()],
            taxonomy: [("family".to_string(), "Araceae".to_string())].into(),
            confidence: Some(0.87),
            wiki_url: String::new(),
        });

        let stored = save_plant(&pool, &record).await.unwrap();
        let loaded = load_plant(&pool, stored.id).await.unwrap().unwrap();

        let details = loaded.scientific_details.unwrap();
        assert_eq!(details.confidence, Some(0.87));
        assert_eq!(details.common_names.len(), 2);
    }

    #[tokio::test]
    async fn test_summary_placeholder_when_never_watered() {
        let pool = setup_test_db().await;

        let stored = save_plant(&pool, &test_record("Fern")).await.unwrap();
        let summary = stored.into_summary();

        assert_eq!(summary.last_watered, "Not watered yet");
        assert!(!summary.added_on.is_empty());
    }
}
