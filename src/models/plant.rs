//! Plant data shapes
//!
//! **[LFL-DM-010]** `PlantDetails` is the normalized view of one provider
//! candidate, `PlantRecord` is the submission payload, and
//! `StoredPlantSummary` is the UI-facing view of a persisted record.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

/// Placeholder shown when a plant has never been watered
pub const NOT_WATERED_PLACEHOLDER: &str = "Not watered yet";

/// Normalized identification result
///
/// **[LFL-DM-010]** Invariant: `common_name` is never empty. When the
/// provider supplies no usable common name it carries the scientific name.
/// `all_common_names` preserves provider order; the first entry is canonical.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlantDetails {
    pub scientific_name: String,
    pub common_name: String,
    pub all_common_names: Vec<String>,
    /// Match confidence in [0,1]; None when the provider sent no usable value
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
    pub description: String,
    pub taxonomy: BTreeMap<String, String>,
    pub family: String,
    pub genus: String,
    pub wiki_url: String,
}

/// Scientific metadata carried on a submitted record when the plant was
/// identified (absent for manual entries)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScientificDetails {
    pub scientific_name: String,
    pub common_names: Vec<String>,
    pub taxonomy: BTreeMap<String, String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
    pub wiki_url: String,
}

impl ScientificDetails {
    pub fn from_details(details: &PlantDetails) -> Self {
        Self {
            scientific_name: details.scientific_name.clone(),
            common_names: details.all_common_names.clone(),
            taxonomy: details.taxonomy.clone(),
            confidence: details.confidence,
            wiki_url: details.wiki_url.clone(),
        }
    }
}

/// Submission payload for a new plant record
///
/// `name` must be non-empty before submission is permitted; `main_image` is
/// optional because identification is optional.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlantRecord {
    pub name: String,
    #[serde(default)]
    pub species: String,
    #[serde(default)]
    pub nickname: String,
    #[serde(default)]
    pub main_image: Option<String>,
    #[serde(default)]
    pub notes: String,
    #[serde(default = "default_status")]
    pub status: String,
    #[serde(default)]
    pub scientific_details: Option<ScientificDetails>,
}

fn default_status() -> String {
    "healthy".to_string()
}

/// UI-facing view of a stored plant record
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredPlantSummary {
    pub id: Uuid,
    pub name: String,
    pub species: String,
    pub nickname: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    pub notes: String,
    pub status: String,
    /// Human date of last watering, or [`NOT_WATERED_PLACEHOLDER`]
    pub last_watered: String,
    /// Human date the record was created
    pub added_on: String,
}

/// Format a timestamp the way the UI displays dates ("Jan 5, 2026")
pub fn human_date(ts: DateTime<Utc>) -> String {
    ts.format("%b %-d, %Y").to_string()
}

/// Render an optional watering timestamp, substituting the fixed placeholder
pub fn watered_display(last_watered_at: Option<DateTime<Utc>>) -> String {
    match last_watered_at {
        Some(ts) => human_date(ts),
        None => NOT_WATERED_PLACEHOLDER.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_human_date_format() {
        let ts = Utc.with_ymd_and_hms(2026, 1, 5, 12, 0, 0).unwrap();
        assert_eq!(human_date(ts), "Jan 5, 2026");
    }

    #[test]
    fn test_watered_display_placeholder() {
        assert_eq!(watered_display(None), "Not watered yet");
    }

    #[test]
    fn test_watered_display_date() {
        let ts = Utc.with_ymd_and_hms(2025, 12, 24, 8, 30, 0).unwrap();
        assert_eq!(watered_display(Some(ts)), "Dec 24, 2025");
    }

    #[test]
    fn test_plant_record_defaults() {
        let record: PlantRecord = serde_json::from_str(r#"{"name":"Fern"}"#).unwrap();
        assert_eq!(record.name, "Fern");
        assert_eq!(record.status, "healthy");
        assert!(record.main_image.is_none());
        assert!(record.scientific_details.is_none());
    }

    #[test]
    fn test_plant_details_camel_case_wire_shape() {
        let details = PlantDetails {
            scientific_name: "Ficus lyrata".to_string(),
            common_name: "Fiddle Leaf Fig".to_string(),
            all_common_names: vec!["Fiddle Leaf Fig".to_string()],
            confidence: Some(0.9),
            description: String::new(),
            taxonomy: BTreeMap::new(),
            family: "Moraceae".to_string(),
            genus: "Ficus".to_string(),
            wiki_url: String::new(),
        };

        let json = serde_json::to_value(&details).unwrap();
        assert_eq!(json["scientificName"], "Ficus lyrata");
        assert_eq!(json["commonName"], "Fiddle Leaf Fig");
        assert_eq!(json["allCommonNames"][0], "Fiddle Leaf Fig");
    }
}
