//! Identification response normalizer
//!
//! **[LFL-IDN-010]** The recognition provider's JSON is schema-unstable: the
//! ranked candidate list moves between nesting levels across API revisions
//! and plan tiers, and the key names inside a candidate's `details` object
//! are not guaranteed. This module owns all shape probing and folds whatever
//! arrives into one [`PlantDetails`] record.
//!
//! Candidate location checks an explicit ordered list of known schema
//! variants exhaustively before falling back to a key scan, and logs which
//! variant matched.

use serde_json::{Map, Value};
use std::collections::BTreeMap;

use crate::models::plant::PlantDetails;
use crate::services::recognition_client::IdentifyError;

/// Default for family/genus when no source location yields a value
pub const UNKNOWN_FIELD: &str = "Unknown";

/// Name keys tried for the image identification path, in order
const IMAGE_NAME_KEYS: &[&str] = &["name", "entity_name"];

/// Name keys tried for the text search path, in order
const SEARCH_NAME_KEYS: &[&str] = &["entity_name", "name"];

/// Known locations of the ranked candidate list
///
/// **[LFL-IDN-020]** Checked in declaration order; `KeyScan` is the last
/// resort and logs a warning when it fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemaVariant {
    /// `result.classification.suggestions` (current image API)
    ClassificationSuggestions,
    /// `result.suggestions`
    ResultSuggestions,
    /// `suggestions` (text search API)
    TopLevelSuggestions,
    /// `results`
    TopLevelResults,
    /// First array-valued key containing "suggestion", top level or `result`
    KeyScan,
}

impl SchemaVariant {
    pub fn as_str(&self) -> &'static str {
        match self {
            SchemaVariant::ClassificationSuggestions => "result.classification.suggestions",
            SchemaVariant::ResultSuggestions => "result.suggestions",
            SchemaVariant::TopLevelSuggestions => "suggestions",
            SchemaVariant::TopLevelResults => "results",
            SchemaVariant::KeyScan => "key-scan",
        }
    }
}

/// Locate the ranked candidate list inside a provider payload
///
/// Returns the list (possibly empty) and the variant that matched. The first
/// matching variant wins; an empty list under a matching variant still counts
/// as a match and is classified as "not identified" downstream.
pub fn locate_candidates(payload: &Value) -> Option<(&Vec<Value>, SchemaVariant)> {
    if let Some(list) = payload
        .pointer("/result/classification/suggestions")
        .and_then(Value::as_array)
    {
        return Some((list, SchemaVariant::ClassificationSuggestions));
    }

    if let Some(list) = payload
        .pointer("/result/suggestions")
        .and_then(Value::as_array)
    {
        return Some((list, SchemaVariant::ResultSuggestions));
    }

    if let Some(list) = payload.get("suggestions").and_then(Value::as_array) {
        return Some((list, SchemaVariant::TopLevelSuggestions));
    }

    if let Some(list) = payload.get("results").and_then(Value::as_array) {
        return Some((list, SchemaVariant::TopLevelResults));
    }

    // Last resort: any array-valued key mentioning "suggestion", checked at
    // the top level first, then under `result`
    for scope in [Some(payload), payload.get("result")].into_iter().flatten() {
        if let Some(obj) = scope.as_object() {
            for (key, value) in obj {
                if key.to_ascii_lowercase().contains("suggestion") {
                    if let Some(list) = value.as_array() {
                        tracing::warn!(key = %key, "Candidate list found only by key scan");
                        return Some((list, SchemaVariant::KeyScan));
                    }
                }
            }
        }
    }

    None
}

/// Normalize an image identification payload
///
/// **[LFL-IDN-030]** Selects exactly the first (highest-ranked) candidate;
/// ranking is provider-determined and trusted as-is. An absent or empty
/// candidate list is the recoverable "couldn't identify" condition, not a
/// hard failure.
pub fn normalize_identification(payload: &Value) -> Result<PlantDetails, IdentifyError> {
    let (candidates, variant) = locate_candidates(payload).ok_or(IdentifyError::NoMatch)?;

    tracing::debug!(
        variant = variant.as_str(),
        count = candidates.len(),
        "Located identification candidates"
    );

    let first = candidates.first().ok_or(IdentifyError::NoMatch)?;
    normalize_candidate(first, IMAGE_NAME_KEYS).ok_or(IdentifyError::NoMatch)
}

/// Normalize a text search payload into all candidates, provider order
///
/// Structurally the same field resolution as the image path, but candidates
/// are keyed by `entity_name`. Zero usable candidates is `NoMatch`.
pub fn normalize_search(payload: &Value) -> Result<Vec<PlantDetails>, IdentifyError> {
    let (candidates, variant) = locate_candidates(payload).ok_or(IdentifyError::NoMatch)?;

    tracing::debug!(
        variant = variant.as_str(),
        count = candidates.len(),
        "Located search candidates"
    );

    let normalized: Vec<PlantDetails> = candidates
        .iter()
        .filter_map(|candidate| normalize_candidate(candidate, SEARCH_NAME_KEYS))
        .collect();

    if normalized.is_empty() {
        return Err(IdentifyError::NoMatch);
    }

    Ok(normalized)
}

/// Fold one candidate into a `PlantDetails`, or None when it carries no
/// usable scientific identifier
fn normalize_candidate(candidate: &Value, name_keys: &[&str]) -> Option<PlantDetails> {
    let scientific_name = name_keys
        .iter()
        .find_map(|key| candidate.get(*key).and_then(Value::as_str))
        .map(str::trim)
        .filter(|name| !name.is_empty())?
        .to_string();

    let details = candidate.get("details").and_then(Value::as_object);

    let all_common_names = resolve_common_names(candidate, details);

    // Canonical display name: first common name when it actually differs
    // from the scientific identifier, else the scientific identifier
    let common_name = all_common_names
        .first()
        .filter(|name| !names_equal(name.as_str(), &scientific_name))
        .cloned()
        .unwrap_or_else(|| scientific_name.clone());

    let taxonomy = resolve_taxonomy(candidate, details);
    let family = resolve_rank(candidate, details, &taxonomy, "family");
    let genus = resolve_rank(candidate, details, &taxonomy, "genus");
    let description = resolve_text(candidate, details, &["description"]);
    let wiki_url = resolve_text(candidate, details, &["url", "wiki_url"]);

    let confidence = validated_confidence(
        candidate.get("probability").and_then(Value::as_f64),
        &scientific_name,
    );

    Some(PlantDetails {
        scientific_name,
        common_name,
        all_common_names,
        confidence,
        description,
        taxonomy,
        family,
        genus,
        wiki_url,
    })
}

/// Resolve the common-name list through the ordered fallback chain
///
/// **[LFL-IDN-040]**
/// (a) flat `common_names` on the candidate;
/// (b) `common_names` under `details`;
/// (c) key scan of `details` for a list-valued key containing "common" or
///     "name".
/// Provider order inside the chosen list is preserved; a source that yields
/// no usable strings falls through to the next.
fn resolve_common_names(candidate: &Value, details: Option<&Map<String, Value>>) -> Vec<String> {
    if let Some(names) = string_list(candidate.get("common_names")) {
        if !names.is_empty() {
            return names;
        }
    }

    let Some(details) = details else {
        return Vec::new();
    };

    if let Some(names) = string_list(details.get("common_names")) {
        if !names.is_empty() {
            return names;
        }
    }

    for (key, value) in details {
        if key == "common_names" {
            continue;
        }
        let lower = key.to_ascii_lowercase();
        if (lower.contains("common") || lower.contains("name")) && value.is_array() {
            if let Some(names) = string_list(Some(value)) {
                if !names.is_empty() {
                    tracing::debug!(key = %key, "Common names resolved by details key scan");
                    return names;
                }
            }
        }
    }

    Vec::new()
}

/// Extract trimmed, non-empty strings from an array value
fn string_list(value: Option<&Value>) -> Option<Vec<String>> {
    let list = value?.as_array()?;
    Some(
        list.iter()
            .filter_map(Value::as_str)
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect(),
    )
}

/// Taxonomy mapping: `taxonomy` object top-level, else under `details`;
/// only string-valued entries are kept
fn resolve_taxonomy(
    candidate: &Value,
    details: Option<&Map<String, Value>>,
) -> BTreeMap<String, String> {
    let source = candidate
        .get("taxonomy")
        .and_then(Value::as_object)
        .or_else(|| details.and_then(|d| d.get("taxonomy")).and_then(Value::as_object));

    let Some(source) = source else {
        return BTreeMap::new();
    };

    source
        .iter()
        .filter_map(|(key, value)| {
            value
                .as_str()
                .map(|v| (key.clone(), v.trim().to_string()))
        })
        .collect()
}

/// Family/genus: top-level field, else `details`, else the taxonomy mapping,
/// else `"Unknown"`
fn resolve_rank(
    candidate: &Value,
    details: Option<&Map<String, Value>>,
    taxonomy: &BTreeMap<String, String>,
    rank: &str,
) -> String {
    candidate
        .get(rank)
        .and_then(Value::as_str)
        .or_else(|| details.and_then(|d| d.get(rank)).and_then(Value::as_str))
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
        .or_else(|| taxonomy.get(rank).filter(|v| !v.is_empty()).cloned())
        .unwrap_or_else(|| UNKNOWN_FIELD.to_string())
}

/// Textual field (description, reference URL): top-level field, else under
/// `details`; accepts a bare string or the provider's `{ "value": ... }`
/// wrapper object. Empty string when absent.
fn resolve_text(
    candidate: &Value,
    details: Option<&Map<String, Value>>,
    keys: &[&str],
) -> String {
    for key in keys {
        let sources = [
            candidate.get(*key),
            details.and_then(|d| d.get(*key)),
        ];
        for source in sources.into_iter().flatten() {
            if let Some(text) = text_of(source) {
                return text;
            }
        }
    }
    String::new()
}

fn text_of(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => {
            let trimmed = s.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_string())
        }
        Value::Object(obj) => obj
            .get("value")
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string),
        _ => None,
    }
}

/// Confidence validation
///
/// **[LFL-IDN-050]** A probability outside [0,1] (or non-finite) is a
/// data-quality condition: it is logged and dropped rather than rendered as
/// a malformed indicator.
fn validated_confidence(raw: Option<f64>, scientific_name: &str) -> Option<f64> {
    match raw {
        Some(p) if p.is_finite() && (0.0..=1.0).contains(&p) => Some(p),
        Some(p) => {
            tracing::warn!(
                probability = p,
                plant = %scientific_name,
                "Out-of-range confidence from provider; dropping"
            );
            None
        }
        None => None,
    }
}

/// Case-insensitive, whitespace-trimmed name comparison
fn names_equal(a: &str, b: &str) -> bool {
    a.trim().eq_ignore_ascii_case(b.trim())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn image_payload(suggestions: Value) -> Value {
        json!({
            "result": {
                "classification": {
                    "suggestions": suggestions
                }
            }
        })
    }

    #[test]
    fn test_selects_first_candidate_regardless_of_count() {
        let payload = image_payload(json!([
            { "name": "Ficus lyrata", "probability": 0.8 },
            { "name": "Ficus elastica", "probability": 0.7 },
            { "name": "Ficus benjamina", "probability": 0.6 }
        ]));

        let details = normalize_identification(&payload).unwrap();
        assert_eq!(details.scientific_name, "Ficus lyrata");
    }

    #[test]
    fn test_variant_order_prefers_classification_path() {
        let payload = json!({
            "result": {
                "classification": { "suggestions": [{ "name": "Primary pick" }] },
                "suggestions": [{ "name": "Wrong pick" }]
            },
            "suggestions": [{ "name": "Also wrong" }]
        });

        let (list, variant) = locate_candidates(&payload).unwrap();
        assert_eq!(variant, SchemaVariant::ClassificationSuggestions);
        assert_eq!(list[0]["name"], "Primary pick");
    }

    #[test]
    fn test_result_suggestions_variant() {
        let payload = json!({ "result": { "suggestions": [{ "name": "Hedera helix" }] } });
        let (_, variant) = locate_candidates(&payload).unwrap();
        assert_eq!(variant, SchemaVariant::ResultSuggestions);
    }

    #[test]
    fn test_top_level_results_variant() {
        let payload = json!({ "results": [{ "name": "Hedera helix" }] });
        let (_, variant) = locate_candidates(&payload).unwrap();
        assert_eq!(variant, SchemaVariant::TopLevelResults);
    }

    #[test]
    fn test_key_scan_is_last_resort() {
        let payload = json!({ "plant_suggestions": [{ "name": "Hedera helix" }] });
        let (list, variant) = locate_candidates(&payload).unwrap();
        assert_eq!(variant, SchemaVariant::KeyScan);
        assert_eq!(list.len(), 1);

        let details = normalize_identification(&payload).unwrap();
        assert_eq!(details.scientific_name, "Hedera helix");
    }

    #[test]
    fn test_missing_candidate_list_is_no_match() {
        let payload = json!({ "result": { "classification": {} } });
        assert!(matches!(
            normalize_identification(&payload),
            Err(IdentifyError::NoMatch)
        ));
    }

    #[test]
    fn test_empty_candidate_list_is_no_match_not_panic() {
        let payload = image_payload(json!([]));
        assert!(matches!(
            normalize_identification(&payload),
            Err(IdentifyError::NoMatch)
        ));
    }

    #[test]
    fn test_peace_lily_example() {
        let payload = image_payload(json!([
            {
                "name": "Spathiphyllum wallisii",
                "probability": 0.91,
                "details": {
                    "common_names": ["Peace Lily", "White Sails"]
                }
            }
        ]));

        let details = normalize_identification(&payload).unwrap();
        assert_eq!(details.scientific_name, "Spathiphyllum wallisii");
        assert_eq!(details.common_name, "Peace Lily");
        assert_eq!(
            details.all_common_names,
            vec!["Peace Lily".to_string(), "White Sails".to_string()]
        );
        assert_eq!(details.confidence, Some(0.91));
    }

    #[test]
    fn test_flat_common_names_preferred_over_nested() {
        let payload = image_payload(json!([
            {
                "name": "Ficus elastica",
                "common_names": ["Rubber Plant"],
                "details": { "common_names": ["Should not win"] }
            }
        ]));

        let details = normalize_identification(&payload).unwrap();
        assert_eq!(details.common_name, "Rubber Plant");
    }

    #[test]
    fn test_nested_common_names_when_flat_absent() {
        let payload = image_payload(json!([
            {
                "name": "Ficus elastica",
                "details": { "common_names": ["Rubber Fig", "Rubber Tree"] }
            }
        ]));

        let details = normalize_identification(&payload).unwrap();
        assert_eq!(
            details.all_common_names,
            vec!["Rubber Fig".to_string(), "Rubber Tree".to_string()]
        );
    }

    #[test]
    fn test_key_scan_finds_other_common_names() {
        let payload = image_payload(json!([
            {
                "name": "Anredera cordifolia",
                "details": {
                    "growth_habit": "vine",
                    "other_common_names": ["Madeira Vine", "Mignonette Vine"]
                }
            }
        ]));

        let details = normalize_identification(&payload).unwrap();
        assert_eq!(details.common_name, "Madeira Vine");
        assert_eq!(details.all_common_names.len(), 2);
    }

    #[test]
    fn test_no_common_names_falls_back_to_scientific() {
        let payload = image_payload(json!([
            { "name": "Hakea petiolaris", "details": { "edible_parts": [] } }
        ]));

        let details = normalize_identification(&payload).unwrap();
        assert_eq!(details.common_name, "Hakea petiolaris");
        assert!(details.all_common_names.is_empty());
    }

    #[test]
    fn test_common_name_equal_to_scientific_keeps_scientific() {
        let payload = image_payload(json!([
            {
                "name": "Monstera deliciosa",
                "common_names": ["monstera deliciosa"]
            }
        ]));

        let details = normalize_identification(&payload).unwrap();
        assert_eq!(details.common_name, "Monstera deliciosa");
    }

    #[test]
    fn test_description_value_wrapper_and_url() {
        let payload = image_payload(json!([
            {
                "name": "Monstera deliciosa",
                "details": {
                    "description": { "value": "A large tropical vine." },
                    "url": "https://en.wikipedia.org/wiki/Monstera_deliciosa"
                }
            }
        ]));

        let details = normalize_identification(&payload).unwrap();
        assert_eq!(details.description, "A large tropical vine.");
        assert_eq!(
            details.wiki_url,
            "https://en.wikipedia.org/wiki/Monstera_deliciosa"
        );
    }

    #[test]
    fn test_family_genus_from_taxonomy_fallback() {
        let payload = image_payload(json!([
            {
                "name": "Monstera deliciosa",
                "details": {
                    "taxonomy": { "family": "Araceae", "genus": "Monstera", "kingdom": "Plantae" }
                }
            }
        ]));

        let details = normalize_identification(&payload).unwrap();
        assert_eq!(details.family, "Araceae");
        assert_eq!(details.genus, "Monstera");
        assert_eq!(details.taxonomy.get("kingdom").unwrap(), "Plantae");
    }

    #[test]
    fn test_missing_descriptive_fields_use_defaults() {
        let payload = image_payload(json!([{ "name": "Mystery plant" }]));

        let details = normalize_identification(&payload).unwrap();
        assert_eq!(details.family, UNKNOWN_FIELD);
        assert_eq!(details.genus, UNKNOWN_FIELD);
        assert_eq!(details.description, "");
        assert_eq!(details.wiki_url, "");
        assert!(details.taxonomy.is_empty());
        assert!(details.confidence.is_none());
    }

    #[test]
    fn test_out_of_range_confidence_dropped() {
        for bad in [1.5, -0.2] {
            let payload = image_payload(json!([
                { "name": "Mystery plant", "probability": bad }
            ]));
            let details = normalize_identification(&payload).unwrap();
            assert!(
                details.confidence.is_none(),
                "probability {} should be dropped",
                bad
            );
        }
    }

    #[test]
    fn test_boundary_confidence_kept() {
        for good in [0.0, 1.0, 0.87] {
            let payload = image_payload(json!([
                { "name": "Mystery plant", "probability": good }
            ]));
            let details = normalize_identification(&payload).unwrap();
            assert_eq!(details.confidence, Some(good));
        }
    }

    #[test]
    fn test_search_path_uses_entity_name() {
        let payload = json!({
            "suggestions": [
                { "entity_name": "Ficus lyrata", "details": { "common_names": ["Fiddle Leaf Fig"] } },
                { "entity_name": "Ficus elastica" }
            ]
        });

        let results = normalize_search(&payload).unwrap();
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].scientific_name, "Ficus lyrata");
        assert_eq!(results[0].common_name, "Fiddle Leaf Fig");
        assert_eq!(results[1].common_name, "Ficus elastica");
    }

    #[test]
    fn test_search_with_zero_suggestions_is_no_match() {
        let payload = json!({ "suggestions": [] });
        assert!(matches!(
            normalize_search(&payload),
            Err(IdentifyError::NoMatch)
        ));
    }

    #[test]
    fn test_candidate_without_name_is_skipped() {
        let payload = json!({
            "suggestions": [
                { "probability": 0.9 },
                { "entity_name": "Hedera helix" }
            ]
        });

        let results = normalize_search(&payload).unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].scientific_name, "Hedera helix");
    }
}
