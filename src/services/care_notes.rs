//! Form state projection
//!
//! **[LFL-FRM-010]** Pure derivation of the editable form fields from a
//! normalized identification. The name/species preference rule: a distinct
//! common name wins the name field and pushes the scientific name into the
//! species field; without one, the scientific name is the name and the
//! species field is the explicit "Unknown" marker, never an empty string.
//!
//! Notes are seeded, not locked: a truncated description followed by a care
//! block built from fixed template sentences parameterized by family/genus.
//! The templates are static text, not a care database.

use serde::Serialize;

use crate::models::plant::PlantDetails;
use crate::services::normalizer::UNKNOWN_FIELD;

/// Auto-filled (editable) form values
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FormSeed {
    pub name: String,
    pub species: String,
    pub notes: String,
}

/// Description preview length in characters
const DESCRIPTION_PREVIEW_CHARS: usize = 150;

/// Derive the auto-fill form values for one identification
pub fn seed_form(details: &PlantDetails) -> FormSeed {
    let has_distinct_common = !details
        .common_name
        .trim()
        .eq_ignore_ascii_case(details.scientific_name.trim());

    let (name, species) = if has_distinct_common {
        (details.common_name.clone(), details.scientific_name.clone())
    } else {
        (details.scientific_name.clone(), UNKNOWN_FIELD.to_string())
    };

    let mut notes = String::new();
    let preview = truncate_description(&details.description);
    if !preview.is_empty() {
        notes.push_str(&preview);
        notes.push_str("\n\n");
    }
    notes.push_str(&care_block(&details.family, &details.genus));

    FormSeed {
        name,
        species,
        notes,
    }
}

/// First 150 characters of the description, ellipsis-suffixed when truncated
fn truncate_description(description: &str) -> String {
    let trimmed = description.trim();
    if trimmed.chars().count() <= DESCRIPTION_PREVIEW_CHARS {
        return trimmed.to_string();
    }
    let head: String = trimmed.chars().take(DESCRIPTION_PREVIEW_CHARS).collect();
    format!("{}...", head)
}

/// Bullet-formatted care block from fixed templates
///
/// **[LFL-FRM-020]** Ten topics, each a static sentence with the family or
/// genus substituted in. A genus of "Unknown" reads naturally ("this plant").
pub fn care_block(family: &str, genus: &str) -> String {
    let genus_ref = if genus == UNKNOWN_FIELD {
        "this plant".to_string()
    } else {
        genus.to_string()
    };
    let family_ref = if family == UNKNOWN_FIELD {
        "its family".to_string()
    } else {
        format!("the {} family", family)
    };

    let lines = [
        format!(
            "• Watering: Water when the top inch of soil feels dry; {} dislikes sitting in soggy soil.",
            genus_ref
        ),
        format!(
            "• Light: Bright, indirect light suits most members of {}.",
            family_ref
        ),
        "• Soil: Use a well-draining potting mix; add perlite if water pools on the surface."
            .to_string(),
        "• Humidity: Average room humidity is fine; mist the leaves if the air is very dry."
            .to_string(),
        "• Temperature: Keep between 18-27°C and away from cold drafts.".to_string(),
        "• Fertilizing: Feed monthly with a diluted balanced fertilizer during the growing season."
            .to_string(),
        format!(
            "• Pruning: Trim yellowing or damaged leaves to keep {} tidy.",
            genus_ref
        ),
        "• Repotting: Repot every 1-2 years, or when roots circle the pot.".to_string(),
        format!(
            "• Propagation: Many members of {} propagate from stem cuttings or division.",
            family_ref
        ),
        "• Toxicity: Check before placing near pets or children; many houseplants irritate if chewed."
            .to_string(),
    ];

    lines.join("\n")
}
