//! Version-aware dimension display adapter.
//!
//! V5 and V6 score different semantic axes. The adapter returns the labeled
//! scores belonging to whichever schema produced the record, keyed on the
//! schema tag stored at normalization time. V6 pillar scores are never
//! presented under V5 dimension names.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::screenplay::{SchemaVersion, Screenplay};

/// One display row: a labeled score with its weight and justification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct DimensionDisplay {
    pub key: String,
    pub label: String,
    pub score: f64,
    /// Pillar weight for V6 records; V5 dimensions are unweighted.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub weight: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub justification: Option<String>,
}

/// V5 dimension keys and labels, in rubric order.
const V5_DIMENSIONS: &[(&str, &str)] = &[
    ("concept", "Concept"),
    ("structure", "Structure"),
    ("protagonist", "Protagonist"),
    ("supporting_cast", "Supporting Cast"),
    ("dialogue", "Dialogue"),
    ("genre_execution", "Genre Execution"),
    ("originality", "Originality"),
];

/// V6 pillar keys, labels, and weights, in rubric order.
const V6_PILLARS: &[(&str, &str, f64)] = &[
    ("execution_craft", "Execution Craft", 0.40),
    ("character_system", "Character System", 0.30),
    ("conceptual_strength", "Conceptual Strength", 0.20),
    ("voice_and_tone", "Voice & Tone", 0.10),
];

/// Return the schema-appropriate labeled scores for a record.
pub fn dimension_display(screenplay: &Screenplay) -> Vec<DimensionDisplay> {
    match screenplay.schema {
        SchemaVersion::V5 => v5_rows(screenplay),
        SchemaVersion::V6 => v6_rows(screenplay),
    }
}

fn v5_rows(screenplay: &Screenplay) -> Vec<DimensionDisplay> {
    let d = &screenplay.dimension_scores;
    let scores = [
        d.concept,
        d.structure,
        d.protagonist,
        d.supporting_cast,
        d.dialogue,
        d.genre_execution,
        d.originality,
    ];

    V5_DIMENSIONS
        .iter()
        .zip(scores)
        .map(|(&(key, label), score)| DimensionDisplay {
            key: key.to_string(),
            label: label.to_string(),
            score,
            weight: None,
            justification: screenplay.dimension_notes.get(key).cloned(),
        })
        .collect()
}

fn v6_rows(screenplay: &Screenplay) -> Vec<DimensionDisplay> {
    // Normalizer guarantees pillar_scores on V6 records; an absent block
    // renders as zeros rather than borrowing V5 labels.
    let p = screenplay.pillar_scores.unwrap_or_default();
    let scores = [
        p.execution_craft,
        p.character_system,
        p.conceptual_strength,
        p.voice_and_tone,
    ];

    V6_PILLARS
        .iter()
        .zip(scores)
        .map(|(&(key, label, weight), score)| DimensionDisplay {
            key: key.to_string(),
            label: label.to_string(),
            score,
            weight: Some(weight),
            justification: screenplay.dimension_notes.get(key).cloned(),
        })
        .collect()
}
