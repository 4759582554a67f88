//! Raw LLM analysis wire formats.
//!
//! Two schema generations are in circulation:
//! - **V5**: flat per-dimension scores (7 fixed dimensions) plus a
//!   commercial-viability block and a free-text critical-failures list.
//! - **V6**: four weighted pillars decomposed into sub-dimensions, a
//!   false-positive trap check, structured critical failures, and optional
//!   non-scoring market/production lenses.
//!
//! These types are contracts only; all interpretation lives in the
//! normalizer. Every field the producer might omit is optional or defaulted,
//! and every numeric field tolerates string-typed numbers via
//! [`LooseNumber`].

use std::collections::BTreeMap;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::utils::LooseNumber;

/// A raw analysis document, dispatched on its `analysis_version` field.
///
/// Unrecognized or missing discriminators route to V5, the legacy default.
#[derive(Debug, Clone)]
pub enum RawAnalysis {
    V5(RawAnalysisV5),
    V6(RawAnalysisV6),
}

impl RawAnalysis {
    /// Detect the schema version and deserialize accordingly.
    pub fn from_value(value: serde_json::Value) -> serde_json::Result<Self> {
        let version = value
            .get("analysis_version")
            .and_then(|v| v.as_str())
            .unwrap_or_default();

        if version.starts_with("v6") {
            Ok(Self::V6(serde_json::from_value(value)?))
        } else {
            Ok(Self::V5(serde_json::from_value(value)?))
        }
    }

    /// Parse a raw analysis document from JSON text.
    pub fn from_slice(bytes: &[u8]) -> serde_json::Result<Self> {
        Self::from_value(serde_json::from_slice(bytes)?)
    }

    /// Set the source filename when the producer omitted it (e.g. fresh
    /// LLM output scored from an upload).
    pub fn with_source_file(mut self, filename: &str) -> Self {
        let source_file = match &mut self {
            Self::V5(raw) => &mut raw.source_file,
            Self::V6(raw) => &mut raw.source_file,
        };
        if source_file.is_none() {
            *source_file = Some(filename.to_string());
        }
        self
    }

    /// The source filename, wherever the producer put it.
    pub fn source_filename(&self) -> Option<&str> {
        let (source_file, metadata) = match self {
            Self::V5(raw) => (raw.source_file.as_deref(), raw.metadata.as_ref()),
            Self::V6(raw) => (raw.source_file.as_deref(), raw.metadata.as_ref()),
        };
        source_file.or_else(|| metadata.and_then(|m| m.filename.as_deref()))
    }
}

/// File metadata attached to every analysis document.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct RawFileMetadata {
    #[serde(default)]
    pub filename: Option<String>,
    #[serde(default)]
    pub page_count: Option<LooseNumber>,
    #[serde(default)]
    pub word_count: Option<LooseNumber>,
}

/// A critical failure entry: producers emit either a bare string or a
/// structured object with severity, penalty, and evidence.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(untagged)]
pub enum RawCriticalFailure {
    Text(String),
    Detail(RawCriticalFailureDetail),
}

/// Structured critical failure.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct RawCriticalFailureDetail {
    pub failure: String,
    #[serde(default)]
    pub severity: Option<String>,
    #[serde(default)]
    pub penalty: Option<LooseNumber>,
    #[serde(default)]
    pub evidence: Option<String>,
}

/// Producer-intelligence metrics, scored by a separate external pass.
/// Absent until that pass has run.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct RawProducerMetrics {
    #[serde(default)]
    pub producer_score: LooseNumber,
    #[serde(default)]
    pub market_fit: LooseNumber,
    #[serde(default)]
    pub audience_breadth: LooseNumber,
    #[serde(default)]
    pub notes: Option<String>,
}

// ============================================================================
// V5: flat per-dimension schema
// ============================================================================

/// A V5 analysis document.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct RawAnalysisV5 {
    #[serde(default)]
    pub source_file: Option<String>,
    #[serde(default)]
    pub analysis_version: Option<String>,
    #[serde(default)]
    pub metadata: Option<RawFileMetadata>,
    #[serde(default)]
    pub analysis: RawAnalysisBodyV5,
}

/// The analysis payload of a V5 document.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct RawAnalysisBodyV5 {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub author: Option<String>,
    #[serde(default)]
    pub genre: Option<String>,
    #[serde(default)]
    pub subgenres: Vec<String>,
    #[serde(default)]
    pub themes: Vec<String>,
    #[serde(default)]
    pub logline: Option<String>,
    #[serde(default)]
    pub tone: Option<String>,
    #[serde(default)]
    pub category: Option<String>,

    #[serde(default)]
    pub dimensions: RawDimensionsV5,

    #[serde(default)]
    pub weighted_score: Option<LooseNumber>,

    #[serde(default)]
    pub commercial_viability: Option<RawCommercialViability>,

    #[serde(default)]
    pub budget_tier: Option<String>,

    #[serde(default)]
    pub critical_failures: Vec<RawCriticalFailure>,

    #[serde(default)]
    pub assessment: Option<RawAssessmentV5>,

    #[serde(default)]
    pub producer_metrics: Option<RawProducerMetrics>,

    #[serde(default)]
    pub tmdb_status: Option<String>,
}

/// The 7 fixed V5 scoring dimensions.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct RawDimensionsV5 {
    #[serde(default)]
    pub concept: Option<RawDimensionScore>,
    #[serde(default)]
    pub structure: Option<RawDimensionScore>,
    #[serde(default)]
    pub protagonist: Option<RawDimensionScore>,
    #[serde(default)]
    pub supporting_cast: Option<RawDimensionScore>,
    #[serde(default)]
    pub dialogue: Option<RawDimensionScore>,
    #[serde(default)]
    pub genre_execution: Option<RawDimensionScore>,
    #[serde(default)]
    pub originality: Option<RawDimensionScore>,
}

/// One scored dimension with its justification.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct RawDimensionScore {
    #[serde(default)]
    pub score: LooseNumber,
    #[serde(default)]
    pub justification: Option<String>,
}

/// Commercial viability: six factors scored 0-3, totalling 0-18.
/// Informational only; never feeds the quality verdict.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct RawCommercialViability {
    #[serde(default)]
    pub concept_hook: LooseNumber,
    #[serde(default)]
    pub castability: LooseNumber,
    #[serde(default)]
    pub budget_ratio: LooseNumber,
    #[serde(default)]
    pub audience_breadth: LooseNumber,
    #[serde(default)]
    pub comp_freshness: LooseNumber,
    #[serde(default)]
    pub franchise_potential: LooseNumber,
    #[serde(default)]
    pub cvs_total: Option<LooseNumber>,
}

/// V5 assessment block.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct RawAssessmentV5 {
    #[serde(default)]
    pub recommendation: Option<String>,
    #[serde(default)]
    pub strengths: Vec<String>,
    #[serde(default)]
    pub weaknesses: Vec<String>,
    #[serde(default)]
    pub development_notes: Vec<String>,
}

// ============================================================================
// V6: pillar/lens schema
// ============================================================================

/// A V6 analysis document (`analysis_version: "v6_core_lenses"` or
/// `"v6_unified"`).
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct RawAnalysisV6 {
    #[serde(default)]
    pub source_file: Option<String>,
    #[serde(default)]
    pub analysis_version: Option<String>,
    #[serde(default)]
    pub metadata: Option<RawFileMetadata>,
    #[serde(default)]
    pub analysis: RawAnalysisBodyV6,
}

/// The analysis payload of a V6 document.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct RawAnalysisBodyV6 {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub author: Option<String>,
    #[serde(default)]
    pub genre: Option<String>,
    #[serde(default)]
    pub subgenres: Vec<String>,
    #[serde(default)]
    pub themes: Vec<String>,
    #[serde(default)]
    pub logline: Option<String>,
    #[serde(default)]
    pub tone: Option<String>,
    #[serde(default)]
    pub category: Option<String>,

    #[serde(default)]
    pub core_quality: RawCoreQuality,

    /// Market/production lenses. Informational: never affects the verdict.
    #[serde(default)]
    pub lenses: Option<RawLenses>,

    #[serde(default)]
    pub commercial_viability: Option<RawCommercialViability>,

    #[serde(default)]
    pub producer_metrics: Option<RawProducerMetrics>,

    #[serde(default)]
    pub tmdb_status: Option<String>,
}

/// The core quality block: four weighted pillars plus failure bookkeeping.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct RawCoreQuality {
    #[serde(default)]
    pub execution_craft: RawPillar,
    #[serde(default)]
    pub character_system: RawPillar,
    #[serde(default)]
    pub conceptual_strength: RawPillar,
    #[serde(default)]
    pub voice_and_tone: RawPillar,

    #[serde(default)]
    pub false_positive_check: Option<RawFalsePositiveCheck>,

    #[serde(default)]
    pub critical_failures: Vec<RawCriticalFailure>,

    #[serde(default)]
    pub major_weaknesses: Vec<String>,

    #[serde(default)]
    pub verdict: Option<String>,

    #[serde(default)]
    pub weighted_score: Option<LooseNumber>,
}

/// One pillar: a weight, an optional pre-aggregated score, and named
/// sub-dimensions. Keyed with a BTreeMap so iteration order is stable.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct RawPillar {
    #[serde(default)]
    pub weight: Option<LooseNumber>,
    #[serde(default)]
    pub score: Option<LooseNumber>,
    #[serde(default)]
    pub sub_dimensions: BTreeMap<String, RawSubDimension>,
}

/// One sub-dimension: a 1-10 score, sub-criteria scores, and the page
/// citations the rubric requires as evidence.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct RawSubDimension {
    #[serde(default)]
    pub score: LooseNumber,
    #[serde(default)]
    pub sub_criteria: BTreeMap<String, LooseNumber>,
    #[serde(default)]
    pub page_citations: Vec<String>,
    #[serde(default)]
    pub justification: Option<String>,
}

/// The false-positive check block: up to 9 named traps.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct RawFalsePositiveCheck {
    #[serde(default)]
    pub traps: Vec<RawTrapEntry>,
}

/// One trap entry as asserted by the model.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct RawTrapEntry {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub tier: Option<String>,
    #[serde(default)]
    pub triggered: bool,
    #[serde(default)]
    pub note: Option<String>,
}

/// Optional lens block. Market lens content is free-form; the production
/// lens carries the budget tier description.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct RawLenses {
    #[serde(default)]
    pub market: Option<serde_json::Value>,
    #[serde(default)]
    pub production: Option<RawProductionLens>,
}

/// Production lens: budget tier and free-form notes.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct RawProductionLens {
    #[serde(default)]
    pub budget_tier: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_version_detection_routes_v6() {
        let doc = json!({
            "analysis_version": "v6_core_lenses",
            "source_file": "test_analysis_v6.json",
            "analysis": {"title": "Test"}
        });
        assert!(matches!(
            RawAnalysis::from_value(doc).unwrap(),
            RawAnalysis::V6(_)
        ));

        let doc = json!({
            "analysis_version": "v6_unified",
            "analysis": {"title": "Test"}
        });
        assert!(matches!(
            RawAnalysis::from_value(doc).unwrap(),
            RawAnalysis::V6(_)
        ));
    }

    #[test]
    fn test_missing_discriminator_defaults_to_v5() {
        let doc = json!({
            "source_file": "legacy.json",
            "analysis": {"title": "Legacy"}
        });
        assert!(matches!(
            RawAnalysis::from_value(doc).unwrap(),
            RawAnalysis::V5(_)
        ));

        let doc = json!({
            "analysis_version": "v7_experimental",
            "analysis": {"title": "Future"}
        });
        assert!(matches!(
            RawAnalysis::from_value(doc).unwrap(),
            RawAnalysis::V5(_)
        ));
    }

    #[test]
    fn test_critical_failure_accepts_both_shapes() {
        let flat: RawCriticalFailure = serde_json::from_value(json!("No third act")).unwrap();
        assert!(matches!(flat, RawCriticalFailure::Text(_)));

        let detail: RawCriticalFailure = serde_json::from_value(json!({
            "failure": "Protagonist has no arc",
            "severity": "critical",
            "penalty": -1.2,
            "evidence": "pp. 40-85"
        }))
        .unwrap();
        assert!(matches!(detail, RawCriticalFailure::Detail(_)));
    }

    #[test]
    fn test_string_typed_scores_deserialize() {
        let dim: RawDimensionScore =
            serde_json::from_value(json!({"score": "8", "justification": "tight"})).unwrap();
        assert_eq!(dim.score.value(), 8.0);
    }

    #[test]
    fn test_source_filename_fallback_to_metadata() {
        let doc = json!({
            "metadata": {"filename": "fallback_analysis_v5.json"},
            "analysis": {"title": "T"}
        });
        let raw = RawAnalysis::from_value(doc).unwrap();
        assert_eq!(raw.source_filename(), Some("fallback_analysis_v5.json"));
    }
}
