//! Canonical screenplay model.
//!
//! Every downstream consumer (filter engine, API, persistence, export) reads
//! this one shape, regardless of which raw schema produced it. A record is
//! built once by the normalizer and never mutated afterwards; reloading
//! replaces the whole set.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Which raw schema produced a canonical record.
///
/// Stored at normalization time, never re-derived by guesswork. The
/// dimension display adapter keys on this tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "snake_case")]
pub enum SchemaVersion {
    #[default]
    V5,
    V6,
}

/// Final recommendation tier.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, JsonSchema,
    Default,
)]
#[serde(rename_all = "snake_case")]
pub enum Recommendation {
    FilmNow,
    Recommend,
    Consider,
    #[default]
    Pass,
}

impl Recommendation {
    /// Parse a producer-supplied recommendation string.
    ///
    /// Case-insensitive; `_`, `-`, and spaces are equivalent separators.
    /// Unrecognized strings fall back to `Pass` so a record is never dropped
    /// for a misspelled tier.
    pub fn parse_lenient(raw: &str) -> Self {
        let folded: String = raw
            .trim()
            .to_lowercase()
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .collect();

        match folded.as_str() {
            "filmnow" => Self::FilmNow,
            "recommend" | "recommended" => Self::Recommend,
            "consider" => Self::Consider,
            "pass" => Self::Pass,
            _ => Self::Pass,
        }
    }

    /// Fixed rubric ordering: film_now=0 < recommend=1 < consider=2 < pass=3.
    ///
    /// Sorting by recommendation uses this rank, not alphabetical order.
    pub const fn sort_rank(&self) -> u8 {
        match self {
            Self::FilmNow => 0,
            Self::Recommend => 1,
            Self::Consider => 2,
            Self::Pass => 3,
        }
    }

    /// Tier one step down; PASS stays PASS.
    pub const fn downgraded(&self) -> Self {
        match self {
            Self::FilmNow => Self::Recommend,
            Self::Recommend => Self::Consider,
            Self::Consider | Self::Pass => Self::Pass,
        }
    }

    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::FilmNow => "film_now",
            Self::Recommend => "recommend",
            Self::Consider => "consider",
            Self::Pass => "pass",
        }
    }
}

/// Canonical budget tier.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema, Default,
)]
#[serde(rename_all = "snake_case")]
pub enum BudgetCategory {
    Micro,
    Low,
    Medium,
    High,
    #[default]
    Unknown,
}

impl BudgetCategory {
    /// Match a free-text tier description by keyword.
    ///
    /// `"medium ($30-60M)"` normalizes to `Medium`; anything unmatched is
    /// `Unknown`, never raw text.
    pub fn parse_lenient(raw: &str) -> Self {
        let folded = raw.to_lowercase();
        if folded.contains("micro") {
            Self::Micro
        } else if folded.contains("low") {
            Self::Low
        } else if folded.contains("medium") || folded.contains("mid") {
            Self::Medium
        } else if folded.contains("high") || folded.contains("tentpole") {
            Self::High
        } else {
            Self::Unknown
        }
    }

    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Micro => "micro",
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
            Self::Unknown => "unknown",
        }
    }
}

/// Critical failure severity.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema, Default,
)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Minor,
    Moderate,
    #[default]
    Major,
    Critical,
}

impl Severity {
    /// Parse a severity string; unknown values default to `Major`.
    pub fn parse_lenient(raw: &str) -> Self {
        match raw.trim().to_lowercase().as_str() {
            "minor" => Self::Minor,
            "moderate" => Self::Moderate,
            "major" => Self::Major,
            "critical" => Self::Critical,
            _ => Self::Major,
        }
    }

    /// Rubric penalty for this severity.
    pub const fn default_penalty(&self) -> f64 {
        match self {
            Self::Minor => -0.3,
            Self::Moderate => -0.5,
            Self::Major => -0.8,
            Self::Critical => -1.2,
        }
    }
}

/// A normalized critical failure.
///
/// `penalty` is the resolved per-failure penalty (raw value if the producer
/// supplied one, severity default otherwise, 0.0 for flat-string entries).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct CriticalFailureDetail {
    pub failure: String,
    pub severity: Severity,
    pub penalty: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub evidence: Option<String>,
}

/// Known source buckets for loaded screenplays.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema, Default,
)]
#[serde(rename_all = "snake_case")]
pub enum Collection {
    /// The active development slate
    Slate,
    /// Open submissions
    Submissions,
    /// Competition entries
    Contest,
    /// Back-catalog library
    Library,
    #[default]
    #[serde(other)]
    Other,
}

impl Collection {
    /// Parse a storage folder label.
    pub fn from_label(label: &str) -> Self {
        match label.trim().to_lowercase().as_str() {
            "slate" => Self::Slate,
            "submissions" => Self::Submissions,
            "contest" | "competition" => Self::Contest,
            "library" | "archive" => Self::Library,
            _ => Self::Other,
        }
    }

    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Slate => "slate",
            Self::Submissions => "submissions",
            Self::Contest => "contest",
            Self::Library => "library",
            Self::Other => "other",
        }
    }
}

/// Produced-film lookup status from the external TMDB pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum TmdbStatus {
    Produced,
    NotFound,
    #[serde(other)]
    Unknown,
}

impl TmdbStatus {
    pub fn parse_lenient(raw: &str) -> Self {
        match raw.trim().to_lowercase().as_str() {
            "produced" | "released" => Self::Produced,
            "not_found" | "notfound" | "none" => Self::NotFound,
            _ => Self::Unknown,
        }
    }
}

/// Producer-intelligence metrics from the external producer pass.
///
/// A screenplay carries `None` here until that pass has scored it. `None`
/// means "pending", never "zero"; downstream consumers must not coalesce.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ProducerMetrics {
    pub producer_score: f64,
    pub market_fit: f64,
    pub audience_breadth: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

/// The 7 canonical dimension scores. Always present; V6 records fill these
/// via the nearest-axis mapping in the normalizer, while display goes
/// through the version-aware adapter instead.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema, Default)]
pub struct DimensionScores {
    pub concept: f64,
    pub structure: f64,
    pub protagonist: f64,
    pub supporting_cast: f64,
    pub dialogue: f64,
    pub genre_execution: f64,
    pub originality: f64,
}

/// The four V6 pillar aggregates, present only on V6-derived records.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema, Default)]
pub struct PillarScores {
    pub execution_craft: f64,
    pub character_system: f64,
    pub conceptual_strength: f64,
    pub voice_and_tone: f64,
}

/// Trap tier from the false-positive check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum TrapTier {
    Fundamental,
    Addressable,
    Warning,
}

impl TrapTier {
    pub fn parse_lenient(raw: &str) -> Self {
        match raw.trim().to_lowercase().as_str() {
            "fundamental" => Self::Fundamental,
            "addressable" => Self::Addressable,
            _ => Self::Warning,
        }
    }

    /// Verdict-adjustment weight for this tier.
    pub const fn weight(&self) -> f64 {
        match self {
            Self::Fundamental => 1.0,
            Self::Addressable => 0.5,
            Self::Warning => 0.0,
        }
    }
}

/// A trap that fired, with the weight it contributed after escalation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct TriggeredTrap {
    pub name: String,
    pub tier: TrapTier,
    pub weight: f64,
}

/// Source file metadata carried onto the canonical record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema, Default)]
pub struct FileMeta {
    pub filename: String,
    pub page_count: u32,
    pub word_count: u32,
}

/// The canonical screenplay record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Screenplay {
    /// URL-safe id derived from the source filename
    pub id: String,

    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,

    /// Canonical genre form (see `genre::canonical_genre`)
    pub genre: String,
    pub subgenres: Vec<String>,
    pub themes: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub logline: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tone: Option<String>,

    pub collection: Collection,
    /// Free-form category label; defaults to "OTHER"
    pub category: String,

    pub recommendation: Recommendation,
    /// Derived: `recommendation == FilmNow`
    pub is_film_now: bool,

    /// Weighted quality score in [0, 10]
    pub weighted_score: f64,
    /// Weighted score after the clamped critical-failure penalty
    pub adjusted_score: f64,

    /// Commercial Viability Score total (0-18). Informational only.
    pub cvs_total: i64,

    pub dimension_scores: DimensionScores,
    /// Justifications keyed by dimension key (V5) or pillar key (V6)
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub dimension_notes: BTreeMap<String, String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pillar_scores: Option<PillarScores>,

    /// Flat display list; always populated alongside the structured details
    pub critical_failures: Vec<String>,
    pub critical_failure_details: Vec<CriticalFailureDetail>,
    /// Clamped penalty sum, always in [-3.0, 0.0]
    pub critical_failure_total_penalty: f64,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub triggered_traps: Vec<TriggeredTrap>,

    /// `None` until the external producer pass has scored this record
    pub producer_metrics: Option<ProducerMetrics>,

    pub budget_category: BudgetCategory,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub tmdb_status: Option<TmdbStatus>,

    pub strengths: Vec<String>,
    pub weaknesses: Vec<String>,
    pub development_notes: Vec<String>,

    /// Which raw schema produced this record
    pub schema: SchemaVersion,

    pub file: FileMeta,
}

impl Screenplay {
    /// Title key used for cross-schema de-duplication: trimmed,
    /// case-insensitive.
    pub fn title_key(&self) -> String {
        self.title.trim().to_lowercase()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recommendation_parse_separator_insensitive() {
        assert_eq!(Recommendation::parse_lenient("film_now"), Recommendation::FilmNow);
        assert_eq!(Recommendation::parse_lenient("Film-Now"), Recommendation::FilmNow);
        assert_eq!(Recommendation::parse_lenient("FILM NOW"), Recommendation::FilmNow);
        assert_eq!(Recommendation::parse_lenient("  recommend "), Recommendation::Recommend);
        assert_eq!(Recommendation::parse_lenient("Consider"), Recommendation::Consider);
        assert_eq!(Recommendation::parse_lenient("pass"), Recommendation::Pass);
    }

    #[test]
    fn test_recommendation_unrecognized_falls_back_to_pass() {
        assert_eq!(Recommendation::parse_lenient("strong maybe"), Recommendation::Pass);
        assert_eq!(Recommendation::parse_lenient(""), Recommendation::Pass);
    }

    #[test]
    fn test_recommendation_sort_rank_order() {
        assert!(Recommendation::FilmNow.sort_rank() < Recommendation::Recommend.sort_rank());
        assert!(Recommendation::Recommend.sort_rank() < Recommendation::Consider.sort_rank());
        assert!(Recommendation::Consider.sort_rank() < Recommendation::Pass.sort_rank());
    }

    #[test]
    fn test_recommendation_downgrade_floors_at_pass() {
        assert_eq!(Recommendation::FilmNow.downgraded(), Recommendation::Recommend);
        assert_eq!(Recommendation::Pass.downgraded(), Recommendation::Pass);
    }

    #[test]
    fn test_budget_keyword_matching() {
        assert_eq!(BudgetCategory::parse_lenient("medium ($30-60M)"), BudgetCategory::Medium);
        assert_eq!(BudgetCategory::parse_lenient("Micro-budget"), BudgetCategory::Micro);
        assert_eq!(BudgetCategory::parse_lenient("LOW (under $5M)"), BudgetCategory::Low);
        assert_eq!(BudgetCategory::parse_lenient("high / tentpole"), BudgetCategory::High);
        assert_eq!(BudgetCategory::parse_lenient("tbd"), BudgetCategory::Unknown);
    }

    #[test]
    fn test_severity_penalties() {
        assert_eq!(Severity::Minor.default_penalty(), -0.3);
        assert_eq!(Severity::Moderate.default_penalty(), -0.5);
        assert_eq!(Severity::Major.default_penalty(), -0.8);
        assert_eq!(Severity::Critical.default_penalty(), -1.2);
        assert_eq!(Severity::parse_lenient("weird"), Severity::Major);
    }

    #[test]
    fn test_trap_tier_weights() {
        assert_eq!(TrapTier::Fundamental.weight(), 1.0);
        assert_eq!(TrapTier::Addressable.weight(), 0.5);
        assert_eq!(TrapTier::Warning.weight(), 0.0);
    }

    #[test]
    fn test_collection_labels() {
        assert_eq!(Collection::from_label("Submissions"), Collection::Submissions);
        assert_eq!(Collection::from_label("competition"), Collection::Contest);
        assert_eq!(Collection::from_label("misc"), Collection::Other);
    }
}
