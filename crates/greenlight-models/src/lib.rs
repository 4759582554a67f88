//! Shared data models for the Greenlight backend.
//!
//! This crate provides Serde-serializable types for:
//! - Raw LLM analysis wire formats (V5 flat-dimension, V6 pillar/lens)
//! - The canonical screenplay record and its enums
//! - The version-aware dimension display adapter
//! - Id derivation and numeric coercion utilities

pub mod dimensions;
pub mod genre;
pub mod raw;
pub mod screenplay;
pub mod utils;

// Re-export common types
pub use dimensions::{dimension_display, DimensionDisplay};
pub use genre::{canonical_genre, genres_match};
pub use raw::{
    RawAnalysis, RawAnalysisBodyV5, RawAnalysisBodyV6, RawAnalysisV5, RawAnalysisV6,
    RawAssessmentV5, RawCommercialViability, RawCoreQuality, RawCriticalFailure,
    RawCriticalFailureDetail, RawDimensionScore, RawDimensionsV5, RawFalsePositiveCheck,
    RawFileMetadata, RawLenses, RawPillar, RawProducerMetrics, RawProductionLens,
    RawSubDimension, RawTrapEntry,
};
pub use screenplay::{
    BudgetCategory, Collection, CriticalFailureDetail, DimensionScores, FileMeta, PillarScores,
    ProducerMetrics, Recommendation, SchemaVersion, Screenplay, Severity, TmdbStatus, TrapTier,
    TriggeredTrap,
};
pub use utils::{
    coerce_f64, coerce_i64, screenplay_id_from_filename, LooseNumber, ScreenplayIdError,
    ScreenplayIdResult,
};
