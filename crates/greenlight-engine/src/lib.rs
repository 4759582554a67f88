//! The deterministic core of the Greenlight backend.
//!
//! This crate provides:
//! - Normalization of raw V5/V6 analysis JSON into canonical records
//! - The rubric arithmetic (weighted scores, penalties, verdict tiers)
//! - False-positive trap detection and verdict adjustment
//! - Pure filter/sort functions over the canonical collection
//!
//! Everything here is synchronous, pure computation: same inputs, same
//! outputs, no I/O, no shared state.

pub mod filter;
pub mod normalize;
pub mod rubric;
pub mod sort;
pub mod traps;

// Re-export common types
pub use filter::{filter, matches, FilterState, RangeFilter};
pub use normalize::{
    dedup_by_title, ensure_unique_ids, normalize, normalize_batch, NormalizeError, NormalizeResult,
};
pub use rubric::{evaluate, penalty_total, RubricOutcome, SubScores, PENALTY_FLOOR};
pub use sort::{sort, SortDirection, SortField, SortSpec};
pub use traps::{adjust_verdict, detect, weighted_trap_score};
