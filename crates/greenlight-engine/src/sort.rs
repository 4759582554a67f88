//! Multi-column sorting with a pinned film-now tier.
//!
//! Provides type-safe sort configuration applied as successive tie-breakers
//! over the canonical collection.

use std::cmp::Ordering;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use greenlight_models::Screenplay;

// ============================================================================
// Sort Configuration
// ============================================================================

/// Supported sort fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "snake_case")]
pub enum SortField {
    /// Sort by weighted quality score (default)
    #[default]
    WeightedScore,
    /// Sort by penalty-adjusted score
    AdjustedScore,
    /// Sort by title (case-insensitive)
    Title,
    /// Sort by author (case-insensitive)
    Author,
    /// Sort by recommendation tier, in rubric order
    Recommendation,
    /// Sort by CVS total
    CvsTotal,
    /// Sort by page count
    PageCount,
}

impl SortField {
    /// Parse from string, returning default if invalid.
    pub fn from_str_or_default(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "score" | "weighted_score" => Self::WeightedScore,
            "adjusted" | "adjusted_score" => Self::AdjustedScore,
            "title" => Self::Title,
            "author" => Self::Author,
            "recommendation" | "tier" => Self::Recommendation,
            "cvs" | "cvs_total" => Self::CvsTotal,
            "pages" | "page_count" => Self::PageCount,
            _ => Self::WeightedScore,
        }
    }
}

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "snake_case")]
pub enum SortDirection {
    Ascending,
    #[default]
    Descending,
}

impl SortDirection {
    /// Parse from string, returning default if invalid.
    pub fn from_str_or_default(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "asc" | "ascending" => Self::Ascending,
            _ => Self::Descending,
        }
    }
}

/// One sort column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema, Default)]
pub struct SortSpec {
    pub field: SortField,
    pub direction: SortDirection,
}

impl SortSpec {
    pub fn new(field: SortField, direction: SortDirection) -> Self {
        Self { field, direction }
    }
}

// ============================================================================
// Comparison
// ============================================================================

/// A resolved comparison key: numeric fields compare numerically, string
/// fields compare lower-cased.
enum SortKey {
    Num(f64),
    Str(String),
}

fn key_for(sp: &Screenplay, field: SortField) -> SortKey {
    match field {
        SortField::WeightedScore => SortKey::Num(sp.weighted_score),
        SortField::AdjustedScore => SortKey::Num(sp.adjusted_score),
        SortField::Title => SortKey::Str(sp.title.to_lowercase()),
        SortField::Author => {
            SortKey::Str(sp.author.as_deref().unwrap_or_default().to_lowercase())
        }
        // Rubric order, not alphabetical: film_now < recommend < consider < pass
        SortField::Recommendation => SortKey::Num(sp.recommendation.sort_rank() as f64),
        SortField::CvsTotal => SortKey::Num(sp.cvs_total as f64),
        SortField::PageCount => SortKey::Num(sp.file.page_count as f64),
    }
}

fn compare_keys(a: &SortKey, b: &SortKey) -> Ordering {
    match (a, b) {
        (SortKey::Num(x), SortKey::Num(y)) => x.partial_cmp(y).unwrap_or(Ordering::Equal),
        (SortKey::Str(x), SortKey::Str(y)) => x.cmp(y),
        // Keys for one field are always the same variant
        (SortKey::Num(_), SortKey::Str(_)) => Ordering::Less,
        (SortKey::Str(_), SortKey::Num(_)) => Ordering::Greater,
    }
}

fn compare(a: &Screenplay, b: &Screenplay, specs: &[SortSpec]) -> Ordering {
    for spec in specs {
        let ordering = compare_keys(&key_for(a, spec.field), &key_for(b, spec.field));
        let ordering = match spec.direction {
            SortDirection::Ascending => ordering,
            SortDirection::Descending => ordering.reverse(),
        };
        if ordering != Ordering::Equal {
            return ordering;
        }
    }
    Ordering::Equal
}

/// Sort a collection by the configured columns.
///
/// Returns a new vector; the input is untouched. When `pin_film_now` is
/// set, every film-now record sorts ahead of every other record, and the
/// configured columns still govern the order within each group. The
/// underlying sort is stable, so equal records keep their input order.
pub fn sort(screenplays: &[Screenplay], specs: &[SortSpec], pin_film_now: bool) -> Vec<Screenplay> {
    let default_specs = [SortSpec::default()];
    let specs = if specs.is_empty() {
        &default_specs[..]
    } else {
        specs
    };

    let mut out = screenplays.to_vec();
    out.sort_by(|a, b| {
        if pin_film_now {
            // Pinned records first; bool sorts false < true, so reverse.
            let pinned = b.is_film_now.cmp(&a.is_film_now);
            if pinned != Ordering::Equal {
                return pinned;
            }
        }
        compare(a, b, specs)
    });
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use greenlight_models::{
        BudgetCategory, Collection, DimensionScores, FileMeta, Recommendation, SchemaVersion,
    };

    fn screenplay(title: &str, rec: Recommendation, score: f64) -> Screenplay {
        Screenplay {
            id: title.to_lowercase(),
            title: title.to_string(),
            author: None,
            genre: "drama".to_string(),
            subgenres: vec![],
            themes: vec![],
            logline: None,
            tone: None,
            collection: Collection::Slate,
            category: "OTHER".to_string(),
            recommendation: rec,
            is_film_now: rec == Recommendation::FilmNow,
            weighted_score: score,
            adjusted_score: score,
            cvs_total: 0,
            dimension_scores: DimensionScores::default(),
            dimension_notes: Default::default(),
            pillar_scores: None,
            critical_failures: vec![],
            critical_failure_details: vec![],
            critical_failure_total_penalty: 0.0,
            triggered_traps: vec![],
            producer_metrics: None,
            budget_category: BudgetCategory::Unknown,
            tmdb_status: None,
            strengths: vec![],
            weaknesses: vec![],
            development_notes: vec![],
            schema: SchemaVersion::V5,
            file: FileMeta::default(),
        }
    }

    #[test]
    fn test_tie_break_applies_secondary_column() {
        let set = vec![
            screenplay("Zeta", Recommendation::Consider, 7.0),
            screenplay("Alpha", Recommendation::Consider, 7.0),
        ];
        let specs = [
            SortSpec::new(SortField::WeightedScore, SortDirection::Descending),
            SortSpec::new(SortField::Title, SortDirection::Ascending),
        ];
        let out = sort(&set, &specs, false);
        assert_eq!(out[0].title, "Alpha");
        assert_eq!(out[1].title, "Zeta");
    }

    #[test]
    fn test_recommendation_sorts_in_rubric_order() {
        let set = vec![
            screenplay("P", Recommendation::Pass, 9.0),
            screenplay("F", Recommendation::FilmNow, 5.0),
            screenplay("C", Recommendation::Consider, 7.0),
            screenplay("R", Recommendation::Recommend, 6.0),
        ];
        let specs = [SortSpec::new(SortField::Recommendation, SortDirection::Ascending)];
        let out = sort(&set, &specs, false);
        let titles: Vec<&str> = out.iter().map(|s| s.title.as_str()).collect();
        assert_eq!(titles, ["F", "R", "C", "P"]);
    }

    #[test]
    fn test_pin_forces_film_now_first() {
        let set = vec![
            screenplay("High Pass", Recommendation::Pass, 9.5),
            screenplay("Low Film", Recommendation::FilmNow, 6.0),
            screenplay("Mid Pass", Recommendation::Pass, 8.0),
            screenplay("Top Film", Recommendation::FilmNow, 9.0),
        ];
        let specs = [SortSpec::new(SortField::WeightedScore, SortDirection::Descending)];
        let out = sort(&set, &specs, true);
        let titles: Vec<&str> = out.iter().map(|s| s.title.as_str()).collect();
        // Film-now records first, each group internally score-sorted
        assert_eq!(titles, ["Top Film", "Low Film", "High Pass", "Mid Pass"]);
    }

    #[test]
    fn test_unpinned_sort_ignores_film_now() {
        let set = vec![
            screenplay("Low Film", Recommendation::FilmNow, 6.0),
            screenplay("High Pass", Recommendation::Pass, 9.5),
        ];
        let specs = [SortSpec::new(SortField::WeightedScore, SortDirection::Descending)];
        let out = sort(&set, &specs, false);
        assert_eq!(out[0].title, "High Pass");
    }

    #[test]
    fn test_sort_does_not_mutate_input() {
        let set = vec![
            screenplay("B", Recommendation::Pass, 1.0),
            screenplay("A", Recommendation::Pass, 2.0),
        ];
        let before = set.clone();
        let _ = sort(&set, &[SortSpec::default()], false);
        assert_eq!(set, before);
    }

    #[test]
    fn test_field_parsing() {
        assert_eq!(SortField::from_str_or_default("title"), SortField::Title);
        assert_eq!(SortField::from_str_or_default("tier"), SortField::Recommendation);
        assert_eq!(SortField::from_str_or_default("bogus"), SortField::WeightedScore);
        assert_eq!(
            SortDirection::from_str_or_default("asc"),
            SortDirection::Ascending
        );
        assert_eq!(
            SortDirection::from_str_or_default("bogus"),
            SortDirection::Descending
        );
    }
}
