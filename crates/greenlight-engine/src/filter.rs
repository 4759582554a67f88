//! Pure filter predicates over the canonical collection.
//!
//! Filter state arrives as an explicit parameter; the engine holds no
//! session state and never mutates its input.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use greenlight_models::{canonical_genre, BudgetCategory, Collection, Recommendation, Screenplay};

/// An inclusive numeric range filter.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct RangeFilter {
    pub min: f64,
    pub max: f64,
}

impl RangeFilter {
    pub fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    /// Inclusive on both bounds.
    pub fn contains(&self, value: f64) -> bool {
        value >= self.min && value <= self.max
    }
}

/// Filter configuration. Every dimension is independently enable/disable-able:
/// an empty list or `None` disables that dimension entirely.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct FilterState {
    /// Full-text search query; blank matches everything
    #[serde(default)]
    pub search: String,

    /// Recommendation tier membership
    #[serde(default)]
    pub tiers: Vec<Recommendation>,

    /// Budget tier membership
    #[serde(default)]
    pub budgets: Vec<BudgetCategory>,

    /// Collection membership
    #[serde(default)]
    pub collections: Vec<Collection>,

    /// Genre membership, OR-matched in canonical form against genre and
    /// subgenres
    #[serde(default)]
    pub genres: Vec<String>,

    /// Theme membership, OR-matched in canonical form
    #[serde(default)]
    pub themes: Vec<String>,

    /// Weighted-score range
    #[serde(default)]
    pub score_range: Option<RangeFilter>,

    /// CVS total range
    #[serde(default)]
    pub cvs_range: Option<RangeFilter>,

    /// Page-count range
    #[serde(default)]
    pub page_range: Option<RangeFilter>,
}

impl FilterState {
    /// True when no dimension is enabled (everything passes).
    pub fn is_empty(&self) -> bool {
        self.search.trim().is_empty()
            && self.tiers.is_empty()
            && self.budgets.is_empty()
            && self.collections.is_empty()
            && self.genres.is_empty()
            && self.themes.is_empty()
            && self.score_range.is_none()
            && self.cvs_range.is_none()
            && self.page_range.is_none()
    }
}

/// Apply every enabled filter dimension with AND semantics.
///
/// Returns a new vector; the input and its elements are untouched.
pub fn filter(screenplays: &[Screenplay], state: &FilterState) -> Vec<Screenplay> {
    screenplays
        .iter()
        .filter(|sp| matches(sp, state))
        .cloned()
        .collect()
}

/// A record must pass every enabled dimension.
pub fn matches(sp: &Screenplay, state: &FilterState) -> bool {
    if !matches_search(sp, &state.search) {
        return false;
    }

    if !state.tiers.is_empty() && !state.tiers.contains(&sp.recommendation) {
        return false;
    }

    if !state.budgets.is_empty() && !state.budgets.contains(&sp.budget_category) {
        return false;
    }

    if !state.collections.is_empty() && !state.collections.contains(&sp.collection) {
        return false;
    }

    if !state.genres.is_empty() {
        let wanted: Vec<String> = state.genres.iter().map(|g| canonical_genre(g)).collect();
        let has = wanted.iter().any(|g| {
            sp.genre == *g || sp.subgenres.iter().any(|s| s == g)
        });
        if !has {
            return false;
        }
    }

    if !state.themes.is_empty() {
        let wanted: Vec<String> = state.themes.iter().map(|t| canonical_genre(t)).collect();
        if !wanted.iter().any(|t| sp.themes.iter().any(|s| s == t)) {
            return false;
        }
    }

    if let Some(range) = &state.score_range {
        if !range.contains(sp.weighted_score) {
            return false;
        }
    }

    if let Some(range) = &state.cvs_range {
        if !range.contains(sp.cvs_total as f64) {
            return false;
        }
    }

    if let Some(range) = &state.page_range {
        if !range.contains(sp.file.page_count as f64) {
            return false;
        }
    }

    true
}

/// Case-insensitive substring match across the denormalized text fields.
/// Empty or whitespace-only queries match everything.
fn matches_search(sp: &Screenplay, query: &str) -> bool {
    let query = query.trim().to_lowercase();
    if query.is_empty() {
        return true;
    }

    let haystacks = [
        Some(sp.title.as_str()),
        sp.author.as_deref(),
        Some(sp.genre.as_str()),
        sp.logline.as_deref(),
    ];

    if haystacks
        .into_iter()
        .flatten()
        .any(|text| text.to_lowercase().contains(&query))
    {
        return true;
    }

    sp.subgenres
        .iter()
        .chain(sp.themes.iter())
        .any(|text| text.to_lowercase().contains(&query))
}

#[cfg(test)]
mod tests {
    use super::*;
    use greenlight_models::{DimensionScores, FileMeta, SchemaVersion};

    fn screenplay(title: &str, rec: Recommendation, score: f64) -> Screenplay {
        Screenplay {
            id: title.to_lowercase().replace(' ', "-"),
            title: title.to_string(),
            author: Some("A. Writer".to_string()),
            genre: "thriller".to_string(),
            subgenres: vec!["neo-noir".to_string()],
            themes: vec!["guilt".to_string()],
            logline: Some("A night-shift nurse covers up a death.".to_string()),
            tone: None,
            collection: Collection::Submissions,
            category: "OTHER".to_string(),
            recommendation: rec,
            is_film_now: rec == Recommendation::FilmNow,
            weighted_score: score,
            adjusted_score: score,
            cvs_total: 12,
            dimension_scores: DimensionScores::default(),
            dimension_notes: Default::default(),
            pillar_scores: None,
            critical_failures: vec![],
            critical_failure_details: vec![],
            critical_failure_total_penalty: 0.0,
            triggered_traps: vec![],
            producer_metrics: None,
            budget_category: BudgetCategory::Medium,
            tmdb_status: None,
            strengths: vec![],
            weaknesses: vec![],
            development_notes: vec![],
            schema: SchemaVersion::V5,
            file: FileMeta {
                filename: "test.json".to_string(),
                page_count: 100,
                word_count: 20000,
            },
        }
    }

    #[test]
    fn test_empty_state_matches_everything() {
        let set = vec![
            screenplay("Alpha", Recommendation::Pass, 4.0),
            screenplay("Beta", Recommendation::Recommend, 8.0),
        ];
        assert_eq!(filter(&set, &FilterState::default()).len(), 2);
    }

    #[test]
    fn test_search_is_case_insensitive_and_spans_fields() {
        let set = vec![screenplay("Night Shift", Recommendation::Consider, 6.0)];

        for query in ["night", "NIGHT", "nurse", "guilt", "neo-noir", "writer"] {
            let state = FilterState {
                search: query.to_string(),
                ..Default::default()
            };
            assert_eq!(filter(&set, &state).len(), 1, "query {:?}", query);
        }

        let state = FilterState {
            search: "submarine".to_string(),
            ..Default::default()
        };
        assert!(filter(&set, &state).is_empty());
    }

    #[test]
    fn test_whitespace_query_matches_everything() {
        let set = vec![screenplay("Alpha", Recommendation::Pass, 4.0)];
        let state = FilterState {
            search: "   ".to_string(),
            ..Default::default()
        };
        assert_eq!(filter(&set, &state).len(), 1);
    }

    #[test]
    fn test_enabled_dimensions_are_anded() {
        let set = vec![
            screenplay("Alpha", Recommendation::Recommend, 8.0),
            screenplay("Beta", Recommendation::Recommend, 5.0),
            screenplay("Gamma", Recommendation::Pass, 8.0),
        ];

        let state = FilterState {
            tiers: vec![Recommendation::Recommend],
            score_range: Some(RangeFilter::new(7.0, 10.0)),
            ..Default::default()
        };

        let out = filter(&set, &state);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].title, "Alpha");
    }

    #[test]
    fn test_range_bounds_are_inclusive() {
        let set = vec![screenplay("Edge", Recommendation::Consider, 7.0)];
        let state = FilterState {
            score_range: Some(RangeFilter::new(7.0, 7.0)),
            ..Default::default()
        };
        assert_eq!(filter(&set, &state).len(), 1);
    }

    #[test]
    fn test_genre_filter_matches_canonical_variants() {
        let set = vec![screenplay("Noir Thing", Recommendation::Consider, 6.0)];
        // Stored as "neo-noir"; the filter spells it differently
        let state = FilterState {
            genres: vec!["NeoNoir".to_string()],
            ..Default::default()
        };
        assert_eq!(filter(&set, &state).len(), 1);
    }

    #[test]
    fn test_filter_does_not_mutate_input() {
        let set = vec![screenplay("Alpha", Recommendation::Pass, 4.0)];
        let before = set.clone();
        let state = FilterState {
            tiers: vec![Recommendation::Recommend],
            ..Default::default()
        };
        let _ = filter(&set, &state);
        assert_eq!(set, before);
    }
}
