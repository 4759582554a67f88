//! Screenplay listing, detail, and reload handlers.
//!
//! The list endpoint is a thin shell over the pure engine: query-string
//! parameters become a `FilterState` and sort columns, and the handler
//! filters/sorts a snapshot of the canonical set.

use axum::extract::{Path, Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};
use tracing::info;
use validator::Validate;

use greenlight_engine::{filter, sort, FilterState, RangeFilter, SortDirection, SortField, SortSpec};
use greenlight_models::{
    dimension_display, BudgetCategory, Collection, DimensionDisplay, Recommendation, Screenplay,
};
use greenlight_storage::LoadReport;

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

/// Query parameters for listing and exporting.
#[derive(Debug, Default, Deserialize, Validate)]
pub struct ListQuery {
    /// Full-text search query
    #[validate(length(max = 200))]
    pub search: Option<String>,
    /// Comma-separated recommendation tiers
    pub tiers: Option<String>,
    /// Comma-separated budget categories
    pub budgets: Option<String>,
    /// Comma-separated collections
    pub collections: Option<String>,
    /// Comma-separated genres (canonical-form matched)
    pub genres: Option<String>,
    /// Comma-separated themes
    pub themes: Option<String>,
    #[validate(range(min = 0.0, max = 10.0))]
    pub score_min: Option<f64>,
    #[validate(range(min = 0.0, max = 10.0))]
    pub score_max: Option<f64>,
    #[validate(range(min = 0.0, max = 18.0))]
    pub cvs_min: Option<f64>,
    #[validate(range(min = 0.0, max = 18.0))]
    pub cvs_max: Option<f64>,
    pub pages_min: Option<f64>,
    pub pages_max: Option<f64>,
    /// Comma-separated sort columns, `field:direction`
    pub sort: Option<String>,
    /// Pin film-now records to the front
    pub pin_film_now: Option<bool>,
}

impl ListQuery {
    /// Build the engine filter state from the query string.
    pub fn filter_state(&self) -> FilterState {
        FilterState {
            search: self.search.clone().unwrap_or_default(),
            tiers: split(&self.tiers)
                .map(|t| Recommendation::parse_lenient(&t))
                .collect(),
            budgets: split(&self.budgets)
                .map(|b| BudgetCategory::parse_lenient(&b))
                .collect(),
            collections: split(&self.collections)
                .map(|c| Collection::from_label(&c))
                .collect(),
            genres: split(&self.genres).collect(),
            themes: split(&self.themes).collect(),
            score_range: range(self.score_min, self.score_max, 0.0, 10.0),
            cvs_range: range(self.cvs_min, self.cvs_max, 0.0, 18.0),
            page_range: range(self.pages_min, self.pages_max, 0.0, f64::MAX),
        }
    }

    /// Build the sort columns from the query string.
    pub fn sort_specs(&self) -> Vec<SortSpec> {
        split(&self.sort)
            .map(|column| {
                let (field, direction) = column
                    .split_once(':')
                    .unwrap_or((column.as_str(), ""));
                SortSpec::new(
                    SortField::from_str_or_default(field),
                    SortDirection::from_str_or_default(direction),
                )
            })
            .collect()
    }

    pub fn pin_film_now(&self) -> bool {
        self.pin_film_now.unwrap_or(false)
    }
}

fn split(value: &Option<String>) -> impl Iterator<Item = String> + '_ {
    value
        .as_deref()
        .unwrap_or_default()
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

fn range(min: Option<f64>, max: Option<f64>, floor: f64, ceiling: f64) -> Option<RangeFilter> {
    if min.is_none() && max.is_none() {
        return None;
    }
    Some(RangeFilter::new(
        min.unwrap_or(floor),
        max.unwrap_or(ceiling),
    ))
}

/// List response: the filtered view plus its counts.
#[derive(Debug, Serialize)]
pub struct ScreenplayListResponse {
    pub screenplays: Vec<Screenplay>,
    pub filtered_count: usize,
    pub total_count: usize,
}

/// List screenplays with filtering and sorting.
pub async fn list_screenplays(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> ApiResult<Json<ScreenplayListResponse>> {
    query
        .validate()
        .map_err(|e| ApiError::Validation(e.to_string()))?;

    let catalog = state.catalog.read().await;
    let total_count = catalog.total_count();

    let filtered = filter(&catalog.screenplays, &query.filter_state());
    let filtered_count = filtered.len();
    let screenplays = sort(&filtered, &query.sort_specs(), query.pin_film_now());

    Ok(Json(ScreenplayListResponse {
        screenplays,
        filtered_count,
        total_count,
    }))
}

/// Get one screenplay by id.
pub async fn get_screenplay(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Screenplay>> {
    let catalog = state.catalog.read().await;
    catalog
        .screenplays
        .iter()
        .find(|sp| sp.id == id)
        .cloned()
        .map(Json)
        .ok_or_else(|| ApiError::not_found(format!("Screenplay {} not found", id)))
}

/// Get the schema-appropriate dimension display rows for one screenplay.
pub async fn get_dimensions(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Vec<DimensionDisplay>>> {
    let catalog = state.catalog.read().await;
    let screenplay = catalog
        .screenplays
        .iter()
        .find(|sp| sp.id == id)
        .ok_or_else(|| ApiError::not_found(format!("Screenplay {} not found", id)))?;

    Ok(Json(dimension_display(screenplay)))
}

/// Reload response.
#[derive(Debug, Serialize)]
pub struct ReloadResponse {
    pub total_count: usize,
    pub reports: Vec<LoadReport>,
}

/// Re-run the storage loader and replace the canonical set.
pub async fn reload_catalog(State(state): State<AppState>) -> ApiResult<Json<ReloadResponse>> {
    let total_count = state.reload_catalog().await;
    let catalog = state.catalog.read().await;

    info!(records = total_count, "Reload requested via API");
    Ok(Json(ReloadResponse {
        total_count,
        reports: catalog.reports.clone(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_parses_tiers_and_ranges() {
        let query = ListQuery {
            tiers: Some("film_now, recommend".to_string()),
            score_min: Some(7.0),
            ..Default::default()
        };

        let state = query.filter_state();
        assert_eq!(
            state.tiers,
            vec![Recommendation::FilmNow, Recommendation::Recommend]
        );
        let range = state.score_range.unwrap();
        assert_eq!(range.min, 7.0);
        assert_eq!(range.max, 10.0);
        assert!(state.cvs_range.is_none());
    }

    #[test]
    fn test_query_parses_sort_columns() {
        let query = ListQuery {
            sort: Some("weighted_score:desc,title:asc".to_string()),
            ..Default::default()
        };

        let specs = query.sort_specs();
        assert_eq!(specs.len(), 2);
        assert_eq!(specs[0].field, SortField::WeightedScore);
        assert_eq!(specs[0].direction, SortDirection::Descending);
        assert_eq!(specs[1].field, SortField::Title);
        assert_eq!(specs[1].direction, SortDirection::Ascending);
    }

    #[test]
    fn test_empty_query_disables_all_filters() {
        let state = ListQuery::default().filter_state();
        assert!(state.is_empty());
    }
}
