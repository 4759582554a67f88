//! CSV export: a pure projection of the current filtered view.

use axum::extract::{Query, State};
use axum::http::header;
use axum::response::IntoResponse;

use greenlight_engine::{filter, sort};
use greenlight_models::Screenplay;

use crate::error::ApiResult;
use crate::handlers::screenplays::ListQuery;
use crate::state::AppState;

const CSV_HEADER: &str = "id,title,author,genre,subgenres,themes,collection,category,\
recommendation,is_film_now,weighted_score,adjusted_score,cvs_total,budget_category,\
critical_failure_total_penalty,critical_failures,page_count,word_count,schema";

/// Export the current filtered/sorted view as CSV, one flattened row per
/// screenplay. Carries no business logic beyond the projection.
pub async fn export_csv(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> ApiResult<impl IntoResponse> {
    let catalog = state.catalog.read().await;
    let filtered = filter(&catalog.screenplays, &query.filter_state());
    let rows = sort(&filtered, &query.sort_specs(), query.pin_film_now());

    let mut csv = String::with_capacity(rows.len() * 160 + CSV_HEADER.len());
    csv.push_str(CSV_HEADER);
    csv.push('\n');
    for screenplay in &rows {
        csv.push_str(&csv_row(screenplay));
        csv.push('\n');
    }

    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (
                header::CONTENT_DISPOSITION,
                "attachment; filename=\"screenplays.csv\"".to_string(),
            ),
        ],
        csv,
    ))
}

fn csv_row(sp: &Screenplay) -> String {
    let fields = [
        sp.id.clone(),
        sp.title.clone(),
        sp.author.clone().unwrap_or_default(),
        sp.genre.clone(),
        sp.subgenres.join(";"),
        sp.themes.join(";"),
        sp.collection.as_str().to_string(),
        sp.category.clone(),
        sp.recommendation.as_str().to_string(),
        sp.is_film_now.to_string(),
        format!("{:.2}", sp.weighted_score),
        format!("{:.2}", sp.adjusted_score),
        sp.cvs_total.to_string(),
        sp.budget_category.as_str().to_string(),
        format!("{:.2}", sp.critical_failure_total_penalty),
        sp.critical_failures.join(";"),
        sp.file.page_count.to_string(),
        sp.file.word_count.to_string(),
        format!("{:?}", sp.schema).to_lowercase(),
    ];

    fields
        .iter()
        .map(|f| csv_escape(f))
        .collect::<Vec<_>>()
        .join(",")
}

/// Quote a field when it contains a delimiter, quote, or newline.
fn csv_escape(field: &str) -> String {
    if field.contains(',') || field.contains('"') || field.contains('\n') {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_csv_escape() {
        assert_eq!(csv_escape("plain"), "plain");
        assert_eq!(csv_escape("a,b"), "\"a,b\"");
        assert_eq!(csv_escape("say \"hi\""), "\"say \"\"hi\"\"\"");
    }

    #[test]
    fn test_header_and_row_column_counts_match() {
        let columns = CSV_HEADER.split(',').count();
        assert_eq!(columns, 19);
    }
}
