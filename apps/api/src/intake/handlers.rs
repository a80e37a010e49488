//! Axum route handlers for the intake API.

use axum::extract::{Query, State};
use axum::Json;
use serde::Deserialize;
use serde_json::{Map, Value};

use super::import::{import_from_documents, ImportParams, ImportReport};
use crate::errors::AppError;
use crate::state::AppState;
use crate::temporal::{parse_sheet_date, DateWindow};

/// POST /api/import-from-drive
pub async fn handle_import(
    State(state): State<AppState>,
    Query(params): Query<ImportParams>,
) -> Result<Json<ImportReport>, AppError> {
    let report = import_from_documents(&state, params).await?;
    Ok(Json(report))
}

#[derive(Debug, Deserialize)]
pub struct ImportedQuery {
    pub job_title: String,
    #[serde(default)]
    pub start_date: Option<String>,
    #[serde(default)]
    pub end_date: Option<String>,
}

/// GET /api/candidates/imported
///
/// Raw imported rows for one job's collection as header-keyed objects,
/// strictly filtered by the observed-date column when bounds are given.
pub async fn handle_imported_candidates(
    State(state): State<AppState>,
    Query(query): Query<ImportedQuery>,
) -> Result<Json<Vec<Value>>, AppError> {
    let job = query.job_title.trim();
    if job.is_empty() {
        return Err(AppError::Validation("job_title is required".to_string()));
    }

    let window = DateWindow {
        min: query.start_date.as_deref().and_then(parse_sheet_date),
        max: query.end_date.as_deref().and_then(parse_sheet_date),
    };

    let jobs = state.job_cache.get(state.store.as_ref()).await?;
    let collection = if jobs.contains_key(job) {
        job.to_string()
    } else {
        state.config.source_collection.clone()
    };

    let rows = state.store.read(&format!("{collection}!A:K")).await?;
    Ok(Json(rows_as_objects(&rows, &window)))
}

/// Zips the header row into each data row, filtering on the date column.
fn rows_as_objects(rows: &[Vec<String>], window: &DateWindow) -> Vec<Value> {
    let Some(headers) = rows.first() else {
        return Vec::new();
    };

    rows.iter()
        .skip(1)
        .filter(|row| {
            let date = row.get(1).map(String::as_str).unwrap_or("");
            window.accepts(date)
        })
        .map(|row| {
            let mut obj = Map::new();
            for (i, header) in headers.iter().enumerate() {
                obj.insert(
                    header.clone(),
                    Value::String(row.get(i).cloned().unwrap_or_default()),
                );
            }
            Value::Object(obj)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn rows() -> Vec<Vec<String>> {
        vec![
            vec!["Source".into(), "Date".into(), "Name".into()],
            vec!["Drive: a.pdf".into(), "2024-06-01".into(), "Alice".into()],
            vec!["Drive: b.pdf".into(), "".into(), "Bob".into()],
            vec!["Drive: c.pdf".into(), "2024-07-01".into(), "Carol".into()],
        ]
    }

    #[test]
    fn test_rows_as_objects_zips_headers() {
        let objs = rows_as_objects(&rows(), &DateWindow::unbounded());
        assert_eq!(objs.len(), 3);
        assert_eq!(objs[0]["Name"], "Alice");
        assert_eq!(objs[0]["Source"], "Drive: a.pdf");
    }

    #[test]
    fn test_rows_as_objects_strict_window() {
        let window = DateWindow {
            min: NaiveDate::from_ymd_opt(2024, 6, 1),
            max: NaiveDate::from_ymd_opt(2024, 6, 30),
        };
        let objs = rows_as_objects(&rows(), &window);
        // dated-out-of-range and missing-date rows both drop
        assert_eq!(objs.len(), 1);
        assert_eq!(objs[0]["Name"], "Alice");
    }

    #[test]
    fn test_rows_as_objects_empty_input() {
        assert!(rows_as_objects(&[], &DateWindow::unbounded()).is_empty());
    }
}
