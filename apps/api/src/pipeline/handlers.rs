//! Axum route handlers for the pipeline API: sync trigger, analyzed
//! candidate listings, question lookup, and dashboard stats.

use axum::extract::{Path, Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};

use super::sync::{trigger_sync, SyncParams, SyncReport};
use super::{analysis_collection, HR_QUESTIONS_COLLECTION};
use crate::errors::AppError;
use crate::intake::identity::{normalize_name, CollectionIdentities};
use crate::state::AppState;
use crate::temporal::{window_for, DateWindow, TimePeriod};

/// POST /api/trigger-candidate-sync
pub async fn handle_trigger_sync(
    State(state): State<AppState>,
    Query(params): Query<SyncParams>,
) -> Result<Json<SyncReport>, AppError> {
    let report = trigger_sync(&state, params).await?;
    Ok(Json(report))
}

#[derive(Debug, Deserialize)]
pub struct CandidatesQuery {
    pub job_title: String,
    #[serde(default)]
    pub time_period: TimePeriod,
    #[serde(default)]
    pub start_date: Option<String>,
    #[serde(default)]
    pub end_date: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct CandidateSummary {
    pub name: String,
    pub score: String,
    pub verdict: String,
    pub email: String,
    pub contact: String,
    pub date: String,
    pub job: String,
}

/// GET /api/candidates
///
/// Analyzed candidates for one job. Rows are hydrated from the source
/// collection's identity cache: missing contacts are backfilled and the
/// source observation date is preferred over the analysis timestamp for
/// window filtering.
pub async fn handle_list_candidates(
    State(state): State<AppState>,
    Query(query): Query<CandidatesQuery>,
) -> Result<Json<Vec<CandidateSummary>>, AppError> {
    let job = query.job_title.trim();
    if job.is_empty() {
        return Err(AppError::Validation("job_title is required".to_string()));
    }
    let window = window_for(
        query.time_period,
        query.start_date.as_deref(),
        query.end_date.as_deref(),
        chrono::Utc::now().date_naive(),
    )?;

    let jobs = state.job_cache.get(state.store.as_ref()).await?;
    let source = if jobs.contains_key(job) {
        job.to_string()
    } else {
        state.config.source_collection.clone()
    };

    let rows = state
        .store
        .read(&format!("{}!A:K", analysis_collection(job)))
        .await?;
    let identities = state
        .identity_cache
        .load(state.store.as_ref(), &source)
        .await?;
    let identities = identities.lock().await;

    Ok(Json(summarize_rows(&rows, &identities, &window)))
}

/// Builds the listing from raw analysis rows, hydrating from the source
/// collection's identity sets.
fn summarize_rows(
    rows: &[Vec<String>],
    identities: &CollectionIdentities,
    window: &DateWindow,
) -> Vec<CandidateSummary> {
    let cell = |row: &[String], i: usize| row.get(i).cloned().unwrap_or_default();

    rows.iter()
        .skip(1)
        .filter_map(|row| {
            let name = cell(row, 0).trim().to_string();
            if name.is_empty() {
                return None;
            }
            let norm = normalize_name(&name);

            let timestamp = cell(row, 7);
            let date = identities
                .dates
                .get(&norm)
                .cloned()
                .unwrap_or_else(|| timestamp.clone());
            if !window.accepts(&date) {
                return None;
            }

            let mut contact = cell(row, 10);
            if contact.trim().is_empty() {
                if let Some(known) = identities.contact_for(&norm) {
                    contact = known.to_string();
                }
            }

            Some(CandidateSummary {
                name,
                score: cell(row, 1),
                verdict: cell(row, 6),
                email: cell(row, 9),
                contact,
                date,
                job: cell(row, 8),
            })
        })
        .collect()
}

#[derive(Debug, Serialize)]
pub struct QuestionRecord {
    pub date: String,
    pub candidate_name: String,
    pub job: String,
    pub resume_link: String,
    pub questions: Vec<String>,
}

/// GET /api/questions/:candidate_name — latest question set for a
/// candidate, matched case-insensitively.
pub async fn handle_get_questions(
    State(state): State<AppState>,
    Path(candidate_name): Path<String>,
) -> Result<Json<QuestionRecord>, AppError> {
    let rows = state
        .store
        .read(&format!("{HR_QUESTIONS_COLLECTION}!A:E"))
        .await?;
    let wanted = normalize_name(&candidate_name);

    let record = rows
        .iter()
        .skip(1)
        .filter(|row| row.get(1).map(|n| normalize_name(n)) == Some(wanted.clone()))
        .last()
        .map(|row| {
            let cell = |i: usize| row.get(i).cloned().unwrap_or_default();
            QuestionRecord {
                date: cell(0),
                candidate_name: cell(1),
                job: cell(2),
                resume_link: cell(3),
                questions: cell(4)
                    .lines()
                    .map(str::to_string)
                    .filter(|q| !q.trim().is_empty())
                    .collect(),
            }
        });

    record.map(Json).ok_or_else(|| {
        AppError::NotFound(format!("No questions found for '{candidate_name}'"))
    })
}

#[derive(Debug, Serialize)]
pub struct JobStats {
    pub job: String,
    pub received: usize,
    pub processed: usize,
    pub passed: usize,
}

#[derive(Debug, Serialize)]
pub struct DashboardStats {
    pub jobs: Vec<JobStats>,
    pub total_received: usize,
    pub total_processed: usize,
    pub total_passed: usize,
}

/// GET /api/dashboard/stats — per-job funnel counts.
pub async fn handle_dashboard_stats(
    State(state): State<AppState>,
) -> Result<Json<DashboardStats>, AppError> {
    let jobs = state.job_cache.titles(state.store.as_ref()).await?;
    let mut stats = DashboardStats {
        jobs: Vec::new(),
        total_received: 0,
        total_processed: 0,
        total_passed: 0,
    };

    for job in jobs {
        // a job with no sheet yet simply counts zero
        let received = match state.store.read(&format!("{job}!A:A")).await {
            Ok(rows) => rows.len().saturating_sub(1),
            Err(_) => 0,
        };
        let (processed, passed) = match state
            .store
            .read(&format!("{}!A:K", analysis_collection(&job)))
            .await
        {
            Ok(rows) => {
                let processed = rows.len().saturating_sub(1);
                let passed = rows
                    .iter()
                    .skip(1)
                    .filter(|r| r.get(6).map(String::as_str) == Some("PASS"))
                    .count();
                (processed, passed)
            }
            Err(_) => (0, 0),
        };

        stats.total_received += received;
        stats.total_processed += processed;
        stats.total_passed += passed;
        stats.jobs.push(JobStats {
            job,
            received,
            processed,
            passed,
        });
    }
    Ok(Json(stats))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn analysis_rows() -> Vec<Vec<String>> {
        vec![
            vec!["Candidate Name".into(); 11],
            vec![
                "Alice".into(),
                "85".into(),
                "strong".into(),
                "".into(),
                "ok".into(),
                "90%".into(),
                "PASS".into(),
                "2024-06-10T12:00:00Z".into(),
                "SRE".into(),
                "alice@x.com".into(),
                "".into(),
            ],
            vec![
                "Bob".into(),
                "40".into(),
                "".into(),
                "weak".into(),
                "thin".into(),
                "30%".into(),
                "FAIL".into(),
                "2024-06-12T12:00:00Z".into(),
                "SRE".into(),
                "".into(),
                "+1-555".into(),
            ],
        ]
    }

    fn identities() -> CollectionIdentities {
        let rows = vec![
            vec!["Source".into(), "Date".into(), "Name".into(), "Contact".into()],
            vec![
                "Drive: a.pdf".into(),
                "2024-06-01".into(),
                "Alice".into(),
                "+91-9999999999".into(),
            ],
        ];
        CollectionIdentities::from_rows(&rows)
    }

    #[test]
    fn test_summarize_hydrates_contact_and_date() {
        let out = summarize_rows(&analysis_rows(), &identities(), &DateWindow::unbounded());
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].contact, "+91-9999999999");
        assert_eq!(out[0].date, "2024-06-01");
        // no identity row for Bob: analysis timestamp and own contact stand
        assert_eq!(out[1].date, "2024-06-12T12:00:00Z");
        assert_eq!(out[1].contact, "+1-555");
    }

    #[test]
    fn test_summarize_window_uses_source_date() {
        let window = DateWindow {
            min: NaiveDate::from_ymd_opt(2024, 6, 11),
            max: None,
        };
        let out = summarize_rows(&analysis_rows(), &identities(), &window);
        // Alice's source date 2024-06-01 is before the bound even though
        // her analysis timestamp is not
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].name, "Bob");
    }
}
