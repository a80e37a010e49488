//! Candidate sync: scans the candidate collections and enqueues a pipeline
//! run for every candidate not yet analyzed.

use std::collections::{HashMap, HashSet};

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::context::{CandidateProfile, PipelineContext};
use super::{analysis_collection, HR_QUESTIONS_COLLECTION, QUESTION_HEADERS};
use crate::errors::AppError;
use crate::intake::identity::normalize_name;
use crate::jobs::jd::resolve_job_title;
use crate::state::AppState;
use crate::store::{strip_formula_prefix, TabularStore};
use crate::temporal::{window_for, TimePeriod};

#[derive(Debug, Default, Deserialize)]
pub struct SyncParams {
    #[serde(default)]
    pub job_title_filter: Option<String>,
    #[serde(default)]
    pub time_period: TimePeriod,
    #[serde(default)]
    pub start_date: Option<String>,
    #[serde(default)]
    pub end_date: Option<String>,
}

#[derive(Debug, Default, Serialize)]
pub struct SyncReport {
    pub message: String,
    pub triggered: usize,
    pub skipped_processed: usize,
    pub skipped_outside_window: usize,
    pub errors: Vec<String>,
}

/// One parsed candidate row: profile, raw job cell, resume link, date cell.
struct SourceRow {
    profile: CandidateProfile,
    raw_job: String,
    resume_link: String,
    date: String,
}

/// Scans candidate collections and enqueues pipeline runs. Returns counts;
/// the runs themselves happen on the dispatcher.
pub async fn trigger_sync(state: &AppState, params: SyncParams) -> Result<SyncReport, AppError> {
    let window = window_for(
        params.time_period,
        params.start_date.as_deref(),
        params.end_date.as_deref(),
        Utc::now().date_naive(),
    )?;

    state
        .store
        .ensure_collection(HR_QUESTIONS_COLLECTION, Some(&QUESTION_HEADERS))
        .await?;
    let jobs = state.job_cache.get(state.store.as_ref()).await?;

    let filter = params
        .job_title_filter
        .as_deref()
        .map(str::trim)
        .filter(|f| !f.is_empty());
    let sheets: Vec<String> = match filter {
        Some(f) => vec![f.to_string()],
        None => {
            let mut sheets = vec![state.config.source_collection.clone()];
            let mut titles: Vec<String> = jobs.keys().cloned().collect();
            titles.sort();
            for t in titles {
                if t != state.config.source_collection {
                    sheets.push(t);
                }
            }
            sheets
        }
    };

    let mut report = SyncReport::default();
    // analysis collection -> normalized names already scored
    let mut processed: HashMap<String, HashSet<String>> = HashMap::new();
    let mut seen_this_run: HashSet<String> = HashSet::new();

    for sheet in &sheets {
        let rows = match state.store.read(&format!("{sheet}!A:K")).await {
            Ok(rows) => rows,
            Err(e) => {
                warn!(sheet = %sheet, error = %e, "candidate collection unreadable");
                report
                    .errors
                    .push(format!("Collection '{sheet}': read failed: {e}"));
                continue;
            }
        };

        for row in &rows {
            let Some(source) = parse_source_row(row) else {
                continue;
            };
            if !window.accepts(&source.date) {
                report.skipped_outside_window += 1;
                continue;
            }

            // a row's own job cell wins; the sheet name is the fallback
            let job_ref = if source.raw_job.trim().is_empty() {
                sheet.as_str()
            } else {
                source.raw_job.as_str()
            };
            // unresolved titles still flow through under their raw name;
            // the scoring gate persists a deterministic FAIL for them
            let job = match resolve_job_title(job_ref, &jobs) {
                Some((known, _)) => known.clone(),
                None => job_ref.to_string(),
            };

            let norm = normalize_name(&source.profile.name);
            if !processed.contains_key(&job) {
                let names =
                    processed_names(state.store.as_ref(), &analysis_collection(&job)).await;
                processed.insert(job.clone(), names);
            }
            if processed[&job].contains(&norm) || !seen_this_run.insert(norm) {
                report.skipped_processed += 1;
                continue;
            }

            let ctx = PipelineContext::new(source.profile, job, source.resume_link);
            if state.queue.enqueue(ctx) {
                report.triggered += 1;
            }
        }
    }

    report.message = format!(
        "Triggered {} candidate(s) across {} collection(s)",
        report.triggered,
        sheets.len()
    );
    info!(
        triggered = report.triggered,
        skipped_processed = report.skipped_processed,
        skipped_outside_window = report.skipped_outside_window,
        "candidate sync dispatched"
    );
    Ok(report)
}

/// Parses one candidate collection row. Returns `None` for the header row,
/// truncated rows, and rows without a name.
fn parse_source_row(row: &[String]) -> Option<SourceRow> {
    if row.len() < 3 {
        return None;
    }
    if row[0].trim().eq_ignore_ascii_case("source") {
        return None;
    }
    let name = strip_formula_prefix(&row[2]).trim().to_string();
    if name.is_empty() {
        return None;
    }

    let cell = |i: usize| row.get(i).cloned().unwrap_or_default();
    Some(SourceRow {
        profile: CandidateProfile {
            name,
            contact: strip_formula_prefix(&cell(3)).trim().to_string(),
            qualification: cell(4),
            position: cell(5),
            experience: cell(6),
            skills: cell(7),
            projects: cell(8),
        },
        raw_job: cell(9),
        resume_link: cell(10),
        date: cell(1),
    })
}

/// Names already present in an analysis collection. A missing collection
/// just means nothing has been analyzed yet.
async fn processed_names(store: &dyn TabularStore, collection: &str) -> HashSet<String> {
    match store.read(&format!("{collection}!A:A")).await {
        Ok(rows) => rows
            .iter()
            .skip(1)
            .filter_map(|r| r.first())
            .map(|n| normalize_name(n))
            .filter(|n| !n.is_empty())
            .collect(),
        Err(_) => HashSet::new(),
    }
}
