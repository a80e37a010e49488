//! Axum route handlers for the jobs API.

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};

use crate::errors::AppError;
use crate::jobs::jd::{extract_and_store_jd, JdRequirements};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct JdSubmission {
    pub jd_text: String,
}

#[derive(Debug, Serialize)]
pub struct JobDetail {
    pub job_title: String,
    pub description: String,
    pub skills: String,
    pub notes: String,
}

/// POST /api/submit-jd
///
/// Extracts structured requirements from raw JD text, persists the profile
/// row, and invalidates the cache so the new job appears immediately.
pub async fn handle_submit_jd(
    State(state): State<AppState>,
    Json(req): Json<JdSubmission>,
) -> Result<Json<JdRequirements>, AppError> {
    if req.jd_text.trim().is_empty() {
        return Err(AppError::Validation("jd_text cannot be empty".to_string()));
    }

    let requirements = extract_and_store_jd(&state.llm, state.store.as_ref(), &req.jd_text).await?;
    state.job_cache.invalidate().await;
    Ok(Json(requirements))
}

/// GET /api/jobs — sorted job titles from the cached profile map.
pub async fn handle_list_jobs(
    State(state): State<AppState>,
) -> Result<Json<Vec<String>>, AppError> {
    let titles = state.job_cache.titles(state.store.as_ref()).await?;
    Ok(Json(titles))
}

/// GET /api/jobs/details — full profiles for the dashboard.
pub async fn handle_job_details(
    State(state): State<AppState>,
) -> Result<Json<Vec<JobDetail>>, AppError> {
    let jobs = state.job_cache.get(state.store.as_ref()).await?;
    let mut details: Vec<JobDetail> = jobs
        .into_values()
        .map(|p| JobDetail {
            job_title: p.title,
            description: p.description,
            skills: p.skills,
            notes: p.top_projects,
        })
        .collect();
    details.sort_by(|a, b| a.job_title.cmp(&b.job_title));
    Ok(Json(details))
}
