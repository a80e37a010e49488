//! Axum route handlers for interview scheduling.

use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};
use tracing::{error, info};

use super::status_indicates_failure;
use crate::errors::AppError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ScheduleRequest {
    pub candidate_name: String,
    pub candidate_email: String,
    pub job_title: String,
    #[serde(default)]
    pub fixed_date: Option<String>,
    #[serde(default)]
    pub fixed_time: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ScheduleResponse {
    pub candidate_name: String,
    pub status: String,
}

/// POST /api/schedule-interview
pub async fn handle_schedule(
    State(state): State<AppState>,
    Json(req): Json<ScheduleRequest>,
) -> Result<Json<ScheduleResponse>, AppError> {
    validate(&req)?;
    let status = schedule_one(&state, &req).await?;
    if status_indicates_failure(&status) {
        error!(candidate = %req.candidate_name, status = %status, "scheduling failed");
        return Err(AppError::Internal(anyhow::anyhow!(status)));
    }
    Ok(Json(ScheduleResponse {
        candidate_name: req.candidate_name,
        status,
    }))
}

#[derive(Debug, Deserialize)]
pub struct BatchScheduleRequest {
    pub candidates: Vec<ScheduleRequest>,
}

#[derive(Debug, Serialize)]
pub struct BatchScheduleItem {
    pub candidate_name: String,
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// POST /api/schedule-interview/batch
///
/// Schedules sequentially; one candidate's failure never blocks the rest.
pub async fn handle_schedule_batch(
    State(state): State<AppState>,
    Json(req): Json<BatchScheduleRequest>,
) -> Result<Json<Vec<BatchScheduleItem>>, AppError> {
    let mut items = Vec::with_capacity(req.candidates.len());
    for candidate in req.candidates {
        let name = candidate.candidate_name.clone();
        let item = match validate(&candidate) {
            Err(e) => BatchScheduleItem {
                candidate_name: name,
                status: "invalid".to_string(),
                error: Some(e.to_string()),
            },
            Ok(()) => match schedule_one(&state, &candidate).await {
                Ok(status) if status_indicates_failure(&status) => BatchScheduleItem {
                    candidate_name: name,
                    status: "failed".to_string(),
                    error: Some(status),
                },
                Ok(status) => BatchScheduleItem {
                    candidate_name: name,
                    status,
                    error: None,
                },
                Err(e) => BatchScheduleItem {
                    candidate_name: name,
                    status: "failed".to_string(),
                    error: Some(e.to_string()),
                },
            },
        };
        items.push(item);
    }
    info!(
        total = items.len(),
        failed = items.iter().filter(|i| i.error.is_some()).count(),
        "batch scheduling complete"
    );
    Ok(Json(items))
}

fn validate(req: &ScheduleRequest) -> Result<(), AppError> {
    if req.candidate_name.trim().is_empty() {
        return Err(AppError::Validation(
            "candidate_name is required".to_string(),
        ));
    }
    if !req.candidate_email.contains('@') {
        return Err(AppError::Validation(format!(
            "Invalid candidate email: '{}'",
            req.candidate_email
        )));
    }
    Ok(())
}

async fn schedule_one(state: &AppState, req: &ScheduleRequest) -> Result<String, AppError> {
    let status = state
        .scheduler
        .schedule(
            req.candidate_name.trim(),
            req.candidate_email.trim(),
            req.job_title.trim(),
            req.fixed_date.as_deref(),
            req.fixed_time.as_deref(),
        )
        .await?;
    Ok(status)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn req(email: &str) -> ScheduleRequest {
        ScheduleRequest {
            candidate_name: "Alice".to_string(),
            candidate_email: email.to_string(),
            job_title: "SRE".to_string(),
            fixed_date: None,
            fixed_time: None,
        }
    }

    #[test]
    fn test_validate_rejects_bad_email() {
        assert!(validate(&req("not-an-email")).is_err());
        assert!(validate(&req("a@b.co")).is_ok());
    }

    #[test]
    fn test_validate_rejects_blank_name() {
        let mut r = req("a@b.co");
        r.candidate_name = "  ".to_string();
        assert!(validate(&r).is_err());
    }
}
