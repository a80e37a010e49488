pub mod health;

use axum::{
    extract::{Request, State},
    http::Method,
    middleware::{self, Next},
    response::Response,
    routing::{get, post},
    Router,
};

use crate::errors::AppError;
use crate::intake::handlers as intake;
use crate::jobs::handlers as jobs;
use crate::notify::handlers as notify;
use crate::pipeline::handlers as pipeline;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(health::health_handler))
        .route("/health", get(health::health_handler))
        // Jobs
        .route("/api/submit-jd", post(jobs::handle_submit_jd))
        .route("/api/jobs", get(jobs::handle_list_jobs))
        .route("/api/jobs/details", get(jobs::handle_job_details))
        // Intake
        .route("/api/import-from-drive", post(intake::handle_import))
        .route(
            "/api/candidates/imported",
            get(intake::handle_imported_candidates),
        )
        // Pipeline
        .route(
            "/api/trigger-candidate-sync",
            post(pipeline::handle_trigger_sync),
        )
        .route("/api/candidates", get(pipeline::handle_list_candidates))
        .route(
            "/api/questions/:candidate_name",
            get(pipeline::handle_get_questions),
        )
        .route("/api/dashboard/stats", get(pipeline::handle_dashboard_stats))
        // Scheduling
        .route("/api/schedule-interview", post(notify::handle_schedule))
        .route(
            "/api/schedule-interview/batch",
            post(notify::handle_schedule_batch),
        )
        .layer(middleware::from_fn_with_state(state.clone(), admin_auth))
        .with_state(state)
}

/// Admin gate: every non-public route requires the `x-admin-password`
/// header when a password is configured. CORS preflights pass through.
async fn admin_auth(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let path = request.uri().path();
    let public = path == "/" || path == "/health" || request.method() == Method::OPTIONS;

    if !public {
        if let Some(expected) = &state.config.admin_password {
            let provided = request
                .headers()
                .get("x-admin-password")
                .and_then(|v| v.to_str().ok());
            if provided != Some(expected.as_str()) {
                return Err(AppError::Unauthorized);
            }
        }
    }
    Ok(next.run(request).await)
}
