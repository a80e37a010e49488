mod config;
mod docs;
mod errors;
mod intake;
mod jobs;
mod llm_client;
mod notify;
mod pipeline;
mod routes;
mod state;
mod store;
mod temporal;

use anyhow::Result;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::docs::drive::DriveStore;
use crate::intake::identity::IdentityCache;
use crate::jobs::jd::JOB_CACHE_TTL;
use crate::jobs::JobCache;
use crate::llm_client::LlmClient;
use crate::notify::calendar::CalendarScheduler;
use crate::notify::gmail::GmailMailer;
use crate::pipeline::queue::{spawn_dispatcher, PipelineQueue};
use crate::routes::build_router;
use crate::state::AppState;
use crate::store::sheets::SheetsStore;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("hireflow_api={}", &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Hireflow API v{}", env!("CARGO_PKG_VERSION"));

    let http = reqwest::Client::new();

    let store = Arc::new(SheetsStore::new(
        http.clone(),
        config.spreadsheet_id.clone(),
        config.google_api_token.clone(),
    ));
    let docs = Arc::new(DriveStore::new(
        http.clone(),
        config.google_api_token.clone(),
    ));
    let mailer = Arc::new(GmailMailer::new(
        http.clone(),
        config.google_api_token.clone(),
    ));
    let scheduler = Arc::new(CalendarScheduler::new(
        http,
        config.google_api_token.clone(),
        config.frontend_url.clone(),
    ));

    let llm = LlmClient::new(config.llm_api_base.clone(), config.llm_api_keys.clone());
    info!(
        "LLM client initialized (model: {}, keys: {})",
        llm_client::MODEL,
        config.llm_api_keys.len()
    );

    let (queue, rx) = PipelineQueue::new();

    let state = AppState {
        store,
        docs,
        llm,
        mailer,
        scheduler,
        identity_cache: Arc::new(IdentityCache::new()),
        job_cache: Arc::new(JobCache::new(JOB_CACHE_TTL)),
        queue,
        config: config.clone(),
    };

    spawn_dispatcher(state.clone(), rx);

    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive()); // TODO: tighten CORS in production

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
