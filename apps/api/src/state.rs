use std::sync::Arc;

use crate::config::Config;
use crate::docs::DocumentStore;
use crate::intake::identity::IdentityCache;
use crate::jobs::JobCache;
use crate::llm_client::LlmClient;
use crate::notify::{Mailer, Scheduler};
use crate::pipeline::queue::PipelineQueue;
use crate::store::TabularStore;

/// Shared application state available to all route handlers.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn TabularStore>,
    pub docs: Arc<dyn DocumentStore>,
    pub llm: LlmClient,
    pub mailer: Arc<dyn Mailer>,
    pub scheduler: Arc<dyn Scheduler>,
    pub identity_cache: Arc<IdentityCache>,
    pub job_cache: Arc<JobCache>,
    pub queue: PipelineQueue,
    pub config: Config,
}
