//! The candidate pipeline: a five-stage state machine driven per candidate.
//!
//! Fetch loads the job profile, Analyze runs the scoring gate, failing
//! candidates go straight to Done, passing candidates get HR screening
//! questions generated and the HR team notified. Stage transitions are a
//! pure function; side effects live in the per-stage modules.

pub mod analyze;
pub mod context;
pub mod handlers;
pub mod prompts;
pub mod questions;
pub mod queue;
pub mod send;
pub mod sync;

use tracing::{error, info, warn};

use crate::errors::AppError;
use crate::state::AppState;
use context::PipelineContext;

pub const HR_QUESTIONS_COLLECTION: &str = "HRQuestions";

pub const QUESTION_HEADERS: [&str; 5] =
    ["Date", "Candidate Name", "Job", "Resume Link", "Questions"];

pub const ANALYSIS_HEADERS: [&str; 11] = [
    "Candidate Name",
    "Match Score",
    "Strengths",
    "Weaknesses",
    "Experience Check",
    "Skill Match",
    "Verdict",
    "Timestamp",
    "Job Applied For",
    "Email",
    "Contact",
];

/// Per-job analysis collection name.
pub fn analysis_collection(job: &str) -> String {
    format!("Analysis - {job}")
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Fetch,
    Analyze,
    GenerateQuestions,
    Notify,
    Done,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Pass,
    Fail,
}

impl Verdict {
    pub fn as_str(&self) -> &'static str {
        match self {
            Verdict::Pass => "PASS",
            Verdict::Fail => "FAIL",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    Fetched,
    Analyzed(Verdict),
    QuestionsReady,
    Notified(bool),
}

/// Pure transition function. An event that does not belong to the current
/// stage terminates the run.
pub fn transition(stage: Stage, event: Event) -> Stage {
    match (stage, event) {
        (Stage::Fetch, Event::Fetched) => Stage::Analyze,
        (Stage::Analyze, Event::Analyzed(Verdict::Pass)) => Stage::GenerateQuestions,
        (Stage::Analyze, Event::Analyzed(Verdict::Fail)) => Stage::Done,
        (Stage::GenerateQuestions, Event::QuestionsReady) => Stage::Notify,
        (Stage::Notify, Event::Notified(_)) => Stage::Done,
        (stage, event) => {
            warn!(?stage, ?event, "unexpected pipeline event, terminating");
            Stage::Done
        }
    }
}

/// Drives one candidate through the pipeline to completion.
pub async fn run(state: &AppState, mut ctx: PipelineContext) -> Result<(), AppError> {
    let candidate = ctx.candidate.name.clone();
    info!(candidate = %candidate, job = %ctx.job, "pipeline started");

    let mut stage = Stage::Fetch;
    while stage != Stage::Done {
        let event = match stage {
            Stage::Fetch => {
                let jobs = state.job_cache.get(state.store.as_ref()).await?;
                if let Some((_, profile)) = crate::jobs::jd::resolve_job_title(&ctx.job, &jobs) {
                    ctx.jd = profile.clone();
                }
                Event::Fetched
            }
            Stage::Analyze => {
                let verdict =
                    analyze::run(&state.llm, state.store.as_ref(), &mut ctx).await?;
                Event::Analyzed(verdict)
            }
            Stage::GenerateQuestions => {
                questions::run(&state.llm, state.store.as_ref(), &mut ctx).await?;
                Event::QuestionsReady
            }
            Stage::Notify => {
                let sent =
                    send::send_to_hr(state.mailer.as_ref(), &state.config.hr_email, &mut ctx)
                        .await;
                Event::Notified(sent)
            }
            Stage::Done => break,
        };
        stage = transition(stage, event);
    }

    match ctx.verdict {
        Some(Verdict::Pass) => info!(
            candidate = %candidate,
            email_sent = ctx.email_sent,
            "pipeline finished: PASS"
        ),
        Some(Verdict::Fail) => info!(candidate = %candidate, "pipeline finished: FAIL"),
        None => error!(candidate = %candidate, "pipeline finished without a verdict"),
    }
    Ok(())
}
