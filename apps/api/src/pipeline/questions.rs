//! Screening-question generation for candidates that pass the gate.

use chrono::Utc;
use serde::Deserialize;
use tracing::info;

use super::context::PipelineContext;
use super::prompts::HR_QUESTIONS_PROMPT;
use super::{HR_QUESTIONS_COLLECTION, QUESTION_HEADERS};
use crate::errors::AppError;
use crate::llm_client::prompts::JSON_ONLY_SYSTEM;
use crate::llm_client::LlmClient;
use crate::store::TabularStore;

#[derive(Debug, Default, Deserialize)]
struct QuestionSet {
    #[serde(default)]
    candidate_summary: String,
    #[serde(default)]
    key_insights: Vec<String>,
    #[serde(default)]
    recommended_questions: Vec<String>,
}

/// Generates screening questions and appends them to the question log.
pub async fn run(
    llm: &LlmClient,
    store: &dyn TabularStore,
    ctx: &mut PipelineContext,
) -> Result<(), AppError> {
    let analysis = format!(
        "Score: {}\nSummary: {}\nStrengths: {}\nWeaknesses: {}",
        ctx.score,
        ctx.analysis_summary,
        ctx.strengths.join("; "),
        ctx.weaknesses.join("; "),
    );
    let prompt = HR_QUESTIONS_PROMPT
        .replace("{jd_context}", &ctx.jd.as_context())
        .replace("{analysis}", &analysis)
        .replace("{resume_text}", &ctx.resume_text);

    let set: QuestionSet = llm
        .call_json(&prompt, JSON_ONLY_SYSTEM)
        .await
        .map_err(|e| AppError::Llm(format!("Question generation failed: {e}")))?;

    if !set.candidate_summary.is_empty() {
        ctx.analysis_summary = set.candidate_summary;
    }
    ctx.questions = set.recommended_questions;

    store
        .ensure_collection(HR_QUESTIONS_COLLECTION, Some(&QUESTION_HEADERS))
        .await?;
    let row = vec![
        Utc::now().format("%Y-%m-%d").to_string(),
        ctx.candidate.name.clone(),
        ctx.job.clone(),
        ctx.resume_link.clone(),
        ctx.questions.join("\n"),
    ];
    store
        .append(&format!("{HR_QUESTIONS_COLLECTION}!A:E"), vec![row])
        .await?;

    info!(
        candidate = %ctx.candidate.name,
        questions = ctx.questions.len(),
        insights = set.key_insights.len(),
        "screening questions stored"
    );
    Ok(())
}
