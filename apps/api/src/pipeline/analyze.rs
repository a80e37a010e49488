//! The scoring gate. Scores a candidate against the job profile and
//! persists one analysis row per run.
//!
//! The verdict is recomputed from the numeric score; the model's own
//! verdict string is advisory only. A candidate with no resume content or
//! no job profile is failed deterministically, without spending a model
//! call.

use std::sync::OnceLock;

use chrono::{SecondsFormat, Utc};
use regex::Regex;
use serde::Deserialize;
use serde_json::Value;
use tracing::{info, warn};

use super::context::PipelineContext;
use super::prompts::CV_ANALYSIS_PROMPT;
use super::{analysis_collection, Verdict, ANALYSIS_HEADERS};
use crate::errors::AppError;
use crate::llm_client::prompts::JSON_ONLY_SYSTEM;
use crate::llm_client::LlmClient;
use crate::store::{defuse_formula, TabularStore};

/// Minimum score for a PASS verdict.
pub const PASS_THRESHOLD: i64 = 80;

#[derive(Debug, Default, Deserialize)]
struct AnalysisOutcome {
    #[serde(default)]
    match_score: Value,
    #[serde(default)]
    strengths: Vec<String>,
    #[serde(default)]
    weaknesses: Vec<String>,
    #[serde(default)]
    experience_validation: String,
    #[serde(default)]
    skill_match_percentage: Value,
    #[serde(default)]
    verdict: String,
}

/// Runs the scoring gate for one candidate and appends the analysis row.
pub async fn run(
    llm: &LlmClient,
    store: &dyn TabularStore,
    ctx: &mut PipelineContext,
) -> Result<Verdict, AppError> {
    let (email, contact) = split_contact(&ctx.candidate.contact);

    if let Some(reason) = precondition_failure(ctx) {
        warn!(candidate = %ctx.candidate.name, reason, "failing without analysis");
        ctx.score = 0;
        ctx.verdict = Some(Verdict::Fail);
        ctx.analysis_summary = reason.to_string();
        persist_row(store, ctx, &email, &contact, reason, "0%", "").await?;
        return Ok(Verdict::Fail);
    }

    let prompt = CV_ANALYSIS_PROMPT
        .replace("{jd_context}", &ctx.jd.as_context())
        .replace("{candidate_name}", &ctx.candidate.name)
        .replace("{resume_text}", &ctx.resume_text);

    let outcome: AnalysisOutcome = llm
        .call_json(&prompt, JSON_ONLY_SYSTEM)
        .await
        .map_err(|e| AppError::Llm(format!("CV analysis failed: {e}")))?;

    let score = parse_score(&outcome.match_score);
    let verdict = decide_verdict(score);
    if verdict.as_str() != outcome.verdict {
        warn!(
            candidate = %ctx.candidate.name,
            score,
            model_verdict = %outcome.verdict,
            "model verdict overridden by score threshold"
        );
    }

    ctx.score = score;
    ctx.verdict = Some(verdict);
    ctx.strengths = outcome.strengths.clone();
    ctx.weaknesses = outcome.weaknesses.clone();
    ctx.analysis_summary = outcome.experience_validation.clone();

    let skill_match = value_to_string(&outcome.skill_match_percentage);
    persist_row(
        store,
        ctx,
        &email,
        &contact,
        &outcome.experience_validation,
        &skill_match,
        &outcome.strengths.join("; "),
    )
    .await?;

    info!(
        candidate = %ctx.candidate.name,
        score,
        verdict = verdict.as_str(),
        "analysis complete"
    );
    Ok(verdict)
}

async fn persist_row(
    store: &dyn TabularStore,
    ctx: &PipelineContext,
    email: &str,
    contact: &str,
    experience_check: &str,
    skill_match: &str,
    strengths: &str,
) -> Result<(), AppError> {
    let collection = analysis_collection(&ctx.job);
    store
        .ensure_collection(&collection, Some(&ANALYSIS_HEADERS))
        .await?;

    let row = vec![
        ctx.candidate.name.clone(),
        ctx.score.to_string(),
        strengths.to_string(),
        ctx.weaknesses.join("; "),
        experience_check.to_string(),
        skill_match.to_string(),
        ctx.verdict.map(|v| v.as_str()).unwrap_or("FAIL").to_string(),
        Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true),
        ctx.job.clone(),
        email.to_string(),
        defuse_formula(contact),
    ];
    store.append(&format!("{collection}!A:K"), vec![row]).await?;
    Ok(())
}

/// A reason to fail before spending a model call, if any.
fn precondition_failure(ctx: &PipelineContext) -> Option<&'static str> {
    if ctx.resume_text.trim().is_empty() {
        return Some("No resume content available");
    }
    if ctx.jd.is_empty() {
        return Some("No job requirements on file for this role");
    }
    None
}

pub fn decide_verdict(score: i64) -> Verdict {
    if score >= PASS_THRESHOLD {
        Verdict::Pass
    } else {
        Verdict::Fail
    }
}

/// Coerces the model's score field (int, float, "85", "85%") to an integer.
/// Anything unparseable scores 0.
fn parse_score(value: &Value) -> i64 {
    let text = value_to_string(value);
    let text = text.trim().trim_end_matches('%').trim();
    if let Ok(n) = text.parse::<i64>() {
        return n;
    }
    text.parse::<f64>().map(|f| f as i64).unwrap_or(0)
}

fn value_to_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// Splits an email address out of a free-form contact cell. The remainder
/// keeps the phone number, trimmed of leftover separators.
pub fn split_contact(contact: &str) -> (String, String) {
    static EMAIL_RE: OnceLock<Regex> = OnceLock::new();
    let re = EMAIL_RE
        .get_or_init(|| Regex::new(r"[\w\.\-]+@[\w\.\-]+\.\w+").expect("valid email regex"));

    let raw = crate::store::strip_formula_prefix(contact);
    match re.find(raw) {
        Some(m) => {
            let email = m.as_str().to_string();
            let rest = format!("{}{}", &raw[..m.start()], &raw[m.end()..]);
            let rest = rest
                .trim()
                .trim_matches(|c: char| c == ',' || c == ';' || c == '|' || c == '/')
                .trim()
                .to_string();
            (email, rest)
        }
        None => (String::new(), raw.trim().to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::jobs::JobProfile;
    use crate::pipeline::context::CandidateProfile;
    use crate::store::memory::MemoryStore;

    #[test]
    fn test_threshold_is_exact() {
        assert_eq!(decide_verdict(80), Verdict::Pass);
        assert_eq!(decide_verdict(79), Verdict::Fail);
        assert_eq!(decide_verdict(100), Verdict::Pass);
        assert_eq!(decide_verdict(0), Verdict::Fail);
    }

    #[test]
    fn test_parse_score_shapes() {
        assert_eq!(parse_score(&Value::from(85)), 85);
        assert_eq!(parse_score(&Value::from("85")), 85);
        assert_eq!(parse_score(&Value::from("85%")), 85);
        assert_eq!(parse_score(&Value::from(" 72 ")), 72);
        assert_eq!(parse_score(&Value::from(85.6)), 85);
        assert_eq!(parse_score(&Value::from("garbage")), 0);
        assert_eq!(parse_score(&Value::Null), 0);
    }

    #[test]
    fn test_split_contact_extracts_email() {
        let (email, rest) = split_contact("alice@example.com, +91-9999999999");
        assert_eq!(email, "alice@example.com");
        assert_eq!(rest, "+91-9999999999");

        let (email, rest) = split_contact("+91-9999999999");
        assert_eq!(email, "");
        assert_eq!(rest, "+91-9999999999");

        let (email, rest) = split_contact("'bob@x.co");
        assert_eq!(email, "bob@x.co");
        assert_eq!(rest, "");
    }

    fn ctx_with(resume: &str, jd: JobProfile) -> PipelineContext {
        PipelineContext {
            candidate: CandidateProfile {
                name: "Alice".to_string(),
                contact: "alice@example.com".to_string(),
                ..Default::default()
            },
            job: "SRE".to_string(),
            jd,
            resume_text: resume.to_string(),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_empty_resume_fails_without_model_call() {
        let store = MemoryStore::new();
        // deliberately unusable client: any call would error out
        let llm = LlmClient::new("http://127.0.0.1:0".to_string(), vec!["k".to_string()]);
        let jd = JobProfile {
            title: "SRE".to_string(),
            description: "keep things up".to_string(),
            ..Default::default()
        };

        let mut ctx = ctx_with("", jd);
        let verdict = run(&llm, &store, &mut ctx).await.unwrap();
        assert_eq!(verdict, Verdict::Fail);

        let rows = store.rows("Analysis - SRE");
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1][0], "Alice");
        assert_eq!(rows[1][1], "0");
        assert_eq!(rows[1][6], "FAIL");
        assert_eq!(rows[1][9], "alice@example.com");
    }

    #[tokio::test]
    async fn test_missing_jd_fails_without_model_call() {
        let store = MemoryStore::new();
        let llm = LlmClient::new("http://127.0.0.1:0".to_string(), vec!["k".to_string()]);
        let mut ctx = ctx_with("Skills: Rust", JobProfile::default());
        let verdict = run(&llm, &store, &mut ctx).await.unwrap();
        assert_eq!(verdict, Verdict::Fail);
        assert!(store.rows("Analysis - SRE")[1][4].contains("No job requirements"));
    }
}
