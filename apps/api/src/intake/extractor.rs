//! Batched resume extraction: N raw document texts, one structured LLM
//! call, order-preserving results.
//!
//! Retry, backoff, and credential rotation live in the LLM client; this
//! module owns prompt assembly and the deterministic input truncation that
//! keeps oversized resumes inside the model context instead of failing.

use serde::Deserialize;
use tracing::{info, warn};

use super::prompts::RESUME_BATCH_PROMPT;
use crate::errors::AppError;
use crate::llm_client::prompts::JSON_ONLY_SYSTEM;
use crate::llm_client::LlmClient;

/// Per-resume character ceiling before the combined prompt is built.
pub const MAX_CHARS_PER_TEXT: usize = 40_000;

/// Files per extraction call.
pub const BATCH_SIZE: usize = 10;

/// One extracted resume. Every field defaults to empty so minor model
/// drift degrades a field, not the batch.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ExtractedCandidate {
    #[serde(default, rename = "Name")]
    pub name: String,
    #[serde(default, rename = "Contact")]
    pub contact: String,
    #[serde(default, rename = "Qualification")]
    pub qualification: String,
    #[serde(default, rename = "Current_Position")]
    pub current_position: String,
    #[serde(default, rename = "Experience")]
    pub experience: String,
    #[serde(default, rename = "Skills")]
    pub skills: String,
    #[serde(default, rename = "Top_Projects")]
    pub top_projects: String,
}

#[derive(Debug, Deserialize)]
struct ExtractedBatch {
    #[serde(default)]
    resumes: Vec<ExtractedCandidate>,
}

/// Extracts structured fields for a batch of `(file name, text)` pairs in
/// one LLM call. Results are in input order; the model may return fewer
/// results than inputs, which the caller must report per missing item
/// rather than ignore. Any non-retryable failure fails the whole batch.
pub async fn extract_batch(
    llm: &LlmClient,
    batch: &[(String, String)],
) -> Result<Vec<ExtractedCandidate>, AppError> {
    if batch.is_empty() {
        return Ok(Vec::new());
    }

    let prompt = build_batch_prompt(batch);
    info!(count = batch.len(), "sending resume batch for extraction");

    let parsed: ExtractedBatch = llm
        .call_json(&prompt, JSON_ONLY_SYSTEM)
        .await
        .map_err(|e| AppError::Llm(format!("Batch extraction failed: {e}")))?;

    if parsed.resumes.len() != batch.len() {
        warn!(
            inputs = batch.len(),
            results = parsed.resumes.len(),
            "extraction result count mismatch"
        );
    }
    Ok(parsed.resumes)
}

fn build_batch_prompt(batch: &[(String, String)]) -> String {
    let mut combined = String::new();
    for (idx, (name, text)) in batch.iter().enumerate() {
        combined.push_str(&format!(
            "\n--- RESUME #{} (Filename: {}) ---\n{}\n",
            idx + 1,
            name,
            truncate_chars(text, MAX_CHARS_PER_TEXT)
        ));
    }
    RESUME_BATCH_PROMPT
        .replace("{count}", &batch.len().to_string())
        .replace("{text}", &combined)
}

/// Truncates to at most `max` characters on a char boundary.
fn truncate_chars(text: &str, max: usize) -> &str {
    match text.char_indices().nth(max) {
        Some((byte_idx, _)) => &text[..byte_idx],
        None => text,
    }
}
