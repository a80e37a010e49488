/// LLM Client — the single point of entry for all model calls in Hireflow.
///
/// ARCHITECTURAL RULE: No other module may call the completion API directly.
/// All LLM interactions MUST go through this module.
///
/// The backend is an OpenAI-compatible chat-completions endpoint. Multiple
/// API keys may be configured; the client rotates to a different key on
/// every retry so a rate-limited key does not stall the whole batch.
use rand::Rng;
use reqwest::Client;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

pub mod prompts;

/// The model used for all LLM calls. Intentionally hardcoded to prevent
/// accidental drift between extraction and scoring behavior.
pub const MODEL: &str = "llama-3.3-70b";
const MAX_RETRIES: u32 = 5;
/// Base retry delay. Longer than a minute so a per-minute quota has fully
/// cleared before the next attempt.
const BASE_DELAY_SECS: u64 = 62;
const CALL_TIMEOUT_SECS: u64 = 120;

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Rate limited after {retries} retries")]
    RateLimited { retries: u32 },

    #[error("LLM returned empty content")]
    EmptyContent,

    #[error("No API credentials configured")]
    NoCredentials,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    temperature: f32,
    messages: Vec<ChatMessage<'a>>,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    #[serde(default)]
    content: String,
}

/// The single LLM client used by all services. Wraps the chat-completions
/// API with retry, backoff, and credential rotation.
#[derive(Clone)]
pub struct LlmClient {
    client: Client,
    base_url: String,
    keys: Vec<String>,
}

impl LlmClient {
    pub fn new(base_url: String, keys: Vec<String>) -> Self {
        Self {
            client: Client::builder()
                .timeout(std::time::Duration::from_secs(CALL_TIMEOUT_SECS))
                .build()
                .expect("Failed to build HTTP client"),
            base_url,
            keys,
        }
    }

    /// Makes a raw completion call, returning the response text.
    /// Retries on rate-limit/quota signals with randomized backoff,
    /// rotating to the next configured key on each attempt. Any other API
    /// error fails immediately.
    pub async fn call(&self, prompt: &str, system: &str) -> Result<String, LlmError> {
        if self.keys.is_empty() {
            return Err(LlmError::NoCredentials);
        }

        let request_body = ChatRequest {
            model: MODEL,
            temperature: 0.0,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: system,
                },
                ChatMessage {
                    role: "user",
                    content: prompt,
                },
            ],
        };

        let start = rand::thread_rng().gen_range(0..self.keys.len());

        for attempt in 0..MAX_RETRIES {
            if attempt > 0 {
                let jitter = rand::thread_rng().gen_range(0.0..5.0);
                let delay_secs = backoff_secs(attempt - 1, jitter);
                warn!(
                    attempt,
                    delay_secs, "LLM rate limited, backing off and rotating key"
                );
                tokio::time::sleep(std::time::Duration::from_secs_f64(delay_secs)).await;
            }

            let key = &self.keys[rotated_index(self.keys.len(), start, attempt as usize)];

            let response = self
                .client
                .post(format!("{}/chat/completions", self.base_url))
                .bearer_auth(key)
                .json(&request_body)
                .send()
                .await;

            // Transport failures are not quota signals; fail immediately.
            let response = response?;

            let status = response.status();

            if !status.is_success() {
                let body = response.text().await.unwrap_or_default();
                if is_retryable(status.as_u16(), &body) {
                    warn!(status = status.as_u16(), "LLM API rate limited");
                    continue;
                }
                return Err(LlmError::Api {
                    status: status.as_u16(),
                    message: body,
                });
            }

            let parsed: ChatResponse = response.json().await?;
            let text = parsed
                .choices
                .into_iter()
                .next()
                .map(|c| c.message.content)
                .filter(|c| !c.trim().is_empty())
                .ok_or(LlmError::EmptyContent)?;

            debug!(chars = text.len(), "LLM call succeeded");
            return Ok(text);
        }

        // All attempts consumed by rate-limit/quota responses.
        Err(LlmError::RateLimited {
            retries: MAX_RETRIES,
        })
    }

    /// Calls the LLM and deserializes the text response as JSON.
    /// The prompt must instruct the model to return valid JSON; stray
    /// markdown fences are tolerated and stripped.
    pub async fn call_json<T: DeserializeOwned>(
        &self,
        prompt: &str,
        system: &str,
    ) -> Result<T, LlmError> {
        let text = self.call(prompt, system).await?;
        let text = strip_json_fences(&text);
        serde_json::from_str(text).map_err(LlmError::Parse)
    }
}

/// Rate-limit and quota signals, the only errors worth the long backoff.
/// Everything else fails the call immediately.
fn is_retryable(status: u16, body: &str) -> bool {
    status == 429 || body.contains("RESOURCE_EXHAUSTED") || body.contains("insufficient_quota")
}

/// Linear-plus-jitter backoff: 62s, 67s, 72s… The base exceeds a minute so
/// per-minute quota windows fully reset between attempts.
fn backoff_secs(completed_attempts: u32, jitter: f64) -> f64 {
    BASE_DELAY_SECS as f64 + (completed_attempts as f64 * 5.0) + jitter
}

fn rotated_index(len: usize, start: usize, attempt: usize) -> usize {
    (start + attempt) % len
}

/// Strips ```json ... ``` or ``` ... ``` code fences from LLM output.
fn strip_json_fences(text: &str) -> &str {
    let text = text.trim();
    if let Some(stripped) = text.strip_prefix("```json") {
        stripped
            .trim_start()
            .strip_suffix("```")
            .map(|s| s.trim())
            .unwrap_or(stripped.trim_start())
    } else if let Some(stripped) = text.strip_prefix("```") {
        stripped
            .trim_start()
            .strip_suffix("```")
            .map(|s| s.trim())
            .unwrap_or(stripped.trim_start())
    } else {
        text
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_json_fences_with_json_tag() {
        let input = "```json\n{\"key\": \"value\"}\n```";
        assert_eq!(strip_json_fences(input), "{\"key\": \"value\"}");
    }

    #[test]
    fn test_strip_json_fences_without_tag() {
        let input = "```\n{\"key\": \"value\"}\n```";
        assert_eq!(strip_json_fences(input), "{\"key\": \"value\"}");
    }

    #[test]
    fn test_strip_json_fences_no_fences() {
        let input = "{\"key\": \"value\"}";
        assert_eq!(strip_json_fences(input), "{\"key\": \"value\"}");
    }

    #[test]
    fn test_rotation_changes_key_every_attempt() {
        let picks: Vec<usize> = (0..3).map(|a| rotated_index(3, 1, a)).collect();
        assert_eq!(picks, vec![1, 2, 0]);
    }

    #[test]
    fn test_backoff_clears_per_minute_quota() {
        assert!(backoff_secs(0, 0.0) > 60.0);
        assert_eq!(backoff_secs(2, 1.5), 62.0 + 10.0 + 1.5);
    }

    #[test]
    fn test_retryable_signals() {
        assert!(is_retryable(429, ""));
        assert!(is_retryable(400, "RESOURCE_EXHAUSTED: quota"));
        assert!(is_retryable(400, "insufficient_quota"));
        assert!(!is_retryable(400, "bad request"));
        assert!(!is_retryable(401, "unauthorized"));
    }

    #[test]
    fn test_server_errors_are_not_retried() {
        // an outage must surface immediately, not after the quota backoff
        assert!(!is_retryable(500, "internal error"));
        assert!(!is_retryable(503, "service unavailable"));
        assert!(is_retryable(503, "RESOURCE_EXHAUSTED"));
    }
}
