use anyhow::{Context, Result};

/// Application configuration loaded from environment variables.
/// Fails at startup if required variables are missing.
#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub rust_log: String,
    /// Spreadsheet backing the tabular store.
    pub spreadsheet_id: String,
    /// Bearer token for the Google REST APIs (Sheets, Drive, Gmail, Calendar).
    pub google_api_token: String,
    /// Root folder scanned for resume subfolders.
    pub drive_folder_id: String,
    pub llm_api_base: String,
    /// One or more completion-API keys; the client rotates through them.
    pub llm_api_keys: Vec<String>,
    pub hr_email: String,
    pub frontend_url: String,
    /// When unset the admin middleware is open (local development).
    pub admin_password: Option<String>,
    /// Collection that receives candidates with no job-specific sheet.
    pub source_collection: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        let llm_api_keys = collect_llm_keys(|key| std::env::var(key).ok());
        if llm_api_keys.is_empty() {
            anyhow::bail!("No LLM API keys configured (set LLM_API_KEY or LLM_API_KEY_1..N)");
        }

        Ok(Config {
            port: std::env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
            spreadsheet_id: require_env("SPREADSHEET_ID")?,
            google_api_token: require_env("GOOGLE_API_TOKEN")?,
            drive_folder_id: require_env("DRIVE_FOLDER_ID")?,
            llm_api_base: std::env::var("LLM_API_BASE")
                .unwrap_or_else(|_| "https://api.cerebras.ai/v1".to_string()),
            llm_api_keys,
            hr_email: require_env("HR_EMAIL")?,
            frontend_url: std::env::var("FRONTEND_URL")
                .unwrap_or_else(|_| "http://localhost:5173".to_string()),
            admin_password: std::env::var("ADMIN_PASSWORD").ok().filter(|p| !p.is_empty()),
            source_collection: std::env::var("SOURCE_COLLECTION")
                .unwrap_or_else(|_| "Candidates".to_string()),
        })
    }
}

/// Gathers `LLM_API_KEY` plus the numbered `LLM_API_KEY_1..N` sequence,
/// stopping at the first gap in the numbering.
pub fn collect_llm_keys(lookup: impl Fn(&str) -> Option<String>) -> Vec<String> {
    let mut keys = Vec::new();
    if let Some(key) = lookup("LLM_API_KEY").filter(|k| !k.is_empty()) {
        keys.push(key);
    }
    for n in 1.. {
        match lookup(&format!("LLM_API_KEY_{n}")).filter(|k| !k.is_empty()) {
            Some(key) => keys.push(key),
            None => break,
        }
    }
    keys
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_collect_llm_keys_numbered_sequence() {
        let vars: HashMap<&str, &str> = [
            ("LLM_API_KEY", "base"),
            ("LLM_API_KEY_1", "one"),
            ("LLM_API_KEY_2", "two"),
            // gap: _3 missing, _4 must be ignored
            ("LLM_API_KEY_4", "four"),
        ]
        .into_iter()
        .collect();

        let keys = collect_llm_keys(|k| vars.get(k).map(|v| v.to_string()));
        assert_eq!(keys, vec!["base", "one", "two"]);
    }

    #[test]
    fn test_collect_llm_keys_empty_env() {
        let keys = collect_llm_keys(|_| None);
        assert!(keys.is_empty());
    }
}
