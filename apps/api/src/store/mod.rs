//! Tabular store abstraction — the system of record.
//!
//! Collections are named sheets addressed with A1-style ranges
//! (`"Candidates!A:D"`). The production implementation talks to the Google
//! Sheets REST API; tests use the in-memory double in [`memory`].

pub mod sheets;

#[cfg(test)]
pub mod memory;

use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Store API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Malformed store response: {0}")]
    Malformed(String),
}

/// Range-addressed tabular store. `write` overwrites the addressed cells;
/// `append` adds rows after the last populated row of the collection.
#[async_trait]
pub trait TabularStore: Send + Sync {
    async fn read(&self, range: &str) -> Result<Vec<Vec<String>>, StoreError>;

    async fn append(&self, range: &str, rows: Vec<Vec<String>>) -> Result<(), StoreError>;

    async fn write(&self, range: &str, rows: Vec<Vec<String>>) -> Result<(), StoreError>;

    /// Creates the collection if absent. When `headers` is given the header
    /// row is force-overwritten even on an existing collection, so schema
    /// additions propagate to old sheets.
    async fn ensure_collection(
        &self,
        name: &str,
        headers: Option<&[&str]>,
    ) -> Result<(), StoreError>;
}

/// Prefixes values the spreadsheet would evaluate as a formula (leading `+`
/// or `=`) with a literal-string marker. Required before every write of
/// user-derived contact data.
pub fn defuse_formula(value: &str) -> String {
    if value.starts_with('+') || value.starts_with('=') {
        format!("'{value}")
    } else {
        value.to_string()
    }
}

/// Reverses formula-render artifacts on read: the defusing `'` marker, or
/// a leading `=` from a cell rendered as a formula.
pub fn strip_formula_prefix(value: &str) -> &str {
    value
        .strip_prefix('\'')
        .or_else(|| value.strip_prefix('='))
        .unwrap_or(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defuse_phone_number() {
        assert_eq!(defuse_formula("+91-9999999999"), "'+91-9999999999");
    }

    #[test]
    fn test_defuse_formula_injection() {
        assert_eq!(defuse_formula("=HYPERLINK(\"x\")"), "'=HYPERLINK(\"x\")");
    }

    #[test]
    fn test_defuse_leaves_plain_values_alone() {
        assert_eq!(defuse_formula("alice@example.com"), "alice@example.com");
        assert_eq!(defuse_formula(""), "");
    }

    #[test]
    fn test_strip_formula_prefix() {
        assert_eq!(strip_formula_prefix("=alice"), "alice");
        assert_eq!(strip_formula_prefix("'+91-9999999999"), "+91-9999999999");
        assert_eq!(strip_formula_prefix("alice"), "alice");
    }
}
