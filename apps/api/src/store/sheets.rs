//! Google Sheets implementation of [`TabularStore`].

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::debug;

use super::{StoreError, TabularStore};

const SHEETS_API_BASE: &str = "https://sheets.googleapis.com/v4/spreadsheets";

pub struct SheetsStore {
    client: Client,
    spreadsheet_id: String,
    token: String,
}

#[derive(Debug, Deserialize)]
struct ValueRange {
    #[serde(default)]
    values: Vec<Vec<Value>>,
}

#[derive(Debug, Deserialize)]
struct SpreadsheetMeta {
    #[serde(default)]
    sheets: Vec<SheetEntry>,
}

#[derive(Debug, Deserialize)]
struct SheetEntry {
    properties: SheetProperties,
}

#[derive(Debug, Deserialize)]
struct SheetProperties {
    title: String,
}

impl SheetsStore {
    pub fn new(client: Client, spreadsheet_id: String, token: String) -> Self {
        Self {
            client,
            spreadsheet_id,
            token,
        }
    }

    fn values_url(&self, range: &str, suffix: &str) -> String {
        format!(
            "{SHEETS_API_BASE}/{}/values/{}{suffix}",
            self.spreadsheet_id,
            encode_range(range)
        )
    }

    async fn check(&self, response: reqwest::Response) -> Result<reqwest::Response, StoreError> {
        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(StoreError::Api {
                status: status.as_u16(),
                message,
            });
        }
        Ok(response)
    }

    async fn titles(&self) -> Result<Vec<String>, StoreError> {
        let url = format!(
            "{SHEETS_API_BASE}/{}?fields=sheets.properties.title",
            self.spreadsheet_id
        );
        let response = self
            .client
            .get(&url)
            .bearer_auth(&self.token)
            .send()
            .await?;
        let meta: SpreadsheetMeta = self.check(response).await?.json().await?;
        Ok(meta.sheets.into_iter().map(|s| s.properties.title).collect())
    }
}

#[async_trait]
impl TabularStore for SheetsStore {
    async fn read(&self, range: &str) -> Result<Vec<Vec<String>>, StoreError> {
        let url = self.values_url(range, "?valueRenderOption=FORMATTED_VALUE");
        let response = self
            .client
            .get(&url)
            .bearer_auth(&self.token)
            .send()
            .await?;
        let body: ValueRange = self.check(response).await?.json().await?;
        Ok(body
            .values
            .into_iter()
            .map(|row| row.into_iter().map(cell_to_string).collect())
            .collect())
    }

    async fn append(&self, range: &str, rows: Vec<Vec<String>>) -> Result<(), StoreError> {
        let url = self.values_url(range, ":append?valueInputOption=USER_ENTERED");
        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.token)
            .json(&json!({ "values": rows }))
            .send()
            .await?;
        self.check(response).await?;
        debug!(range, "appended rows to store");
        Ok(())
    }

    async fn write(&self, range: &str, rows: Vec<Vec<String>>) -> Result<(), StoreError> {
        let url = self.values_url(range, "?valueInputOption=USER_ENTERED");
        let response = self
            .client
            .put(&url)
            .bearer_auth(&self.token)
            .json(&json!({ "values": rows }))
            .send()
            .await?;
        self.check(response).await?;
        Ok(())
    }

    async fn ensure_collection(
        &self,
        name: &str,
        headers: Option<&[&str]>,
    ) -> Result<(), StoreError> {
        let titles = self.titles().await?;
        let exists = titles.iter().any(|t| t == name);

        if !exists {
            let url = format!("{SHEETS_API_BASE}/{}:batchUpdate", self.spreadsheet_id);
            let body = json!({
                "requests": [{ "addSheet": { "properties": { "title": name } } }]
            });
            let response = self
                .client
                .post(&url)
                .bearer_auth(&self.token)
                .json(&body)
                .send()
                .await?;
            self.check(response).await?;
            debug!(collection = name, "created collection");
        }

        // Headers are force-overwritten so column additions reach
        // collections created before the schema change.
        if let Some(headers) = headers {
            let row: Vec<String> = headers.iter().map(|h| h.to_string()).collect();
            self.write(&format!("{name}!A1"), vec![row]).await?;
        }
        Ok(())
    }
}

/// Formatted reads can still surface numbers for date-typed cells.
fn cell_to_string(cell: Value) -> String {
    match cell {
        Value::String(s) => s,
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// Percent-encodes the characters that actually occur in A1 ranges.
fn encode_range(range: &str) -> String {
    range
        .replace('%', "%25")
        .replace(' ', "%20")
        .replace('\'', "%27")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_range_spaces_and_quotes() {
        assert_eq!(
            encode_range("'Analysis - SRE'!A:K"),
            "%27Analysis%20-%20SRE%27!A:K"
        );
        assert_eq!(encode_range("Candidates!A:D"), "Candidates!A:D");
    }

    #[test]
    fn test_cell_to_string_handles_numbers() {
        assert_eq!(cell_to_string(json!(45000)), "45000");
        assert_eq!(cell_to_string(json!("hello")), "hello");
        assert_eq!(cell_to_string(Value::Null), "");
    }
}
