//! Google Drive implementation of [`DocumentStore`].

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

use super::{DocError, DocumentStore, RemoteFile, RemoteFolder};
use crate::temporal::DateWindow;

const DRIVE_API_BASE: &str = "https://www.googleapis.com/drive/v3";
const FOLDER_MIME: &str = "application/vnd.google-apps.folder";
const GOOGLE_NATIVE_PREFIX: &str = "application/vnd.google-apps.";
const PAGE_SIZE: u32 = 100;

pub struct DriveStore {
    client: Client,
    token: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FileList {
    #[serde(default)]
    files: Vec<DriveFile>,
    next_page_token: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DriveFile {
    id: String,
    name: String,
    #[serde(default)]
    mime_type: String,
    created_time: Option<String>,
    modified_time: Option<String>,
    web_view_link: Option<String>,
}

impl From<DriveFile> for RemoteFile {
    fn from(f: DriveFile) -> Self {
        RemoteFile {
            id: f.id,
            name: f.name,
            mime_type: f.mime_type,
            created_time: f.created_time,
            modified_time: f.modified_time,
            web_view_link: f.web_view_link,
        }
    }
}

impl DriveStore {
    pub fn new(client: Client, token: String) -> Self {
        Self { client, token }
    }

    async fn check(&self, response: reqwest::Response) -> Result<reqwest::Response, DocError> {
        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(DocError::Api {
                status: status.as_u16(),
                message,
            });
        }
        Ok(response)
    }

    /// Pages through a files.list query.
    async fn list_query(&self, query: &str, fields: &str) -> Result<Vec<DriveFile>, DocError> {
        let mut all = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let mut request = self
                .client
                .get(format!("{DRIVE_API_BASE}/files"))
                .bearer_auth(&self.token)
                .query(&[
                    ("q", query),
                    ("fields", fields),
                    ("pageSize", &PAGE_SIZE.to_string()),
                ]);
            if let Some(token) = &page_token {
                request = request.query(&[("pageToken", token.as_str())]);
            }

            let response = request.send().await?;
            let page: FileList = self.check(response).await?.json().await?;
            all.extend(page.files);

            match page.next_page_token {
                Some(t) => page_token = Some(t),
                None => break,
            }
        }
        Ok(all)
    }

    async fn list_files_in(
        &self,
        folder_id: &str,
        window: &DateWindow,
    ) -> Result<Vec<RemoteFile>, DocError> {
        let mut query = format!(
            "'{folder_id}' in parents and mimeType != '{FOLDER_MIME}' and trashed=false"
        );
        // RFC 3339 bounds; the window's day-level bounds map to start/end of day.
        if let Some(min) = window.min {
            query.push_str(&format!(" and modifiedTime >= '{min}T00:00:00'"));
        }
        if let Some(max) = window.max {
            query.push_str(&format!(" and modifiedTime <= '{max}T23:59:59'"));
        }
        debug!(%query, "drive files query");

        let files = self
            .list_query(
                &query,
                "nextPageToken, files(id, name, mimeType, createdTime, modifiedTime, webViewLink)",
            )
            .await?;
        Ok(files.into_iter().map(RemoteFile::from).collect())
    }
}

#[async_trait]
impl DocumentStore for DriveStore {
    async fn list_folders(&self, parent_id: &str) -> Result<Vec<RemoteFolder>, DocError> {
        let query =
            format!("'{parent_id}' in parents and mimeType = '{FOLDER_MIME}' and trashed=false");
        let folders = self
            .list_query(&query, "nextPageToken, files(id, name)")
            .await?;
        Ok(folders
            .into_iter()
            .map(|f| RemoteFolder {
                id: f.id,
                name: f.name,
            })
            .collect())
    }

    async fn list_files_recursive(
        &self,
        folder_id: &str,
        window: &DateWindow,
    ) -> Result<Vec<RemoteFile>, DocError> {
        let mut all = Vec::new();
        let mut pending = vec![folder_id.to_string()];

        // Worklist traversal; folders are never date-filtered, only files.
        while let Some(current) = pending.pop() {
            all.extend(self.list_files_in(&current, window).await?);
            for folder in self.list_folders(&current).await? {
                pending.push(folder.id);
            }
        }
        Ok(all)
    }

    async fn download(&self, file: &RemoteFile) -> Result<bytes::Bytes, DocError> {
        let request = if file.mime_type.starts_with(GOOGLE_NATIVE_PREFIX) {
            // Native Docs/Sheets/Slides have no binary body; export as text.
            debug!(name = %file.name, "exporting native document as text");
            self.client
                .get(format!("{DRIVE_API_BASE}/files/{}/export", file.id))
                .bearer_auth(&self.token)
                .query(&[("mimeType", "text/plain")])
        } else {
            self.client
                .get(format!("{DRIVE_API_BASE}/files/{}", file.id))
                .bearer_auth(&self.token)
                .query(&[("alt", "media")])
        };

        let response = request.send().await?;
        Ok(self.check(response).await?.bytes().await?)
    }
}
