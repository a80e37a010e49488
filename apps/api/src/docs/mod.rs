//! Document store abstraction — where raw resumes live.
//!
//! The production implementation is Google Drive. Listing is recursive and
//! filtered by modification time at the source; native document formats are
//! exported to a text-bearing format at download time.

pub mod drive;
pub mod text;

use async_trait::async_trait;
use thiserror::Error;

use crate::temporal::DateWindow;

#[derive(Debug, Error)]
pub enum DocError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Document API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Text extraction failed for {name}: {reason}")]
    Extraction { name: String, reason: String },
}

#[derive(Debug, Clone)]
pub struct RemoteFolder {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, Default)]
pub struct RemoteFile {
    pub id: String,
    pub name: String,
    pub mime_type: String,
    pub created_time: Option<String>,
    pub modified_time: Option<String>,
    pub web_view_link: Option<String>,
}

impl RemoteFile {
    /// The observed date for a file: modification time preferred, creation
    /// time as fallback, date component only.
    pub fn observed_date(&self) -> Option<String> {
        self.modified_time
            .as_deref()
            .or(self.created_time.as_deref())
            .and_then(|t| t.split('T').next())
            .map(str::to_string)
    }
}

#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn list_folders(&self, parent_id: &str) -> Result<Vec<RemoteFolder>, DocError>;

    /// Flat listing of all files under a folder and its subfolders.
    /// Files outside the window are filtered at the source; folders are
    /// always traversed regardless of their own timestamps.
    async fn list_files_recursive(
        &self,
        folder_id: &str,
        window: &DateWindow,
    ) -> Result<Vec<RemoteFile>, DocError>;

    /// Downloads a file's content. Native document formats are exported to
    /// a portable text-bearing format.
    async fn download(&self, file: &RemoteFile) -> Result<bytes::Bytes, DocError>;
}
