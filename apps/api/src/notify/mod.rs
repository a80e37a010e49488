//! Outbound notification seams: email delivery and interview scheduling.

pub mod calendar;
pub mod gmail;
pub mod handlers;

use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Notification API error (status {status}): {message}")]
    Api { status: u16, message: String },
}

#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, to: &str, subject: &str, body: &str) -> Result<(), NotifyError>;
}

/// Interview scheduling. Returns a human-readable status string; the
/// substrings "Error"/"Failed" denote failure (see
/// [`status_indicates_failure`]).
#[async_trait]
pub trait Scheduler: Send + Sync {
    async fn schedule(
        &self,
        candidate_name: &str,
        candidate_email: &str,
        job_title: &str,
        fixed_date: Option<&str>,
        fixed_time: Option<&str>,
    ) -> Result<String, NotifyError>;
}

/// The scheduling contract reports failure inside an otherwise-successful
/// status string rather than as an error value.
pub fn status_indicates_failure(status: &str) -> bool {
    status.contains("Error") || status.contains("Failed")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_failure_substrings() {
        assert!(status_indicates_failure("Error creating event: boom"));
        assert!(status_indicates_failure("Failed to connect to Calendar"));
        assert!(!status_indicates_failure(
            "Scheduled for 2024-06-20 10:00 UTC"
        ));
    }
}
