//! Gmail implementation of [`Mailer`].

use async_trait::async_trait;
use base64::engine::general_purpose::URL_SAFE;
use base64::Engine;
use reqwest::Client;
use serde_json::json;
use tracing::info;

use super::{Mailer, NotifyError};

const GMAIL_SEND_URL: &str = "https://gmail.googleapis.com/gmail/v1/users/me/messages/send";

pub struct GmailMailer {
    client: Client,
    token: String,
}

impl GmailMailer {
    pub fn new(client: Client, token: String) -> Self {
        Self { client, token }
    }
}

/// RFC 2822 message, base64url-encoded as the Gmail API requires.
fn encode_message(to: &str, subject: &str, body: &str) -> String {
    let mime = format!("To: {to}\r\nSubject: {subject}\r\nContent-Type: text/plain; charset=utf-8\r\n\r\n{body}");
    URL_SAFE.encode(mime.as_bytes())
}

#[async_trait]
impl Mailer for GmailMailer {
    async fn send(&self, to: &str, subject: &str, body: &str) -> Result<(), NotifyError> {
        let raw = encode_message(to, subject, body);
        let response = self
            .client
            .post(GMAIL_SEND_URL)
            .bearer_auth(&self.token)
            .json(&json!({ "raw": raw }))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(NotifyError::Api {
                status: status.as_u16(),
                message,
            });
        }
        info!(to, "email sent");
        Ok(())
    }
}
