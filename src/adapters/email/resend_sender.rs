//! Resend email provider adapter.
//!
//! Implements `InviteEmailSender` against the Resend HTTP API. The API key
//! is handled via `secrecy::SecretString` and only exposed at request time.

use async_trait::async_trait;
use secrecy::ExposeSecret;
use serde::Serialize;

use crate::config::EmailConfig;
use crate::ports::{EmailError, InviteEmail, InviteEmailSender};

const RESEND_API_URL: &str = "https://api.resend.com/emails";

/// Resend-backed invitation email sender.
pub struct ResendEmailSender {
    config: EmailConfig,
    http_client: reqwest::Client,
    api_url: String,
}

#[derive(Debug, Serialize)]
struct SendEmailRequest<'a> {
    from: &'a str,
    to: Vec<&'a str>,
    subject: String,
    html: String,
}

impl ResendEmailSender {
    /// Creates a new sender with the given configuration.
    pub fn new(config: EmailConfig) -> Self {
        Self {
            config,
            http_client: reqwest::Client::new(),
            api_url: RESEND_API_URL.to_string(),
        }
    }

    /// Overrides the API endpoint (for tests against a local server).
    pub fn with_api_url(mut self, url: impl Into<String>) -> Self {
        self.api_url = url.into();
        self
    }

    fn render_subject(email: &InviteEmail) -> String {
        format!("You're invited to join {}", email.organization_name)
    }

    fn render_body(email: &InviteEmail) -> String {
        format!(
            "<p>You have been invited to join <strong>{}</strong>.</p>\
             <p><a href=\"{}\">Accept your invitation</a></p>\
             <p>This invitation expires on {}.</p>",
            email.organization_name,
            email.invite_link,
            email.expires_at.as_datetime().format("%B %e, %Y"),
        )
    }
}

#[async_trait]
impl InviteEmailSender for ResendEmailSender {
    async fn send(&self, email: &InviteEmail) -> Result<(), EmailError> {
        let request = SendEmailRequest {
            from: self.config.from_address.as_str(),
            to: vec![email.to.as_str()],
            subject: Self::render_subject(email),
            html: Self::render_body(email),
        };

        let response = self
            .http_client
            .post(&self.api_url)
            .bearer_auth(self.config.resend_api_key.expose_secret())
            .json(&request)
            .send()
            .await
            .map_err(|e| EmailError::ServiceUnavailable(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            tracing::warn!(
                status = %status,
                recipient = %email.to,
                "Email provider rejected invitation send"
            );
            return Err(EmailError::SendFailed(format!("{}: {}", status, body)));
        }

        tracing::info!(recipient = %email.to, "Invitation email sent");
        Ok(())
    }
}
