//! # Email Service
//!
//! Outgoing mail behind the [`EmailService`] trait, so registration can be
//! exercised without a real provider.
//!
//! ## Implementations
//!
//! - [`LogEmailer`] - Development/testing implementation that writes mails to the log
//! - [`ExternalEmailer`] - Production implementation posting to an HTTP mail API
//!
//! The implementation is picked from `APP_ENV` when the router is built, see
//! [`crate::app`].

use std::sync::LazyLock;

use async_trait::async_trait;
use minijinja::{Environment, Value, context};
use serde_json::json;
use thiserror::Error;
use tracing::{debug, error, info, instrument};

/// Errors that can occur during email operations
#[derive(Debug, Error)]
pub enum EmailError {
    #[error("Failed to send email: {0}")]
    SendFailed(String),
    #[error("Failed to render email: {0}")]
    Render(String),
}

/// Trait for email sending services
#[async_trait]
pub trait EmailService: Send + Sync {
    /// Sends an email to the specified recipient.
    ///
    /// # Errors
    ///
    /// Returns [`EmailError::SendFailed`] if the provider rejects the message or
    /// cannot be reached.
    async fn send_email(
        &self,
        recipient: &str,
        subject: &str,
        body_html: &str,
    ) -> Result<(), EmailError>;
}

/// Subject line of the account verification mail
pub const VERIFICATION_SUBJECT: &str = "Verify your email";

const VERIFICATION_TEMPLATE: &str = "\
<p>Hi {{ first_name }},</p>\
<p>Please verify your email by clicking: <a href=\"{{ link }}\">{{ link }}</a></p>\
<p>If you did not create an account, you can ignore this message.</p>";

/// Mail templates. The `.html` suffix turns on HTML auto-escaping.
static TEMPLATES: LazyLock<Environment<'static>> = LazyLock::new(|| {
    let mut env = Environment::new();
    env.add_template("verification.html", VERIFICATION_TEMPLATE)
        .expect("verification template is valid");
    env
});

/// Renders the HTML body of the account verification mail.
///
/// `first_name` is user input and is escaped. `link` is built by the server
/// from URL-safe parts and is inserted as is.
pub fn verification_body(first_name: &str, link: &str) -> Result<String, EmailError> {
    TEMPLATES
        .get_template("verification.html")
        .and_then(|template| {
            template.render(context! {
                first_name => first_name,
                link => Value::from_safe_string(link.to_string()),
            })
        })
        .map_err(|e| EmailError::Render(e.to_string()))
}

/// Sends the verification mail for a freshly registered account.
pub async fn send_verification_email(
    email_service: &dyn EmailService,
    recipient: &str,
    first_name: &str,
    link: &str,
) -> Result<(), EmailError> {
    let body = verification_body(first_name, link)?;
    email_service
        .send_email(recipient, VERIFICATION_SUBJECT, &body)
        .await
}

/// Mock email service for development and testing
///
/// Logs the message instead of delivering it.
pub struct LogEmailer;

#[async_trait]
impl EmailService for LogEmailer {
    #[instrument(skip(self, body_html), fields(recipient = %recipient, subject = %subject))]
    async fn send_email(
        &self,
        recipient: &str,
        subject: &str,
        body_html: &str,
    ) -> Result<(), EmailError> {
        info!(body = %body_html, "Mock email sent");
        Ok(())
    }
}

/// External email service for production use
///
/// # Configuration
///
/// Requires the following environment variables in production:
/// - `MAIL_API_URL` - Base URL of the email API
/// - `MAIL_API_KEY` - Authentication key for the email API
/// - `SENDER_EMAIL` - Email address to use as sender
pub struct ExternalEmailer {
    api_url: String,
    api_key: String,
    sender_email: String,
    http_client: reqwest::Client,
}

impl ExternalEmailer {
    pub fn new(api_url: String, api_key: String, sender_email: String) -> Self {
        info!(
            api_url = %api_url,
            sender_email = %sender_email,
            "Initializing external email service"
        );

        Self {
            api_url,
            api_key,
            sender_email,
            http_client: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl EmailService for ExternalEmailer {
    #[instrument(
        skip(self, body_html),
        fields(
            recipient = %recipient,
            subject = %subject,
            sender = %self.sender_email
        )
    )]
    async fn send_email(
        &self,
        recipient: &str,
        subject: &str,
        body_html: &str,
    ) -> Result<(), EmailError> {
        debug!("Sending HTTP request to email API");

        let payload = json!({
            "to": recipient,
            "from": self.sender_email,
            "subject": subject,
            "content": [{ "type": "text/html", "value": body_html }]
        });

        let response = self
            .http_client
            .post(&self.api_url)
            .basic_auth("api", Some(&self.api_key))
            .json(&payload)
            .send()
            .await
            .map_err(|e| {
                error!(error = %e, "Network request to email API failed");
                EmailError::SendFailed(format!("Network request error: {e}"))
            })?;

        if response.status().is_success() {
            info!("Email sent successfully via external API");
            return Ok(());
        }

        let status = response.status();
        let error_body = response
            .text()
            .await
            .unwrap_or_else(|_| "Failed to read error response body".to_string());
        error!(
            status = %status,
            error_body = %error_body,
            "External email API returned error"
        );
        Err(EmailError::SendFailed(format!(
            "Email provider returned {status}: {error_body}"
        )))
    }
}
