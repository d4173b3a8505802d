//! Email service for sending notification emails.
//!
//! Uses `lettre` for SMTP transport. Bodies are HTML.

use lettre::{
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
    message::{Mailbox, header::ContentType},
    transport::smtp::authentication::Credentials,
};
use thiserror::Error;
use uuid::Uuid;

use crate::config::EmailConfig;

/// Email service errors.
#[derive(Debug, Error)]
pub enum EmailError {
    /// Failed to build email message.
    #[error("Failed to build email: {0}")]
    BuildError(String),
    /// Failed to send email.
    #[error("Failed to send email: {0}")]
    SendError(String),
    /// Invalid email address.
    #[error("Invalid email address: {0}")]
    InvalidAddress(String),
    /// Recipient list was empty.
    #[error("No recipients")]
    NoRecipients,
}

/// Email service for sending transactional emails.
#[derive(Clone)]
pub struct EmailService {
    config: EmailConfig,
}

impl EmailService {
    /// Creates a new email service.
    #[must_use]
    pub const fn new(config: EmailConfig) -> Self {
        Self { config }
    }

    /// Base URL of the web client, for links in templates.
    #[must_use]
    pub fn frontend_url(&self) -> &str {
        &self.config.frontend_url
    }

    /// Creates an SMTP transport.
    fn create_transport(&self) -> Result<AsyncSmtpTransport<Tokio1Executor>, EmailError> {
        let builder = if self.config.smtp_username.is_empty() {
            AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(&self.config.smtp_host)
        } else {
            let creds = Credentials::new(
                self.config.smtp_username.clone(),
                self.config.smtp_password.clone(),
            );
            AsyncSmtpTransport::<Tokio1Executor>::relay(&self.config.smtp_host)
                .map_err(|e| EmailError::SendError(e.to_string()))?
                .credentials(creds)
        };

        Ok(builder.port(self.config.smtp_port).build())
    }

    /// Builds an HTML message addressed to every recipient.
    fn build_message(
        &self,
        recipients: &[String],
        subject: &str,
        html: &str,
        message_id: &str,
    ) -> Result<Message, EmailError> {
        if recipients.is_empty() {
            return Err(EmailError::NoRecipients);
        }

        let from = format!("{} <{}>", self.config.from_name, self.config.from_email);
        let mut builder = Message::builder()
            .from(
                from.parse::<Mailbox>()
                    .map_err(|e| EmailError::InvalidAddress(format!("{e}")))?,
            )
            .subject(subject)
            .message_id(Some(message_id.to_string()))
            .header(ContentType::TEXT_HTML);

        for to in recipients {
            builder = builder.to(to
                .parse::<Mailbox>()
                .map_err(|e| EmailError::InvalidAddress(format!("{to}: {e}")))?);
        }

        builder
            .body(html.to_string())
            .map_err(|e| EmailError::BuildError(e.to_string()))
    }

    /// Sends one HTML email to a list of recipients.
    ///
    /// Returns the generated Message-ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the message cannot be built or the relay refuses it.
    pub async fn send_html(
        &self,
        recipients: &[String],
        subject: &str,
        html: &str,
    ) -> Result<String, EmailError> {
        let domain = self
            .config
            .from_email
            .rsplit_once('@')
            .map_or("localhost", |(_, d)| d);
        let message_id = format!("<{}@{domain}>", Uuid::new_v4());

        let email = self.build_message(recipients, subject, html, &message_id)?;

        let transport = self.create_transport()?;
        transport
            .send(email)
            .await
            .map_err(|e| EmailError::SendError(e.to_string()))?;

        tracing::debug!(message_id = %message_id, recipients = recipients.len(), "Email sent");
        Ok(message_id)
    }
}

#[cfg(test)]
#[path = "email_tests.rs"]
mod tests;
