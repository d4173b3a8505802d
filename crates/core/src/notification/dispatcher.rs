//! Recipient routing and delivery.

use std::future::Future;
use std::sync::Arc;

use expensedesk_shared::EmailService;
use tokio::task::JoinHandle;
use uuid::Uuid;

use super::templates::render;
use super::types::{
    DeliveryReport, ExpenseContext, NotificationError, NotificationRequest, OwnerInfo,
};
use crate::budget::BudgetVerdict;

/// Profile lookups needed for routing.
///
/// Implemented by the db crate.
pub trait RecipientDirectory: Send + Sync {
    /// Emails of every administrator that has one.
    fn admin_emails(&self) -> impl Future<Output = Result<Vec<String>, NotificationError>> + Send;

    /// Emails of the branch managers assigned to `branch`.
    fn manager_emails(
        &self,
        branch: &str,
    ) -> impl Future<Output = Result<Vec<String>, NotificationError>> + Send;

    /// Owner details for templates and branch fallback.
    fn owner(
        &self,
        user_id: Uuid,
    ) -> impl Future<Output = Result<Option<OwnerInfo>, NotificationError>> + Send;
}

/// Outbound HTML mail.
pub trait Mailer: Send + Sync {
    /// Sends one message to every recipient, returning the message id.
    fn send_html(
        &self,
        recipients: &[String],
        subject: &str,
        html: &str,
    ) -> impl Future<Output = Result<String, NotificationError>> + Send;
}

impl Mailer for EmailService {
    async fn send_html(
        &self,
        recipients: &[String],
        subject: &str,
        html: &str,
    ) -> Result<String, NotificationError> {
        EmailService::send_html(self, recipients, subject, html)
            .await
            .map_err(|e| NotificationError::Delivery(e.to_string()))
    }
}

/// Routes verdicts to recipients and sends the matching template.
pub struct NotificationDispatcher<D: RecipientDirectory, M: Mailer> {
    directory: Arc<D>,
    mailer: Arc<M>,
    frontend_url: String,
}

impl<D: RecipientDirectory, M: Mailer> NotificationDispatcher<D, M> {
    /// Creates a dispatcher.
    #[must_use]
    pub fn new(directory: Arc<D>, mailer: Arc<M>, frontend_url: impl Into<String>) -> Self {
        Self {
            directory,
            mailer,
            frontend_url: frontend_url.into(),
        }
    }

    /// Notifies about one expense. Never fails.
    pub async fn notify(&self, verdict: BudgetVerdict, context: &ExpenseContext) -> DeliveryReport {
        let owner = match self.directory.owner(context.owner_id).await {
            Ok(owner) => owner.unwrap_or_default(),
            Err(e) => {
                tracing::warn!(owner_id = %context.owner_id, error = %e, "Owner lookup failed");
                OwnerInfo::default()
            }
        };

        let recipients = match verdict {
            BudgetVerdict::PendingApproval => self.directory.admin_emails().await,
            BudgetVerdict::Approved => {
                let branch = context
                    .branch
                    .as_deref()
                    .or_else(|| owner.branches.first().map(String::as_str));
                match branch {
                    Some(branch) => self.directory.manager_emails(branch).await,
                    None => {
                        return Self::no_recipients(context, "expense and owner have no branch");
                    }
                }
            }
        };

        let recipients = match recipients {
            Ok(list) => normalize(list),
            Err(e) => {
                tracing::error!(
                    invoice_id = %context.invoice_id,
                    error = %e,
                    "Recipient lookup failed"
                );
                return DeliveryReport::Failed {
                    error: e.to_string(),
                };
            }
        };

        if recipients.is_empty() {
            let warning = match verdict {
                BudgetVerdict::PendingApproval => "no administrator with an email",
                BudgetVerdict::Approved => "no branch manager with an email",
            };
            return Self::no_recipients(context, warning);
        }

        let email = render(verdict, context, &owner, &self.frontend_url);
        match self
            .mailer
            .send_html(&recipients, &email.subject, &email.html)
            .await
        {
            Ok(message_id) => {
                tracing::info!(
                    invoice_id = %context.invoice_id,
                    verdict = ?verdict,
                    recipients = recipients.len(),
                    message_id = %message_id,
                    "Notification sent"
                );
                DeliveryReport::Sent {
                    message_id,
                    recipients: recipients.len(),
                }
            }
            Err(e) => {
                tracing::error!(
                    invoice_id = %context.invoice_id,
                    error = %e,
                    "Notification failed"
                );
                DeliveryReport::Failed {
                    error: e.to_string(),
                }
            }
        }
    }

    fn no_recipients(context: &ExpenseContext, warning: &str) -> DeliveryReport {
        tracing::warn!(invoice_id = %context.invoice_id, warning, "Notification skipped");
        DeliveryReport::NoRecipients {
            warning: warning.to_string(),
        }
    }
}

impl<D, M> NotificationDispatcher<D, M>
where
    D: RecipientDirectory + 'static,
    M: Mailer + 'static,
{
    /// Fires one background task per request and returns immediately.
    pub fn dispatch_all(
        self: &Arc<Self>,
        requests: Vec<NotificationRequest>,
    ) -> Vec<JoinHandle<DeliveryReport>> {
        requests
            .into_iter()
            .map(|request| {
                let dispatcher = Arc::clone(self);
                tokio::spawn(async move {
                    dispatcher
                        .notify(request.verdict, &request.context)
                        .await
                })
            })
            .collect()
    }
}

/// Trims, drops blanks and deduplicates case-insensitively.
fn normalize(emails: Vec<String>) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(emails.len());
    for email in emails {
        let email = email.trim().to_string();
        if !email.is_empty() && !out.iter().any(|e| e.eq_ignore_ascii_case(&email)) {
            out.push(email);
        }
    }
    out
}
