//! Notification types.

use chrono::NaiveDate;
use expensedesk_shared::types::Currency;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::budget::{BudgetEvaluation, BudgetVerdict};
use crate::expense::Expense;

/// Directory or provider failure.
#[derive(Debug, Error)]
pub enum NotificationError {
    /// Recipient lookup failed.
    #[error("recipient lookup failed: {0}")]
    Directory(String),
    /// Mail provider refused or failed.
    #[error("delivery failed: {0}")]
    Delivery(String),
}

/// What the templates need to know about the owner.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OwnerInfo {
    /// Display name.
    pub full_name: Option<String>,
    /// Email.
    pub email: Option<String>,
    /// Assigned branches, primary first.
    pub branches: Vec<String>,
}

impl OwnerInfo {
    /// Name to print in emails.
    #[must_use]
    pub fn display_name(&self) -> &str {
        self.full_name
            .as_deref()
            .or(self.email.as_deref())
            .unwrap_or("Un usuario")
    }
}

/// Snapshot of an expense taken after persistence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExpenseContext {
    /// Invoice ID.
    pub invoice_id: Uuid,
    /// Owner.
    pub owner_id: Uuid,
    /// Branch on the invoice.
    pub branch: Option<String>,
    /// Amount (share, when split).
    pub amount: Decimal,
    /// Currency.
    pub currency: Currency,
    /// Vendor.
    pub vendor: Option<String>,
    /// Invoice date.
    pub date: Option<NaiveDate>,
    /// Category.
    pub category: Option<String>,
    /// Figures behind the verdict, when it came from the evaluator.
    pub evaluation: Option<BudgetEvaluation>,
}

impl ExpenseContext {
    /// Builds the context from a persisted expense.
    #[must_use]
    pub fn from_expense(expense: &Expense, evaluation: Option<BudgetEvaluation>) -> Self {
        Self {
            invoice_id: expense.id,
            owner_id: expense.user_id,
            branch: expense.branch.clone(),
            amount: expense.total_amount,
            currency: expense.currency,
            vendor: expense.details.vendor.clone(),
            date: expense.date,
            category: expense.category.clone(),
            evaluation,
        }
    }
}

/// One pending dispatch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationRequest {
    /// Routing decision.
    pub verdict: BudgetVerdict,
    /// Expense snapshot.
    pub context: ExpenseContext,
}

impl NotificationRequest {
    /// Request for a persisted expense.
    #[must_use]
    pub fn new(
        verdict: BudgetVerdict,
        expense: &Expense,
        evaluation: Option<BudgetEvaluation>,
    ) -> Self {
        Self {
            verdict,
            context: ExpenseContext::from_expense(expense, evaluation),
        }
    }
}

/// Outcome of one dispatch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum DeliveryReport {
    /// Accepted by the mail provider.
    Sent {
        /// Provider message id.
        message_id: String,
        /// Number of recipients.
        recipients: usize,
    },
    /// Nobody to notify; not an error.
    NoRecipients {
        /// Why nobody was found.
        warning: String,
    },
    /// Lookup or delivery failed.
    Failed {
        /// Failure detail.
        error: String,
    },
}

impl DeliveryReport {
    /// Returns true if the email left.
    #[must_use]
    pub const fn is_sent(&self) -> bool {
        matches!(self, Self::Sent { .. })
    }
}
