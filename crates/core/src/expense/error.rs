//! Expense error types.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use thiserror::Error;
use uuid::Uuid;

use super::types::ExpenseStatus;

/// Errors that can occur during expense operations.
#[derive(Debug, Error)]
pub enum ExpenseError {
    /// Expense not found.
    #[error("Expense {0} not found")]
    NotFound(Uuid),

    /// Caller may not perform this operation.
    #[error("Not allowed: {0}")]
    Forbidden(String),

    /// Mandatory fields are empty.
    #[error("Missing required fields: {}", .0.join(", "))]
    MissingFields(Vec<&'static str>),

    /// Amount must be strictly positive and fit the stored precision.
    #[error("Amount must be greater than zero and below one quadrillion, got {0}")]
    InvalidAmount(Decimal),

    /// A tax line is negative or does not fit the stored precision.
    #[error("Tax '{name}' has an invalid amount {amount}")]
    InvalidTaxAmount {
        /// Tax name.
        name: String,
        /// Offending amount.
        amount: Decimal,
    },

    /// Invoice date is older than the accepted window.
    #[error("Invoice date {date} is older than {oldest_allowed}")]
    StaleInvoice {
        /// Invoice date.
        date: NaiveDate,
        /// Oldest accepted date.
        oldest_allowed: NaiveDate,
    },

    /// Invoice date is after today.
    #[error("Invoice date {0} is in the future")]
    FutureDate(NaiveDate),

    /// The invoice already belongs to a split group.
    #[error("Expense is already split (group {0})")]
    AlreadySplit(Uuid),

    /// A split was requested without anyone besides the owner.
    #[error("A split needs at least one participant besides the owner")]
    NoParticipants,

    /// Participant has no profile.
    #[error("Participant {0} has no profile")]
    UnknownParticipant(Uuid),

    /// Attempted an invalid status transition.
    #[error("Invalid status transition from {from} to {to}")]
    InvalidTransition {
        /// The current status.
        from: ExpenseStatus,
        /// The attempted target status.
        to: ExpenseStatus,
    },

    /// Rejection reason is required but not provided.
    #[error("Rejection reason is required")]
    RejectionReasonRequired,

    /// Submitted expenses can only be deleted by an administrator.
    #[error("Expense was already submitted to the accounting system")]
    CannotDeleteSubmitted,

    /// Database error.
    #[error("Database error: {0}")]
    Database(String),
}

impl ExpenseError {
    /// Returns the HTTP status code for this error.
    #[must_use]
    pub fn status_code(&self) -> u16 {
        match self {
            Self::MissingFields(_)
            | Self::InvalidAmount(_)
            | Self::InvalidTaxAmount { .. }
            | Self::StaleInvoice { .. }
            | Self::FutureDate(_)
            | Self::NoParticipants
            | Self::InvalidTransition { .. }
            | Self::RejectionReasonRequired
            | Self::CannotDeleteSubmitted => 400,

            Self::Forbidden(_) => 403,

            Self::NotFound(_) | Self::UnknownParticipant(_) => 404,

            Self::AlreadySplit(_) => 409,

            Self::Database(_) => 500,
        }
    }

    /// Returns the error code for API responses.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::NotFound(_) => "EXPENSE_NOT_FOUND",
            Self::Forbidden(_) => "FORBIDDEN",
            Self::MissingFields(_) => "MISSING_FIELDS",
            Self::InvalidAmount(_) => "INVALID_AMOUNT",
            Self::InvalidTaxAmount { .. } => "INVALID_TAX_AMOUNT",
            Self::StaleInvoice { .. } => "STALE_INVOICE",
            Self::FutureDate(_) => "FUTURE_DATE",
            Self::AlreadySplit(_) => "ALREADY_SPLIT",
            Self::NoParticipants => "NO_PARTICIPANTS",
            Self::UnknownParticipant(_) => "UNKNOWN_PARTICIPANT",
            Self::InvalidTransition { .. } => "INVALID_TRANSITION",
            Self::RejectionReasonRequired => "REJECTION_REASON_REQUIRED",
            Self::CannotDeleteSubmitted => "CANNOT_DELETE_SUBMITTED",
            Self::Database(_) => "DATABASE_ERROR",
        }
    }

    /// Shorthand for a forbidden error.
    #[must_use]
    pub fn forbidden(msg: impl Into<String>) -> Self {
        Self::Forbidden(msg.into())
    }
}
