//! Expense status state machine.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::error::ExpenseError;
use super::types::{Expense, ExpenseStatus};
use crate::budget::BudgetVerdict;

/// A validated status transition with its audit data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExpenseAction {
    /// Owner validated the draft; the budget picked the status.
    Validate {
        /// Approved or pending approval.
        new_status: ExpenseStatus,
    },
    /// Reviewer approved an over-budget expense.
    Approve {
        /// The new status after approval.
        new_status: ExpenseStatus,
        /// Reviewer.
        reviewed_by: Uuid,
        /// When it was approved.
        reviewed_at: DateTime<Utc>,
    },
    /// Reviewer rejected the expense.
    Reject {
        /// The new status after rejection.
        new_status: ExpenseStatus,
        /// Reviewer.
        reviewed_by: Uuid,
        /// When it was rejected.
        reviewed_at: DateTime<Utc>,
        /// The reason for rejection.
        rejection_reason: String,
    },
    /// Accounting entry confirmed in Business Central.
    SubmitToBc {
        /// The new status after submission.
        new_status: ExpenseStatus,
        /// When it was submitted.
        submitted_at: DateTime<Utc>,
    },
}

impl ExpenseAction {
    /// Returns the status the action moves to.
    #[must_use]
    pub fn new_status(&self) -> ExpenseStatus {
        match self {
            Self::Validate { new_status }
            | Self::Approve { new_status, .. }
            | Self::Reject { new_status, .. }
            | Self::SubmitToBc { new_status, .. } => *new_status,
        }
    }

    /// Writes the transition onto the expense.
    pub fn apply(self, expense: &mut Expense) {
        expense.status = self.new_status();
        expense.updated_at = Utc::now();
        match self {
            Self::Validate { .. } => {}
            Self::Approve {
                reviewed_by,
                reviewed_at,
                ..
            } => {
                expense.reviewed_by = Some(reviewed_by);
                expense.reviewed_at = Some(reviewed_at);
                expense.rejection_reason = None;
            }
            Self::Reject {
                reviewed_by,
                reviewed_at,
                rejection_reason,
                ..
            } => {
                expense.reviewed_by = Some(reviewed_by);
                expense.reviewed_at = Some(reviewed_at);
                expense.rejection_reason = Some(rejection_reason);
            }
            Self::SubmitToBc { submitted_at, .. } => {
                expense.submitted_to_bc_at = Some(submitted_at);
            }
        }
    }
}

/// Stateless lifecycle rules.
pub struct ExpenseLifecycle;

impl ExpenseLifecycle {
    /// Validate a draft (or re-validate a pending one after corrections).
    pub fn validate(
        current: ExpenseStatus,
        verdict: BudgetVerdict,
    ) -> Result<ExpenseAction, ExpenseError> {
        let target = verdict.status();
        match current {
            ExpenseStatus::Draft | ExpenseStatus::PendingApproval => {
                Ok(ExpenseAction::Validate { new_status: target })
            }
            _ => Err(ExpenseError::InvalidTransition {
                from: current,
                to: target,
            }),
        }
    }

    /// Approve a pending expense.
    pub fn approve(current: ExpenseStatus, reviewer: Uuid) -> Result<ExpenseAction, ExpenseError> {
        match current {
            ExpenseStatus::PendingApproval => Ok(ExpenseAction::Approve {
                new_status: ExpenseStatus::Approved,
                reviewed_by: reviewer,
                reviewed_at: Utc::now(),
            }),
            _ => Err(ExpenseError::InvalidTransition {
                from: current,
                to: ExpenseStatus::Approved,
            }),
        }
    }

    /// Reject any non-terminal expense. A reason is mandatory.
    pub fn reject(
        current: ExpenseStatus,
        reviewer: Uuid,
        reason: String,
    ) -> Result<ExpenseAction, ExpenseError> {
        if reason.trim().is_empty() {
            return Err(ExpenseError::RejectionReasonRequired);
        }

        if current.is_terminal() {
            return Err(ExpenseError::InvalidTransition {
                from: current,
                to: ExpenseStatus::Rejected,
            });
        }

        Ok(ExpenseAction::Reject {
            new_status: ExpenseStatus::Rejected,
            reviewed_by: reviewer,
            reviewed_at: Utc::now(),
            rejection_reason: reason.trim().to_string(),
        })
    }

    /// Mark an approved expense as entered in the accounting system.
    pub fn submit_to_bc(current: ExpenseStatus) -> Result<ExpenseAction, ExpenseError> {
        match current {
            ExpenseStatus::Approved => Ok(ExpenseAction::SubmitToBc {
                new_status: ExpenseStatus::SubmittedToBc,
                submitted_at: Utc::now(),
            }),
            _ => Err(ExpenseError::InvalidTransition {
                from: current,
                to: ExpenseStatus::SubmittedToBc,
            }),
        }
    }

    /// Owners may delete until submission; admins always.
    pub fn ensure_deletable(current: ExpenseStatus, is_admin: bool) -> Result<(), ExpenseError> {
        if current == ExpenseStatus::SubmittedToBc && !is_admin {
            return Err(ExpenseError::CannotDeleteSubmitted);
        }
        Ok(())
    }

    /// Check if a status transition is valid.
    #[must_use]
    pub fn is_valid_transition(from: ExpenseStatus, to: ExpenseStatus) -> bool {
        matches!(
            (from, to),
            (
                ExpenseStatus::Draft | ExpenseStatus::PendingApproval,
                ExpenseStatus::Approved | ExpenseStatus::PendingApproval
            ) | (
                ExpenseStatus::Draft | ExpenseStatus::PendingApproval | ExpenseStatus::Approved,
                ExpenseStatus::Rejected
            ) | (ExpenseStatus::Approved, ExpenseStatus::SubmittedToBc)
        )
    }
}
