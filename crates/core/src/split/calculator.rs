//! Split planning.

use chrono::Utc;
use expensedesk_shared::types::money::round_cents;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::expense::{Expense, ExpenseError, ExpenseStatus};

/// How one receipt is divided.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SplitPlan {
    /// Fresh group id stamped on every share.
    pub group_id: Uuid,
    /// Pre-split total.
    pub total: Decimal,
    /// Per-share amount, rounded to cents.
    pub share: Decimal,
    /// Other participants, owner excluded, deduplicated.
    pub participants: Vec<Uuid>,
}

impl SplitPlan {
    /// Number of shares, owner included.
    #[must_use]
    pub fn count(&self) -> usize {
        self.participants.len() + 1
    }

    /// Absolute difference between the sum of shares and the total.
    ///
    /// At most `(count - 1) * 0.01`; the drift is kept, never redistributed.
    #[must_use]
    pub fn drift(&self) -> Decimal {
        (self.share * Decimal::from(self.count()) - self.total).abs()
    }
}

/// Stateless split calculator.
pub struct SplitCalculator;

impl SplitCalculator {
    /// `round(total / count, 2)`, midpoint away from zero.
    #[must_use]
    pub fn share(total: Decimal, count: usize) -> Decimal {
        if count == 0 {
            return total;
        }
        round_cents(total / Decimal::from(count))
    }

    /// Requested participants without the owner and without duplicates,
    /// in request order.
    #[must_use]
    pub fn participants(owner: Uuid, requested: &[Uuid]) -> Vec<Uuid> {
        let mut out: Vec<Uuid> = Vec::with_capacity(requested.len());
        for id in requested {
            if *id != owner && !out.contains(id) {
                out.push(*id);
            }
        }
        out
    }

    /// Plans the split of `expense`.
    ///
    /// # Errors
    ///
    /// `AlreadySplit` if the invoice belongs to a group, `NoParticipants`
    /// if nobody but the owner was named.
    pub fn plan(expense: &Expense, requested: &[Uuid]) -> Result<SplitPlan, ExpenseError> {
        if let Some(group) = expense.split_group_id {
            return Err(ExpenseError::AlreadySplit(group));
        }

        let participants = Self::participants(expense.user_id, requested);
        if participants.is_empty() {
            return Err(ExpenseError::NoParticipants);
        }

        let total = expense.total_amount;
        Ok(SplitPlan {
            group_id: Uuid::now_v7(),
            total,
            share: Self::share(total, participants.len() + 1),
            participants,
        })
    }

    /// Turns the owner's invoice into the parent share.
    pub fn apply_parent(plan: &SplitPlan, parent: &mut Expense) {
        parent.original_amount = Some(plan.total);
        parent.total_amount = plan.share;
        parent.is_parent = true;
        parent.split_group_id = Some(plan.group_id);
        parent.updated_at = Utc::now();
    }

    /// Child share for one participant, cloned from the parent's descriptive
    /// fields. Starts as a draft until its own budget is evaluated.
    #[must_use]
    pub fn child_for(plan: &SplitPlan, parent: &Expense, participant: Uuid) -> Expense {
        let now = Utc::now();
        Expense {
            id: Uuid::now_v7(),
            user_id: participant,
            total_amount: plan.share,
            status: ExpenseStatus::Draft,
            split_group_id: Some(plan.group_id),
            is_parent: false,
            original_amount: None,
            reviewed_by: None,
            reviewed_at: None,
            rejection_reason: None,
            submitted_to_bc_at: None,
            created_at: now,
            updated_at: now,
            ..parent.clone()
        }
    }
}
