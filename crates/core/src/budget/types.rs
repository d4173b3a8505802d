//! Budget data types.

use chrono::{Datelike, Months, NaiveDate};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::expense::ExpenseStatus;

/// How an expense was paid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    /// Cash.
    Cash,
    /// Bank transfer.
    Transfer,
    /// Corporate credit card.
    CreditCard,
    /// Corporate debit card.
    DebitCard,
}

impl PaymentMethod {
    /// Returns the string representation of the payment method.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Cash => "cash",
            Self::Transfer => "transfer",
            Self::CreditCard => "credit_card",
            Self::DebitCard => "debit_card",
        }
    }

    /// Parses a payment method, accepting the Spanish labels used on forms.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "cash" | "efectivo" => Some(Self::Cash),
            "transfer" | "transferencia" => Some(Self::Transfer),
            "credit_card" | "credit" | "tarjeta de crédito" | "tarjeta de credito" | "credito" => {
                Some(Self::CreditCard)
            }
            "debit_card" | "debit" | "tarjeta de débito" | "tarjeta de debito" | "debito" => {
                Some(Self::DebitCard)
            }
            _ => None,
        }
    }

    /// Budget family this method counts against.
    #[must_use]
    pub const fn class(&self) -> PaymentClass {
        match self {
            Self::Cash | Self::Transfer => PaymentClass::CashLike,
            Self::CreditCard | Self::DebitCard => PaymentClass::Card,
        }
    }
}

impl std::fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Budget family. Each has its own monthly limit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentClass {
    /// Cash and transfers, limited by `cash_limit`.
    CashLike,
    /// Credit and debit cards, limited by `monthly_limit`.
    Card,
}

/// Per-user monthly limits. `None` means not configured.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BudgetLimits {
    /// Card limit.
    pub monthly_limit: Option<Decimal>,
    /// Cash/transfer limit.
    pub cash_limit: Option<Decimal>,
}

impl BudgetLimits {
    /// Limit for a class. Missing limits are zero so any spend goes to review.
    #[must_use]
    pub fn for_class(&self, class: PaymentClass) -> Decimal {
        match class {
            PaymentClass::Card => self.monthly_limit,
            PaymentClass::CashLike => self.cash_limit,
        }
        .unwrap_or(Decimal::ZERO)
    }
}

/// Inclusive calendar month.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonthWindow {
    /// First day of the month.
    pub start: NaiveDate,
    /// Last day of the month.
    pub end: NaiveDate,
}

impl MonthWindow {
    /// Month containing `date`.
    #[must_use]
    pub fn containing(date: NaiveDate) -> Self {
        let start = date.with_day(1).unwrap_or(date);
        let end = start
            .checked_add_months(Months::new(1))
            .and_then(|next| next.pred_opt())
            .unwrap_or(NaiveDate::MAX);
        Self { start, end }
    }

    /// Returns true if `date` falls inside the window.
    #[must_use]
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }
}

/// Minimal projection of an invoice needed to compute consumption.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsumptionRecord {
    /// Invoice ID.
    pub invoice_id: Uuid,
    /// Invoice owner.
    pub user_id: Uuid,
    /// Invoice date. Undated invoices never count.
    pub date: Option<NaiveDate>,
    /// Total amount (the share, for split invoices).
    pub amount: Decimal,
    /// Lifecycle status.
    pub status: ExpenseStatus,
    /// Payment method, if known.
    pub payment_method: Option<PaymentMethod>,
}

/// One evaluation request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BudgetCheck {
    /// User whose budget is consumed.
    pub user_id: Uuid,
    /// Invoice being validated, excluded from consumption.
    pub invoice_id: Option<Uuid>,
    /// Candidate amount, already validated as positive.
    pub amount: Decimal,
    /// Budget family.
    pub payment_class: PaymentClass,
    /// Date that selects the month window.
    pub as_of: NaiveDate,
}

/// Outcome of a budget evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BudgetVerdict {
    /// Within budget.
    Approved,
    /// Over budget, needs an administrator.
    PendingApproval,
}

impl BudgetVerdict {
    /// Status the invoice takes on validation.
    #[must_use]
    pub const fn status(&self) -> ExpenseStatus {
        match self {
            Self::Approved => ExpenseStatus::Approved,
            Self::PendingApproval => ExpenseStatus::PendingApproval,
        }
    }
}

/// Verdict with the figures it was computed from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BudgetEvaluation {
    /// Verdict.
    pub status: BudgetVerdict,
    /// Month-to-date consumption before this invoice.
    pub consumed_before_this: Decimal,
    /// Limit for the class (zero when not configured).
    pub limit: Decimal,
    /// Amount evaluated.
    pub amount: Decimal,
}

impl BudgetEvaluation {
    /// Remaining budget after this invoice, may be negative.
    #[must_use]
    pub fn remaining(&self) -> Decimal {
        self.limit - self.consumed_before_this - self.amount
    }
}

/// Spend of one class against its limit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassSpend {
    /// Month-to-date consumption.
    pub consumed: Decimal,
    /// Limit (zero when not configured).
    pub limit: Decimal,
    /// consumed / limit * 100, two decimals. Zero when the limit is zero.
    pub utilization_percent: Decimal,
}

/// Month-to-date spend of one user, for branch review.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserSpend {
    /// User ID.
    pub user_id: Uuid,
    /// Month reviewed.
    pub window: MonthWindow,
    /// Card spend.
    pub card: ClassSpend,
    /// Cash/transfer spend.
    pub cash: ClassSpend,
}
