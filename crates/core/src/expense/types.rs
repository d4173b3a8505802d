//! Expense domain types.

use chrono::{DateTime, NaiveDate, Utc};
use expensedesk_shared::types::Currency;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::budget::{ConsumptionRecord, PaymentMethod};
use crate::extraction::{ExtractedInvoice, TaxLine};

/// Expense status in the review workflow.
///
/// Valid transitions:
/// - Draft → Approved | PendingApproval (validate, decided by the budget)
/// - PendingApproval → Approved (approve)
/// - Draft | PendingApproval | Approved → Rejected (reject)
/// - Approved → SubmittedToBc (submit to Business Central)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExpenseStatus {
    /// Uploaded, not yet validated by its owner.
    #[default]
    Draft,
    /// Over budget, waiting for an administrator.
    PendingApproval,
    /// Within budget or approved by a reviewer.
    Approved,
    /// Rejected by a reviewer (terminal).
    Rejected,
    /// Entered in the accounting system (terminal).
    SubmittedToBc,
}

impl ExpenseStatus {
    /// Returns the string representation of the status.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::PendingApproval => "pending_approval",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
            Self::SubmittedToBc => "submitted_to_bc",
        }
    }

    /// Parses a status from a string.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "draft" => Some(Self::Draft),
            "pending_approval" => Some(Self::PendingApproval),
            "approved" => Some(Self::Approved),
            "rejected" => Some(Self::Rejected),
            "submitted_to_bc" => Some(Self::SubmittedToBc),
            _ => None,
        }
    }

    /// Returns true if no further workflow transition is possible.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Rejected | Self::SubmittedToBc)
    }

    /// Returns true if the invoice counts toward monthly consumption.
    #[must_use]
    pub const fn consumes_budget(&self) -> bool {
        !matches!(self, Self::Draft | Self::Rejected)
    }
}

impl fmt::Display for ExpenseStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One submitted receipt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Expense {
    /// Invoice ID.
    pub id: Uuid,
    /// Owner.
    pub user_id: Uuid,
    /// Branch name the expense belongs to.
    pub branch: Option<String>,
    /// Invoice date.
    pub date: Option<NaiveDate>,
    /// Currency.
    pub currency: Currency,
    /// Total amount (the per-share amount once split).
    pub total_amount: Decimal,
    /// Payment method.
    pub payment_method: Option<PaymentMethod>,
    /// Expense category (meals, fuel, lodging...).
    pub category: Option<String>,
    /// Data extracted from the receipt, corrected by the owner.
    pub details: ExtractedInvoice,
    /// Extraction failed, fields must be completed by hand.
    pub ai_failed: bool,
    /// Object storage key of the receipt image.
    pub receipt_key: Option<String>,
    /// Lifecycle status.
    pub status: ExpenseStatus,
    /// Split group shared by all shares of one receipt.
    pub split_group_id: Option<Uuid>,
    /// True for the owner's share of a split.
    pub is_parent: bool,
    /// Pre-split total, on the parent only.
    pub original_amount: Option<Decimal>,
    /// Reviewer of the last approve/reject.
    pub reviewed_by: Option<Uuid>,
    /// When it was reviewed.
    pub reviewed_at: Option<DateTime<Utc>>,
    /// Why it was rejected.
    pub rejection_reason: Option<String>,
    /// When it was entered in Business Central.
    pub submitted_to_bc_at: Option<DateTime<Utc>>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last update timestamp.
    pub updated_at: DateTime<Utc>,
}

impl Expense {
    /// A fresh draft owned by `user_id`.
    #[must_use]
    pub fn draft(user_id: Uuid) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::now_v7(),
            user_id,
            branch: None,
            date: None,
            currency: Currency::default(),
            total_amount: Decimal::ZERO,
            payment_method: None,
            category: None,
            details: ExtractedInvoice::default(),
            ai_failed: false,
            receipt_key: None,
            status: ExpenseStatus::Draft,
            split_group_id: None,
            is_parent: false,
            original_amount: None,
            reviewed_by: None,
            reviewed_at: None,
            rejection_reason: None,
            submitted_to_bc_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Vendor name, if known.
    #[must_use]
    pub fn vendor(&self) -> Option<&str> {
        self.details.vendor.as_deref()
    }

    /// Returns true if this invoice belongs to a split group.
    #[must_use]
    pub const fn is_split(&self) -> bool {
        self.split_group_id.is_some()
    }

    /// Projection used by the budget evaluator.
    #[must_use]
    pub fn consumption_record(&self) -> ConsumptionRecord {
        ConsumptionRecord {
            invoice_id: self.id,
            user_id: self.user_id,
            date: self.date,
            amount: self.total_amount,
            status: self.status,
            payment_method: self.payment_method,
        }
    }
}

/// Owner corrections submitted with the check/validate forms.
///
/// Every field is optional; absent fields keep the stored value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExpenseForm {
    /// Invoice date.
    pub date: Option<NaiveDate>,
    /// Total amount.
    pub total_amount: Option<Decimal>,
    /// Currency.
    pub currency: Option<Currency>,
    /// Payment method.
    pub payment_method: Option<PaymentMethod>,
    /// Category.
    pub category: Option<String>,
    /// Branch name.
    pub branch: Option<String>,
    /// Vendor name.
    pub vendor: Option<String>,
    /// Vendor tax ID.
    pub cuit: Option<String>,
    /// Invoice number.
    pub invoice_number: Option<String>,
    /// Invoice letter (A, B, C, M, ticket...).
    pub letter_type: Option<String>,
    /// Itemized taxes, replacing the extracted ones when present.
    pub taxes: Option<Vec<TaxLine>>,
}

impl ExpenseForm {
    /// Applies the overrides onto an expense.
    pub fn apply(&self, expense: &mut Expense) {
        if let Some(date) = self.date {
            expense.date = Some(date);
        }
        if let Some(amount) = self.total_amount {
            expense.total_amount = amount;
        }
        if let Some(currency) = self.currency {
            expense.currency = currency;
        }
        if let Some(method) = self.payment_method {
            expense.payment_method = Some(method);
        }
        if let Some(category) = non_blank(self.category.as_deref()) {
            expense.category = Some(category);
        }
        if let Some(branch) = non_blank(self.branch.as_deref()) {
            expense.branch = Some(branch);
        }
        if let Some(vendor) = non_blank(self.vendor.as_deref()) {
            expense.details.vendor = Some(vendor);
        }
        if let Some(cuit) = non_blank(self.cuit.as_deref()) {
            expense.details.cuit = Some(cuit);
        }
        if let Some(number) = non_blank(self.invoice_number.as_deref()) {
            expense.details.invoice_number = Some(number);
        }
        if let Some(letter) = non_blank(self.letter_type.as_deref()) {
            expense.details.letter_type = Some(letter);
        }
        if let Some(taxes) = &self.taxes {
            expense.details.taxes.clone_from(taxes);
        }
    }
}

fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// Body of the validate operation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ValidateInvoiceInput {
    /// Owner corrections.
    #[serde(flatten)]
    pub form: ExpenseForm,
    /// Other users sharing this expense. Empty for a plain validation.
    #[serde(default)]
    pub participants: Vec<Uuid>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_status_roundtrip_strings() {
        for status in [
            ExpenseStatus::Draft,
            ExpenseStatus::PendingApproval,
            ExpenseStatus::Approved,
            ExpenseStatus::Rejected,
            ExpenseStatus::SubmittedToBc,
        ] {
            assert_eq!(ExpenseStatus::parse(status.as_str()), Some(status));
        }
        assert_eq!(ExpenseStatus::parse("posted"), None);
    }

    #[test]
    fn test_status_flags() {
        assert!(ExpenseStatus::Rejected.is_terminal());
        assert!(ExpenseStatus::SubmittedToBc.is_terminal());
        assert!(!ExpenseStatus::Approved.is_terminal());
        assert!(!ExpenseStatus::Draft.consumes_budget());
        assert!(!ExpenseStatus::Rejected.consumes_budget());
        assert!(ExpenseStatus::PendingApproval.consumes_budget());
    }

    #[test]
    fn test_form_apply_keeps_absent_fields() {
        let mut expense = Expense::draft(Uuid::new_v4());
        expense.category = Some("fuel".to_string());
        expense.total_amount = dec!(100);

        let form = ExpenseForm {
            total_amount: Some(dec!(150.50)),
            vendor: Some("  YPF  ".to_string()),
            category: Some("   ".to_string()),
            ..ExpenseForm::default()
        };
        form.apply(&mut expense);

        assert_eq!(expense.total_amount, dec!(150.50));
        assert_eq!(expense.vendor(), Some("YPF"));
        assert_eq!(expense.category.as_deref(), Some("fuel"));
    }

    #[test]
    fn test_validate_input_deserializes_flat() {
        let participant = Uuid::new_v4();
        let input: ValidateInvoiceInput = serde_json::from_value(serde_json::json!({
            "total_amount": "300.00",
            "payment_method": "cash",
            "participants": [participant],
        }))
        .expect("valid input");

        assert_eq!(input.form.total_amount, Some(dec!(300.00)));
        assert_eq!(input.form.payment_method, Some(PaymentMethod::Cash));
        assert_eq!(input.participants, vec![participant]);
    }
}
