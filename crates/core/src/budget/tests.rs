//! Property-based tests for the budget evaluator.

use chrono::NaiveDate;
use proptest::prelude::*;
use rust_decimal::Decimal;
use uuid::Uuid;

use super::service::BudgetEvaluator;
use super::types::{
    BudgetCheck, BudgetLimits, BudgetVerdict, ConsumptionRecord, PaymentClass, PaymentMethod,
};
use crate::expense::ExpenseStatus;

fn arb_cents() -> impl Strategy<Value = Decimal> {
    (0i64..100_000_000).prop_map(|c| Decimal::new(c, 2))
}

fn arb_status() -> impl Strategy<Value = ExpenseStatus> {
    prop_oneof![
        Just(ExpenseStatus::Draft),
        Just(ExpenseStatus::PendingApproval),
        Just(ExpenseStatus::Approved),
        Just(ExpenseStatus::Rejected),
        Just(ExpenseStatus::SubmittedToBc),
    ]
}

fn as_of() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 5, 20).expect("valid date")
}

fn card_record(user_id: Uuid, amount: Decimal, status: ExpenseStatus) -> ConsumptionRecord {
    ConsumptionRecord {
        invoice_id: Uuid::new_v4(),
        user_id,
        date: Some(as_of()),
        amount,
        status,
        payment_method: Some(PaymentMethod::CreditCard),
    }
}

proptest! {
    /// C + A <= L approves, C + A > L goes to review.
    #[test]
    fn prop_verdict_follows_strict_threshold(
        limit in arb_cents(),
        consumed in arb_cents(),
        amount in arb_cents(),
    ) {
        let user = Uuid::new_v4();
        let records = vec![card_record(user, consumed, ExpenseStatus::Approved)];
        let check = BudgetCheck {
            user_id: user,
            invoice_id: None,
            amount,
            payment_class: PaymentClass::Card,
            as_of: as_of(),
        };
        let limits = BudgetLimits { monthly_limit: Some(limit), cash_limit: None };

        let result = BudgetEvaluator::evaluate(&check, &limits, &records);

        prop_assert_eq!(result.consumed_before_this, consumed);
        if consumed + amount > limit {
            prop_assert_eq!(result.status, BudgetVerdict::PendingApproval);
        } else {
            prop_assert_eq!(result.status, BudgetVerdict::Approved);
        }
    }

    /// Rejected invoices never add to consumption, whatever their amount.
    #[test]
    fn prop_rejected_never_consumes(
        amounts in prop::collection::vec((arb_cents(), arb_status()), 0..20),
    ) {
        let user = Uuid::new_v4();
        let records: Vec<_> = amounts
            .iter()
            .map(|(a, s)| card_record(user, *a, *s))
            .collect();
        let expected: Decimal = amounts
            .iter()
            .filter(|(_, s)| !matches!(s, ExpenseStatus::Rejected | ExpenseStatus::Draft))
            .map(|(a, _)| *a)
            .sum();

        let window = super::types::MonthWindow::containing(as_of());
        let consumed =
            BudgetEvaluator::consumption(&records, user, PaymentClass::Card, &window, None);
        prop_assert_eq!(consumed, expected);
    }

    /// Utilization never divides by a zero limit.
    #[test]
    fn prop_utilization_zero_limit(consumed in arb_cents()) {
        prop_assert_eq!(BudgetEvaluator::utilization(consumed, Decimal::ZERO), Decimal::ZERO);
    }
}
