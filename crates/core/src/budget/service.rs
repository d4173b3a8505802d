//! Budget evaluator.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use uuid::Uuid;

use super::types::{
    BudgetCheck, BudgetEvaluation, BudgetLimits, BudgetVerdict, ClassSpend, ConsumptionRecord,
    MonthWindow, PaymentClass, UserSpend,
};

/// Stateless budget evaluator.
///
/// The store supplies consumption records; nothing here touches I/O.
pub struct BudgetEvaluator;

impl BudgetEvaluator {
    /// Returns true if a record counts toward the month-to-date consumption.
    ///
    /// Drafts are not validated yet and rejected invoices never consume budget.
    #[must_use]
    pub fn counts(
        record: &ConsumptionRecord,
        user_id: Uuid,
        class: PaymentClass,
        window: &MonthWindow,
        exclude: Option<Uuid>,
    ) -> bool {
        record.user_id == user_id
            && record.status.consumes_budget()
            && Some(record.invoice_id) != exclude
            && record.payment_method.is_some_and(|m| m.class() == class)
            && record.date.is_some_and(|d| window.contains(d))
    }

    /// Sums consumption of `class` for a user inside `window`.
    #[must_use]
    pub fn consumption(
        records: &[ConsumptionRecord],
        user_id: Uuid,
        class: PaymentClass,
        window: &MonthWindow,
        exclude: Option<Uuid>,
    ) -> Decimal {
        records
            .iter()
            .filter(|r| Self::counts(r, user_id, class, window, exclude))
            .map(|r| r.amount)
            .sum()
    }

    /// Evaluates one candidate expense.
    ///
    /// `pending_approval` only when `consumed + amount > limit`; landing
    /// exactly on the limit is still approved.
    #[must_use]
    pub fn evaluate(
        check: &BudgetCheck,
        limits: &BudgetLimits,
        records: &[ConsumptionRecord],
    ) -> BudgetEvaluation {
        let window = MonthWindow::containing(check.as_of);
        let consumed = Self::consumption(
            records,
            check.user_id,
            check.payment_class,
            &window,
            check.invoice_id,
        );
        let limit = limits.for_class(check.payment_class);

        let status = if consumed + check.amount > limit {
            BudgetVerdict::PendingApproval
        } else {
            BudgetVerdict::Approved
        };

        BudgetEvaluation {
            status,
            consumed_before_this: consumed,
            limit,
            amount: check.amount,
        }
    }

    /// Month-to-date spend of one user in both classes.
    #[must_use]
    pub fn summarize(
        user_id: Uuid,
        limits: &BudgetLimits,
        as_of: NaiveDate,
        records: &[ConsumptionRecord],
    ) -> UserSpend {
        let window = MonthWindow::containing(as_of);
        let class_spend = |class: PaymentClass| {
            let consumed = Self::consumption(records, user_id, class, &window, None);
            let limit = limits.for_class(class);
            ClassSpend {
                consumed,
                limit,
                utilization_percent: Self::utilization(consumed, limit),
            }
        };

        UserSpend {
            user_id,
            window,
            card: class_spend(PaymentClass::Card),
            cash: class_spend(PaymentClass::CashLike),
        }
    }

    /// consumed / limit as a percentage, two decimals.
    #[must_use]
    pub fn utilization(consumed: Decimal, limit: Decimal) -> Decimal {
        if limit.is_zero() {
            Decimal::ZERO
        } else {
            (consumed / limit * Decimal::ONE_HUNDRED).round_dp(2)
        }
    }
}
