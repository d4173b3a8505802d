//! Property-based tests for the expense lifecycle.

use proptest::prelude::*;
use uuid::Uuid;

use super::lifecycle::ExpenseLifecycle;
use super::types::ExpenseStatus;
use crate::budget::BudgetVerdict;

fn arb_status() -> impl Strategy<Value = ExpenseStatus> {
    prop_oneof![
        Just(ExpenseStatus::Draft),
        Just(ExpenseStatus::PendingApproval),
        Just(ExpenseStatus::Approved),
        Just(ExpenseStatus::Rejected),
        Just(ExpenseStatus::SubmittedToBc),
    ]
}

fn arb_verdict() -> impl Strategy<Value = BudgetVerdict> {
    prop_oneof![Just(BudgetVerdict::Approved), Just(BudgetVerdict::PendingApproval)]
}

fn arb_uuid() -> impl Strategy<Value = Uuid> {
    any::<u128>().prop_map(Uuid::from_u128)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// Every successful action lands on a transition the table allows.
    #[test]
    fn prop_actions_follow_transition_table(
        status in arb_status(),
        verdict in arb_verdict(),
        reviewer in arb_uuid(),
    ) {
        let attempts = [
            ExpenseLifecycle::validate(status, verdict),
            ExpenseLifecycle::approve(status, reviewer),
            ExpenseLifecycle::reject(status, reviewer, "reason".to_string()),
            ExpenseLifecycle::submit_to_bc(status),
        ];
        for action in attempts.into_iter().flatten() {
            prop_assert!(ExpenseLifecycle::is_valid_transition(status, action.new_status()));
        }
    }

    /// Terminal states accept no transition at all.
    #[test]
    fn prop_terminal_states_are_final(
        verdict in arb_verdict(),
        reviewer in arb_uuid(),
    ) {
        for status in [ExpenseStatus::Rejected, ExpenseStatus::SubmittedToBc] {
            prop_assert!(ExpenseLifecycle::validate(status, verdict).is_err());
            prop_assert!(ExpenseLifecycle::approve(status, reviewer).is_err());
            prop_assert!(ExpenseLifecycle::reject(status, reviewer, "r".into()).is_err());
            prop_assert!(ExpenseLifecycle::submit_to_bc(status).is_err());
        }
    }

    /// Blank reasons are refused whatever the status.
    #[test]
    fn prop_blank_reason_rejected(status in arb_status(), blanks in "[ \t]{0,10}") {
        prop_assert!(ExpenseLifecycle::reject(status, Uuid::nil(), blanks).is_err());
    }
}
