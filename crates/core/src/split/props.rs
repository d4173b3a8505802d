//! Property-based tests for split planning.

use proptest::prelude::*;
use rust_decimal::Decimal;
use uuid::Uuid;

use super::SplitCalculator;
use crate::expense::Expense;

proptest! {
    /// Shares sum to within 0.01 per extra participant of the total,
    /// and every share carries the same group id.
    #[test]
    fn prop_split_drift_bounded(
        cents in 1i64..100_000_000,
        others in 1usize..12,
    ) {
        let mut parent = Expense::draft(Uuid::new_v4());
        parent.total_amount = Decimal::new(cents, 2);
        let requested: Vec<Uuid> = (0..others).map(|_| Uuid::new_v4()).collect();

        let plan = SplitCalculator::plan(&parent, &requested).expect("valid plan");
        SplitCalculator::apply_parent(&plan, &mut parent);
        let children: Vec<_> = plan
            .participants
            .iter()
            .map(|p| SplitCalculator::child_for(&plan, &parent, *p))
            .collect();

        let children_sum: Decimal = children.iter().map(|c| c.total_amount).sum();
        let sum = children_sum + parent.total_amount;
        let tolerance = Decimal::new(1, 2) * Decimal::from(others);
        prop_assert!((sum - plan.total).abs() <= tolerance);
        prop_assert_eq!(plan.drift(), (sum - plan.total).abs());

        for child in &children {
            prop_assert_eq!(child.split_group_id, parent.split_group_id);
            prop_assert_eq!(child.total_amount, parent.total_amount);
        }
    }

    /// Shares always have at most two decimals.
    #[test]
    fn prop_share_is_cents(cents in 1i64..100_000_000, count in 1usize..20) {
        let share = SplitCalculator::share(Decimal::new(cents, 2), count);
        prop_assert!(share.scale() <= 2);
    }
}
