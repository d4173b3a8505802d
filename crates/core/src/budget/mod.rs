//! Monthly budget evaluation.
//!
//! Decides whether a validated expense auto-approves or needs review by
//! comparing month-to-date consumption of the same payment class against
//! the user's limit for that class.

pub mod service;
pub mod types;

#[cfg(test)]
mod tests;

pub use service::BudgetEvaluator;
pub use types::{
    BudgetCheck, BudgetEvaluation, BudgetLimits, BudgetVerdict, ClassSpend, ConsumptionRecord,
    MonthWindow, PaymentClass, PaymentMethod, UserSpend,
};
