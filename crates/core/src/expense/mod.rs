//! Expense lifecycle and orchestration.
//!
//! # Modules
//!
//! - `types` - Expense record, status and form overrides
//! - `error` - Expense-specific error types
//! - `lifecycle` - Status state machine
//! - `validation` - Required fields, amount and staleness rules
//! - `scope` - Which invoices a caller may list or export
//! - `service` - Store trait and the operations the API calls

pub mod error;
pub mod lifecycle;
pub mod scope;
pub mod service;
pub mod types;
pub mod validation;

#[cfg(test)]
mod lifecycle_props;

pub use error::ExpenseError;
pub use lifecycle::{ExpenseAction, ExpenseLifecycle};
pub use scope::ExpenseScope;
pub use service::{
    ExpenseService, ExpenseStore, SkippedParticipant, ValidatedExpense, ValidationOutcome,
};
pub use types::{Expense, ExpenseForm, ExpenseStatus, ValidateInvoiceInput};
pub use validation::ExpenseValidator;
