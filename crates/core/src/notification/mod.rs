//! Expense notifications.
//!
//! - Over-budget expenses alert every administrator.
//! - Auto-approved expenses tell the branch managers they are ready for
//!   accounting.
//!
//! Delivery never fails the surrounding operation: every outcome is folded
//! into a [`DeliveryReport`].

mod dispatcher;
mod templates;
mod types;

#[cfg(test)]
#[path = "dispatcher_tests.rs"]
mod tests;

pub use dispatcher::{Mailer, NotificationDispatcher, RecipientDirectory};
pub use templates::{RenderedEmail, render};
pub use types::{DeliveryReport, ExpenseContext, NotificationError, NotificationRequest, OwnerInfo};
