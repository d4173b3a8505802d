//! Even split of one receipt across several users.
//!
//! The owner's invoice becomes the parent share; every other participant
//! gets a cloned child invoice carrying the same group id and share.

mod calculator;

#[cfg(test)]
mod props;

pub use calculator::{SplitCalculator, SplitPlan};
