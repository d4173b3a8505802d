//! Core business logic for ExpenseDesk.
//!
//! This crate contains the expense rules with ZERO web or database dependencies.
//! Persistence and delivery are reached through traits implemented elsewhere.
//!
//! # Modules
//!
//! - `auth` - Per-request authorization context
//! - `budget` - Monthly budget evaluation and branch spend summaries
//! - `split` - Even split of one expense across participants
//! - `expense` - Expense lifecycle, validation and orchestration
//! - `accounting` - Business Central row generation and TSV export
//! - `notification` - Admin alerts and manager notifications
//! - `extraction` - Vision model receipt extraction
//! - `provisioning` - User provisioning saga
//! - `storage` - Receipt blob storage

pub mod accounting;
pub mod auth;
pub mod budget;
pub mod expense;
pub mod extraction;
pub mod notification;
pub mod provisioning;
pub mod split;
pub mod storage;
