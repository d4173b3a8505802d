//! Shared types, errors, and configuration for ExpenseDesk.
//!
//! This crate provides common building blocks used across all other crates:
//! - Application configuration (server, database, policy, accounting tables)
//! - Application-wide error types
//! - JWT validation for identity-provider tokens
//! - SMTP email delivery
//! - Currency and pagination types

pub mod auth;
pub mod config;
pub mod email;
pub mod error;
pub mod jwt;
pub mod types;

pub use auth::Claims;
pub use config::{
    AccountingConfig, AppConfig, EmailConfig, IdentityConfig, PolicyConfig, StorageProvider,
    StorageSettings, VisionConfig,
};
pub use email::{EmailError, EmailService};
pub use error::{AppError, AppResult};
pub use jwt::{JwtConfig, JwtError, JwtService};
