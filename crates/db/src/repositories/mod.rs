//! Repository abstractions for data access.
//!
//! Repositories provide a clean interface for database operations,
//! hiding the `SeaORM` implementation details from the rest of the application.
//! The core store and directory traits are implemented here.

pub mod branch;
pub mod invoice;
pub mod profile;
pub mod report;

pub use branch::{BranchError, BranchRepository};
pub use invoice::InvoiceRepository;
pub use profile::ProfileRepository;
pub use report::{BranchSpendLine, ReportRepository};
