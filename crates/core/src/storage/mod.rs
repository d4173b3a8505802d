//! Receipt storage on Apache OpenDAL.
//!
//! Receipts are written once at upload, read through presigned URLs and
//! removed when the owning invoice is deleted. The backend is any of:
//! - S3-compatible: Supabase Storage, Cloudflare R2, AWS S3
//! - Azure Blob Storage
//! - Local filesystem (development only)

mod error;
mod service;

pub use error::StorageError;
pub use service::{ALLOWED_CONTENT_TYPES, PresignedUrl, ReceiptStorage};
