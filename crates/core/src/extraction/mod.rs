//! Receipt data extraction with an OpenAI-compatible vision model.
//!
//! Extraction is best effort: callers turn any [`ExtractionError`] into a
//! draft flagged `ai_failed` instead of refusing the upload.

mod client;
mod error;
mod parser;
mod types;

pub use client::{EXTRACTION_PROMPT, VisionClient};
pub use error::ExtractionError;
pub use parser::{parse_amount, parse_date, parse_extraction};
pub use types::{ExtractedInvoice, TaxLine};
