//! Extracted invoice payload.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// One itemized tax line ("IVA 21%", "Percepción IIBB"...).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaxLine {
    /// Name as printed on the receipt.
    pub name: String,
    /// Amount.
    pub amount: Decimal,
}

impl TaxLine {
    /// Creates a tax line.
    #[must_use]
    pub fn new(name: impl Into<String>, amount: Decimal) -> Self {
        Self {
            name: name.into(),
            amount,
        }
    }
}

/// Structured data read from a receipt image.
///
/// Stored as-is on the invoice and corrected by the owner before validation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractedInvoice {
    /// Vendor name.
    pub vendor: Option<String>,
    /// Vendor tax ID.
    pub cuit: Option<String>,
    /// Invoice number.
    pub invoice_number: Option<String>,
    /// Letter type as printed (A, B, C, M, ticket...).
    pub letter_type: Option<String>,
    /// Invoice date.
    pub date: Option<NaiveDate>,
    /// Total amount.
    pub total: Option<Decimal>,
    /// Currency as printed.
    pub currency: Option<String>,
    /// Exchange rate for foreign-currency receipts.
    pub exchange_rate: Option<Decimal>,
    /// Itemized taxes.
    pub taxes: Vec<TaxLine>,
}
