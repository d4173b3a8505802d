//! Business Central accounting rows.
//!
//! A validated invoice becomes one or two fixed-shape purchase lines,
//! exported as tab-separated values for pasting into the ledger's entry
//! grid. Column order and the VAT group literals are fixed by the ledger.

mod export;
mod generator;
mod letter;
mod tax;

#[cfg(test)]
mod props;

pub use export::{TSV_COLUMNS, format_amount, to_tsv};
pub use generator::{AccountingGenerator, AccountingInvoice, AccountingRow, OTHER_TAXES_DESCRIPTION};
pub use letter::InvoiceLetter;
pub use tax::{TaxKind, VatGroup};
