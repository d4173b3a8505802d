//! Row generation.

use expensedesk_shared::AccountingConfig;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::letter::InvoiceLetter;
use super::tax::{TaxKind, VatGroup, mentions_reduced_rate};
use crate::expense::Expense;
use crate::extraction::TaxLine;

/// Description of the second row of an A invoice.
pub const OTHER_TAXES_DESCRIPTION: &str = "Percepciones / Impuestos";

const FALLBACK_VENDOR: &str = "Proveedor sin identificar";

/// What the generator reads from an invoice.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountingInvoice {
    /// Vendor name.
    pub vendor: Option<String>,
    /// Letter as stored.
    pub letter_type: Option<String>,
    /// Invoice total.
    pub total: Decimal,
    /// Itemized taxes.
    pub taxes: Vec<TaxLine>,
    /// Branch name.
    pub branch: Option<String>,
    /// Owner's area.
    pub area: Option<String>,
}

impl AccountingInvoice {
    /// Builds the input from an expense and its owner's area.
    #[must_use]
    pub fn from_expense(expense: &Expense, area: Option<&str>) -> Self {
        Self {
            vendor: expense.details.vendor.clone(),
            letter_type: expense.details.letter_type.clone(),
            total: expense.total_amount,
            taxes: expense.details.taxes.clone(),
            branch: expense.branch.clone(),
            area: area.map(str::to_string),
        }
    }
}

/// One purchase line in the ledger's 14-column shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountingRow {
    /// Account type.
    pub account_type: String,
    /// Account number.
    pub account_number: String,
    /// Line description.
    pub description: String,
    /// VAT group.
    pub vat_group: VatGroup,
    /// Quantity.
    pub quantity: Decimal,
    /// Unit cost.
    pub unit_cost: Decimal,
    /// Tax area code.
    pub tax_area_code: String,
    /// Discount percentage.
    pub discount_percent: Decimal,
    /// Line amount.
    pub line_amount: Decimal,
    /// Branch dimension code.
    pub branch_code: String,
    /// Area dimension code.
    pub area_code: String,
    /// Operation.
    pub operation: String,
    /// Province.
    pub province: String,
    /// Unit of measure.
    pub unit: String,
}

/// Stateless row generator.
pub struct AccountingGenerator;

impl AccountingGenerator {
    /// Generates the rows for one invoice. Never fails.
    ///
    /// - `FACTURA A`: a net row tagged with the VAT rate, plus an
    ///   `IVA NO GRAV` row for non-VAT taxes above one cent.
    /// - `FACTURA C` and `CONSUMIDOR FINAL`: the full total, not taxed.
    #[must_use]
    pub fn generate_rows(
        invoice: &AccountingInvoice,
        config: &AccountingConfig,
    ) -> Vec<AccountingRow> {
        let vendor = invoice
            .vendor
            .as_deref()
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .unwrap_or(FALLBACK_VENDOR);

        let letter = InvoiceLetter::normalize(invoice.letter_type.as_deref());
        if !letter.is_vat_bearing() {
            return vec![Self::row(
                config,
                invoice,
                vendor,
                VatGroup::NoGravado,
                invoice.total,
            )];
        }

        let all_taxes = saturating_sum(invoice.taxes.iter().map(|t| t.amount));
        let net = invoice
            .total
            .checked_sub(all_taxes)
            .unwrap_or(Decimal::MIN)
            .max(Decimal::ZERO);

        let vat_group = if invoice.taxes.iter().any(|t| mentions_reduced_rate(&t.name)) {
            VatGroup::Iva105
        } else {
            VatGroup::Iva21
        };

        let other_taxes = saturating_sum(
            invoice
                .taxes
                .iter()
                .filter(|t| !TaxKind::classify(&t.name).is_vat())
                .map(|t| t.amount),
        );

        let mut rows = vec![Self::row(config, invoice, vendor, vat_group, net)];
        if other_taxes > Decimal::new(1, 2) {
            rows.push(Self::row(
                config,
                invoice,
                OTHER_TAXES_DESCRIPTION,
                VatGroup::NoGravado,
                other_taxes,
            ));
        }
        rows
    }

    fn row(
        config: &AccountingConfig,
        invoice: &AccountingInvoice,
        description: &str,
        vat_group: VatGroup,
        amount: Decimal,
    ) -> AccountingRow {
        AccountingRow {
            account_type: config.account_type.clone(),
            account_number: config.account_number.clone(),
            description: description.to_string(),
            vat_group,
            quantity: Decimal::ONE,
            unit_cost: amount,
            tax_area_code: config.tax_area_code.clone(),
            discount_percent: Decimal::ZERO,
            line_amount: amount,
            branch_code: config.branch_code(invoice.branch.as_deref()).to_string(),
            area_code: config.area_code(invoice.area.as_deref()).to_string(),
            operation: config.operation.clone(),
            province: config.province.clone(),
            unit: config.unit.clone(),
        }
    }
}

/// Sums amounts, clamping at the `Decimal` bounds instead of overflowing.
fn saturating_sum(amounts: impl Iterator<Item = Decimal>) -> Decimal {
    amounts.fold(Decimal::ZERO, |acc, amount| {
        acc.checked_add(amount).unwrap_or(if amount.is_sign_negative() {
            Decimal::MIN
        } else {
            Decimal::MAX
        })
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn invoice(letter: &str, total: Decimal, taxes: Vec<TaxLine>) -> AccountingInvoice {
        AccountingInvoice {
            vendor: Some("Hotel Patagonia SA".to_string()),
            letter_type: Some(letter.to_string()),
            total,
            taxes,
            branch: Some("Rosario".to_string()),
            area: Some("Ventas".to_string()),
        }
    }

    fn config() -> AccountingConfig {
        let mut config = AccountingConfig::default();
        config
            .branch_codes
            .insert("rosario".to_string(), "ROS".to_string());
        config
            .area_codes
            .insert("ventas".to_string(), "VTA".to_string());
        config
    }

    #[test]
    fn test_factura_a_plain_vat() {
        let rows = AccountingGenerator::generate_rows(
            &invoice("A", dec!(1210), vec![TaxLine::new("IVA 21%", dec!(210))]),
            &config(),
        );

        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].description, "Hotel Patagonia SA");
        assert_eq!(rows[0].vat_group, VatGroup::Iva21);
        assert_eq!(rows[0].quantity, Decimal::ONE);
        assert_eq!(rows[0].unit_cost, dec!(1000));
        assert_eq!(rows[0].line_amount, dec!(1000));
        assert_eq!(rows[0].branch_code, "ROS");
        assert_eq!(rows[0].area_code, "VTA");
    }

    #[test]
    fn test_factura_a_with_perceptions() {
        let rows = AccountingGenerator::generate_rows(
            &invoice(
                "A",
                dec!(1000),
                vec![
                    TaxLine::new("IVA 21%", dec!(150)),
                    TaxLine::new("Percepción IIBB", dec!(50)),
                ],
            ),
            &config(),
        );

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].line_amount, dec!(800));
        assert_eq!(rows[0].vat_group, VatGroup::Iva21);
        assert_eq!(rows[1].description, OTHER_TAXES_DESCRIPTION);
        assert_eq!(rows[1].vat_group, VatGroup::NoGravado);
        assert_eq!(rows[1].line_amount, dec!(50));
    }

    #[test]
    fn test_factura_a_reduced_rate() {
        let rows = AccountingGenerator::generate_rows(
            &invoice("M", dec!(1105), vec![TaxLine::new("IVA 10,5%", dec!(105))]),
            &config(),
        );
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].vat_group, VatGroup::Iva105);
        assert_eq!(rows[0].line_amount, dec!(1000));
    }

    #[test]
    fn test_other_taxes_at_one_cent_are_dropped() {
        let rows = AccountingGenerator::generate_rows(
            &invoice(
                "A",
                dec!(121.01),
                vec![
                    TaxLine::new("IVA 21%", dec!(21)),
                    TaxLine::new("Redondeo", dec!(0.01)),
                ],
            ),
            &config(),
        );
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].line_amount, dec!(100));
    }

    #[test]
    fn test_net_never_negative() {
        let rows = AccountingGenerator::generate_rows(
            &invoice("A", dec!(100), vec![TaxLine::new("IVA 21%", dec!(150))]),
            &config(),
        );
        assert_eq!(rows[0].line_amount, Decimal::ZERO);
    }

    #[test]
    fn test_consumidor_final_single_row() {
        let rows = AccountingGenerator::generate_rows(
            &invoice(
                "B",
                dec!(500),
                vec![
                    TaxLine::new("IVA 21%", dec!(86.78)),
                    TaxLine::new("Percepción IIBB", dec!(20)),
                ],
            ),
            &config(),
        );
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].line_amount, dec!(500));
        assert_eq!(rows[0].vat_group, VatGroup::NoGravado);
    }

    #[test]
    fn test_factura_c_single_row() {
        let rows = AccountingGenerator::generate_rows(
            &invoice("C", dec!(320), vec![]),
            &config(),
        );
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].line_amount, dec!(320));
        assert_eq!(rows[0].vat_group, VatGroup::NoGravado);
    }

    #[test]
    fn test_unmapped_codes_fall_back() {
        let mut inv = invoice("C", dec!(10), vec![]);
        inv.branch = Some("Ushuaia".to_string());
        inv.area = None;
        inv.vendor = None;
        let rows = AccountingGenerator::generate_rows(&inv, &config());
        assert_eq!(rows[0].branch_code, "GRAL");
        assert_eq!(rows[0].area_code, "GRAL");
        assert_eq!(rows[0].description, FALLBACK_VENDOR);
    }

    #[test]
    fn test_overflowing_taxes_saturate() {
        let rows = AccountingGenerator::generate_rows(
            &invoice(
                "FACTURA A",
                dec!(100),
                vec![
                    TaxLine::new("IVA 21%", Decimal::MAX),
                    TaxLine::new("Percepción IIBB", Decimal::MAX),
                ],
            ),
            &config(),
        );
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].line_amount, Decimal::ZERO);
        assert_eq!(rows[1].line_amount, Decimal::MAX);
    }

    #[test]
    fn test_saturating_sum_clamps_both_ways() {
        assert_eq!(
            saturating_sum([Decimal::MAX, Decimal::ONE].into_iter()),
            Decimal::MAX
        );
        assert_eq!(
            saturating_sum([Decimal::MIN, Decimal::NEGATIVE_ONE].into_iter()),
            Decimal::MIN
        );
        assert_eq!(saturating_sum([dec!(1.5), dec!(2)].into_iter()), dec!(3.5));
    }
}
