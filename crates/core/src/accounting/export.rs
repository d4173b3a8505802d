//! Tab-separated export.

use expensedesk_shared::types::money::round_cents;
use rust_decimal::Decimal;

use super::generator::AccountingRow;

/// Column order of the export.
pub const TSV_COLUMNS: [&str; 14] = [
    "account_type",
    "account_number",
    "description",
    "vat_group",
    "quantity",
    "unit_cost",
    "tax_area_code",
    "discount_percent",
    "line_amount",
    "branch_code",
    "area_code",
    "operation",
    "province",
    "unit",
];

/// Formats an amount with two decimals and the given separator.
#[must_use]
pub fn format_amount(amount: Decimal, decimal_separator: char) -> String {
    let text = format!("{:.2}", round_cents(amount));
    if decimal_separator == '.' {
        text
    } else {
        text.replace('.', &decimal_separator.to_string())
    }
}

/// Serializes rows as TSV, one line per row, no header.
#[must_use]
pub fn to_tsv(rows: &[AccountingRow], decimal_separator: char) -> String {
    let mut out = String::new();
    for row in rows {
        let fields = [
            clean(&row.account_type),
            clean(&row.account_number),
            clean(&row.description),
            row.vat_group.as_str().to_string(),
            row.quantity.normalize().to_string(),
            format_amount(row.unit_cost, decimal_separator),
            clean(&row.tax_area_code),
            row.discount_percent.normalize().to_string(),
            format_amount(row.line_amount, decimal_separator),
            clean(&row.branch_code),
            clean(&row.area_code),
            clean(&row.operation),
            clean(&row.province),
            clean(&row.unit),
        ];
        out.push_str(&fields.join("\t"));
        out.push('\n');
    }
    out
}

/// Tabs and line breaks would shift the grid.
fn clean(value: &str) -> String {
    value
        .chars()
        .map(|c| if matches!(c, '\t' | '\n' | '\r') { ' ' } else { c })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::accounting::{AccountingGenerator, AccountingInvoice};
    use crate::extraction::TaxLine;
    use expensedesk_shared::AccountingConfig;
    use rust_decimal_macros::dec;

    fn rows() -> Vec<AccountingRow> {
        let invoice = AccountingInvoice {
            vendor: Some("Estación\tYPF".to_string()),
            letter_type: Some("A".to_string()),
            total: dec!(1000),
            taxes: vec![
                TaxLine::new("IVA 21%", dec!(150)),
                TaxLine::new("Percepción IIBB", dec!(50)),
            ],
            branch: None,
            area: None,
        };
        AccountingGenerator::generate_rows(&invoice, &AccountingConfig::default())
    }

    #[test]
    fn test_format_amount() {
        assert_eq!(format_amount(dec!(1000), ','), "1000,00");
        assert_eq!(format_amount(dec!(10.5), '.'), "10.50");
        assert_eq!(format_amount(dec!(0.005), ','), "0,01");
    }

    #[test]
    fn test_tsv_layout() {
        let tsv = to_tsv(&rows(), ',');
        let lines: Vec<&str> = tsv.lines().collect();
        assert_eq!(lines.len(), 2);

        let first: Vec<&str> = lines[0].split('\t').collect();
        assert_eq!(first.len(), TSV_COLUMNS.len());
        assert_eq!(
            first,
            vec![
                "Cuenta",
                "5.1.01.001",
                "Estación YPF",
                "IVA 21%",
                "1",
                "800,00",
                "LOCAL",
                "0",
                "800,00",
                "GRAL",
                "GRAL",
                "COMPRA",
                "CABA",
                "UN",
            ]
        );

        let second: Vec<&str> = lines[1].split('\t').collect();
        assert_eq!(second[2], "Percepciones / Impuestos");
        assert_eq!(second[3], "IVA NO GRAV");
        assert_eq!(second[8], "50,00");
    }

    #[test]
    fn test_empty_export() {
        assert_eq!(to_tsv(&[], ','), "");
    }
}
