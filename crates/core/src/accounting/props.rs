//! Property-based tests for row generation.

use expensedesk_shared::AccountingConfig;
use proptest::prelude::*;
use rust_decimal::Decimal;

use super::{AccountingGenerator, AccountingInvoice, VatGroup};
use crate::extraction::TaxLine;

fn arb_cents() -> impl Strategy<Value = Decimal> {
    (0i64..10_000_000).prop_map(|c| Decimal::new(c, 2))
}

fn arb_tax() -> impl Strategy<Value = TaxLine> {
    (
        prop_oneof![
            Just("IVA 21%"),
            Just("IVA 10,5%"),
            Just("IVA 27%"),
            Just("Percepción IIBB"),
            Just("Impuesto interno"),
        ],
        arb_cents(),
    )
        .prop_map(|(name, amount)| TaxLine::new(name, amount))
}

fn arb_any_decimal() -> impl Strategy<Value = Decimal> {
    (any::<u32>(), any::<u32>(), any::<u32>(), any::<bool>(), 0u32..=28)
        .prop_map(|(lo, mid, hi, negative, scale)| {
            Decimal::from_parts(lo, mid, hi, negative, scale)
        })
}

fn arb_letter() -> impl Strategy<Value = Option<String>> {
    prop_oneof![
        Just(None),
        "[ABCMX]".prop_map(Some),
        Just(Some("TICKET".to_string())),
    ]
}

proptest! {
    /// Same input, same rows; always one or two of them.
    #[test]
    fn prop_generation_is_deterministic_and_total(
        letter in arb_letter(),
        total in arb_cents(),
        taxes in prop::collection::vec(arb_tax(), 0..6),
    ) {
        let invoice = AccountingInvoice {
            vendor: Some("Vendor".to_string()),
            letter_type: letter,
            total,
            taxes,
            branch: None,
            area: None,
        };
        let config = AccountingConfig::default();

        let first = AccountingGenerator::generate_rows(&invoice, &config);
        let second = AccountingGenerator::generate_rows(&invoice, &config);
        prop_assert_eq!(&first, &second);
        prop_assert!(!first.is_empty() && first.len() <= 2);
        for row in &first {
            prop_assert!(row.line_amount >= Decimal::ZERO);
        }
    }

    /// Non-A letters always yield the full total, not taxed.
    #[test]
    fn prop_non_vat_letters_single_row(
        total in arb_cents(),
        taxes in prop::collection::vec(arb_tax(), 0..6),
        letter in prop_oneof![Just("B"), Just("C"), Just("TICKET")],
    ) {
        let invoice = AccountingInvoice {
            vendor: None,
            letter_type: Some(letter.to_string()),
            total,
            taxes,
            branch: None,
            area: None,
        };
        let rows = AccountingGenerator::generate_rows(&invoice, &AccountingConfig::default());
        prop_assert_eq!(rows.len(), 1);
        prop_assert_eq!(rows[0].line_amount, total);
        prop_assert_eq!(rows[0].vat_group, VatGroup::NoGravado);
    }

    /// Any stored amounts, however extreme, still produce rows.
    #[test]
    fn prop_extreme_amounts_never_panic(
        total in arb_any_decimal(),
        amounts in prop::collection::vec(arb_any_decimal(), 0..6),
    ) {
        let taxes = amounts
            .into_iter()
            .enumerate()
            .map(|(i, amount)| {
                let name = if i % 2 == 0 { "IVA 21%" } else { "Percepción IIBB" };
                TaxLine::new(name, amount)
            })
            .collect();
        let invoice = AccountingInvoice {
            vendor: None,
            letter_type: Some("A".to_string()),
            total,
            taxes,
            branch: None,
            area: None,
        };
        let rows = AccountingGenerator::generate_rows(&invoice, &AccountingConfig::default());
        prop_assert!(!rows.is_empty() && rows.len() <= 2);
        prop_assert!(rows[0].line_amount >= Decimal::ZERO);
    }
}
