//! Tolerant parsing of model output.
//!
//! Models wrap JSON in code fences, print amounts with Argentine separators
//! ("1.234,56") and mix date formats; all of that is normalized here.

use std::str::FromStr;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde_json::Value;

use super::error::ExtractionError;
use super::types::{ExtractedInvoice, TaxLine};

const DATE_FORMATS: [&str; 4] = ["%Y-%m-%d", "%d/%m/%Y", "%d-%m-%Y", "%d/%m/%y"];

/// Parses the model's message content into an [`ExtractedInvoice`].
///
/// # Errors
///
/// Returns `InvalidPayload` if the content is not a JSON object.
pub fn parse_extraction(content: &str) -> Result<ExtractedInvoice, ExtractionError> {
    let body = strip_code_fence(content);
    let value: Value =
        serde_json::from_str(body).map_err(|e| ExtractionError::InvalidPayload(e.to_string()))?;
    let Value::Object(map) = value else {
        return Err(ExtractionError::InvalidPayload(
            "expected a JSON object".to_string(),
        ));
    };

    let text = |key: &str| map.get(key).and_then(value_as_text);
    let amount = |key: &str| map.get(key).and_then(value_as_amount);

    let taxes = map
        .get("taxes")
        .and_then(Value::as_array)
        .map(|lines| lines.iter().filter_map(tax_line).collect())
        .unwrap_or_default();

    Ok(ExtractedInvoice {
        vendor: text("vendor"),
        cuit: text("cuit"),
        invoice_number: text("invoice_number"),
        letter_type: text("letter_type"),
        date: text("date").as_deref().and_then(parse_date),
        total: amount("total"),
        currency: text("currency"),
        exchange_rate: amount("exchange_rate"),
        taxes,
    })
}

/// Parses an amount printed with either decimal convention.
///
/// The right-most of `,` and `.` is the decimal separator; a lone `.`
/// followed by exactly three digits is a thousands separator.
#[must_use]
pub fn parse_amount(raw: &str) -> Option<Decimal> {
    let cleaned: String = raw
        .chars()
        .filter(|c| c.is_ascii_digit() || matches!(c, ',' | '.' | '-'))
        .collect();
    if cleaned.is_empty() {
        return None;
    }

    let last_comma = cleaned.rfind(',');
    let last_dot = cleaned.rfind('.');
    let normalized = match (last_comma, last_dot) {
        (Some(c), Some(d)) if c > d => cleaned.replace('.', "").replace(',', "."),
        (Some(_), Some(_)) => cleaned.replace(',', ""),
        (Some(_), None) => {
            if cleaned.matches(',').count() > 1 {
                cleaned.replace(',', "")
            } else {
                cleaned.replace(',', ".")
            }
        }
        (None, Some(d)) => {
            let decimals = cleaned.len() - d - 1;
            if cleaned.matches('.').count() > 1 || decimals == 3 {
                cleaned.replace('.', "")
            } else {
                cleaned
            }
        }
        (None, None) => cleaned,
    };

    Decimal::from_str(&normalized).ok()
}

/// Parses the date formats models commonly return.
#[must_use]
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(raw, fmt).ok())
}

fn strip_code_fence(content: &str) -> &str {
    let trimmed = content.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let rest = rest.strip_prefix("json").unwrap_or(rest);
    rest.strip_suffix("```").unwrap_or(rest).trim()
}

fn value_as_text(value: &Value) -> Option<String> {
    let text = match value {
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => n.to_string(),
        _ => return None,
    };
    (!text.is_empty()).then_some(text)
}

fn value_as_amount(value: &Value) -> Option<Decimal> {
    match value {
        Value::Number(n) => {
            let repr = n.to_string();
            Decimal::from_str(&repr)
                .or_else(|_| Decimal::from_scientific(&repr))
                .ok()
        }
        Value::String(s) => parse_amount(s),
        _ => None,
    }
}

fn tax_line(value: &Value) -> Option<TaxLine> {
    let name = value.get("name").and_then(value_as_text)?;
    let amount = value.get("amount").and_then(value_as_amount)?;
    Some(TaxLine { name, amount })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use rust_decimal_macros::dec;

    #[rstest]
    #[case("1.234,56", dec!(1234.56))]
    #[case("1,234.56", dec!(1234.56))]
    #[case("$ 1210", dec!(1210))]
    #[case("1210,5", dec!(1210.5))]
    #[case("10.50", dec!(10.50))]
    #[case("1.500", dec!(1500))]
    #[case("1.234.567", dec!(1234567))]
    #[case("-50,00", dec!(-50.00))]
    fn test_parse_amount(#[case] raw: &str, #[case] expected: Decimal) {
        assert_eq!(parse_amount(raw), Some(expected));
    }

    #[test]
    fn test_parse_amount_garbage() {
        assert_eq!(parse_amount("n/a"), None);
        assert_eq!(parse_amount(""), None);
    }

    #[rstest]
    #[case("2024-06-10")]
    #[case("10/06/2024")]
    #[case("10-06-2024")]
    #[case("10/06/24")]
    fn test_parse_date(#[case] raw: &str) {
        assert_eq!(parse_date(raw), NaiveDate::from_ymd_opt(2024, 6, 10));
    }

    #[test]
    fn test_parse_extraction_fenced() {
        let content = r#"```json
        {
            "vendor": "YPF Estación 123",
            "cuit": "30-54668997-9",
            "invoice_number": "0001-00012345",
            "letter_type": "A",
            "date": "2024-06-10",
            "total": 1210,
            "currency": "ARS",
            "exchange_rate": null,
            "taxes": [
                {"name": "IVA 21%", "amount": "210,00"},
                {"name": "", "amount": 5},
                {"name": "Percepción IIBB", "amount": 12.5}
            ]
        }
        ```"#;

        let invoice = parse_extraction(content).expect("valid payload");
        assert_eq!(invoice.vendor.as_deref(), Some("YPF Estación 123"));
        assert_eq!(invoice.letter_type.as_deref(), Some("A"));
        assert_eq!(invoice.total, Some(dec!(1210)));
        assert_eq!(invoice.exchange_rate, None);
        assert_eq!(invoice.date, NaiveDate::from_ymd_opt(2024, 6, 10));
        assert_eq!(
            invoice.taxes,
            vec![
                TaxLine::new("IVA 21%", dec!(210.00)),
                TaxLine::new("Percepción IIBB", dec!(12.5)),
            ]
        );
    }

    #[test]
    fn test_parse_extraction_rejects_non_object() {
        assert!(matches!(
            parse_extraction("[1, 2]"),
            Err(ExtractionError::InvalidPayload(_))
        ));
        assert!(matches!(
            parse_extraction("sorry, I cannot read this"),
            Err(ExtractionError::InvalidPayload(_))
        ));
    }
}
