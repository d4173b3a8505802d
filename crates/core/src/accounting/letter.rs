//! Invoice letter normalization.

use serde::{Deserialize, Serialize};

/// The three letter buckets the generator distinguishes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum InvoiceLetter {
    /// VAT-discriminated invoice (A and M letters).
    #[serde(rename = "FACTURA A")]
    FacturaA,
    /// Invoice from a simplified-regime vendor.
    #[serde(rename = "FACTURA C")]
    FacturaC,
    /// B invoices, tickets and anything unrecognized.
    #[serde(rename = "CONSUMIDOR FINAL")]
    ConsumidorFinal,
}

const NOISE: [&str; 9] = [
    "FACTURA",
    "FACT",
    "FC",
    "TIPO",
    "LETRA",
    "COMPROBANTE",
    "COD",
    "ELECTRONICA",
    "ELECTRÓNICA",
];

impl InvoiceLetter {
    /// Display label.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::FacturaA => "FACTURA A",
            Self::FacturaC => "FACTURA C",
            Self::ConsumidorFinal => "CONSUMIDOR FINAL",
        }
    }

    /// Only A invoices discriminate VAT.
    #[must_use]
    pub const fn is_vat_bearing(&self) -> bool {
        matches!(self, Self::FacturaA)
    }

    /// Normalizes whatever was printed or typed ("A", "Factura M",
    /// "FACTURA C", "Ticket", AFIP codes "001"/"011"...).
    #[must_use]
    pub fn normalize(raw: Option<&str>) -> Self {
        let Some(raw) = raw else {
            return Self::ConsumidorFinal;
        };
        let upper = raw.to_uppercase();
        let tokens: Vec<&str> = upper
            .split(|c: char| !c.is_alphanumeric())
            .filter(|t| !t.is_empty() && !NOISE.contains(t))
            .collect();

        if tokens.iter().any(|t| *t == "TICKET") {
            return Self::ConsumidorFinal;
        }

        match tokens.as_slice() {
            [single] => match single.trim_start_matches('0') {
                "A" | "M" | "1" | "51" => Self::FacturaA,
                "C" | "11" => Self::FacturaC,
                _ => Self::ConsumidorFinal,
            },
            _ => Self::ConsumidorFinal,
        }
    }
}

impl std::fmt::Display for InvoiceLetter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
