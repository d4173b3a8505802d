//! Tax line classification.

use serde::{Deserialize, Serialize};

/// VAT group column literal expected by Business Central.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum VatGroup {
    /// General rate.
    #[serde(rename = "IVA 21%")]
    Iva21,
    /// Reduced rate.
    #[serde(rename = "IVA 10,5%")]
    Iva105,
    /// Not taxed.
    #[serde(rename = "IVA NO GRAV")]
    NoGravado,
}

impl VatGroup {
    /// Literal written to the export.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Iva21 => "IVA 21%",
            Self::Iva105 => "IVA 10,5%",
            Self::NoGravado => "IVA NO GRAV",
        }
    }
}

impl std::fmt::Display for VatGroup {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What a tax line is, judged by its printed name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaxKind {
    /// IVA at 21%.
    Vat21,
    /// IVA at 10.5%.
    Vat105,
    /// IVA at 27%.
    Vat27,
    /// Perceptions, gross-income and any other tax.
    Other,
}

impl TaxKind {
    /// Classifies a tax line name. Matching ignores case, whitespace and
    /// the decimal separator ("IVA 10,5 %" == "iva10.5%").
    #[must_use]
    pub fn classify(name: &str) -> Self {
        let normalized = normalize(name);
        if !normalized.contains("iva") {
            return Self::Other;
        }
        if normalized.contains("10.5") {
            Self::Vat105
        } else if normalized.contains("27") {
            Self::Vat27
        } else if normalized.contains("21") {
            Self::Vat21
        } else {
            Self::Other
        }
    }

    /// Returns true for the VAT rates already discounted from the net.
    #[must_use]
    pub const fn is_vat(&self) -> bool {
        !matches!(self, Self::Other)
    }
}

/// True if the name mentions the reduced rate, with or without "IVA".
#[must_use]
pub(crate) fn mentions_reduced_rate(name: &str) -> bool {
    normalize(name).contains("10.5")
}

fn normalize(name: &str) -> String {
    name.chars()
        .filter(|c| !c.is_whitespace())
        .map(|c| if c == ',' { '.' } else { c })
        .collect::<String>()
        .to_lowercase()
}
