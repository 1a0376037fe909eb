use std::fmt;

use serde::{Deserialize, Serialize};

use crate::money::round2;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum UnitBasis {
    Liter,
    Kilogram,
    /// Neither net content nor weight is known
    Unavailable,
}

impl UnitBasis {
    pub fn symbol(&self) -> Option<&'static str> {
        match self {
            UnitBasis::Liter => Some("L"),
            UnitBasis::Kilogram => Some("kg"),
            UnitBasis::Unavailable => None,
        }
    }
}

/// Statutory unit price (Grundpreis)
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct UnitPrice {
    pub value: f64,
    pub basis: UnitBasis,
}

impl UnitPrice {
    /// Zero price reported when there is nothing to divide by
    pub fn unavailable() -> Self {
        Self {
            value: 0.0,
            basis: UnitBasis::Unavailable,
        }
    }

    pub fn is_available(&self) -> bool {
        self.basis != UnitBasis::Unavailable
    }
}

impl fmt::Display for UnitPrice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.basis.symbol() {
            Some(symbol) => write!(f, "€{:.2}/{}", round2(self.value), symbol),
            None => write!(f, "€{:.2}", round2(self.value)),
        }
    }
}

/// Price per liter when the net content is known, else per kilogram, else
/// zero with a warning.
///
/// Always computed from the VAT-inclusive price; the disclosure is legally
/// required to show what the consumer pays.
pub fn unit_price(
    sku: &str,
    gross_price: f64,
    net_content_ml: Option<f64>,
    weight_g: Option<f64>,
    warnings: &mut Vec<String>,
) -> UnitPrice {
    if let Some(ml) = net_content_ml.filter(|ml| *ml > 0.0) {
        return UnitPrice {
            value: gross_price / (ml / 1000.0),
            basis: UnitBasis::Liter,
        };
    }

    if let Some(g) = weight_g.filter(|g| *g > 0.0) {
        return UnitPrice {
            value: gross_price / (g / 1000.0),
            basis: UnitBasis::Kilogram,
        };
    }

    warnings.push(format!("{}: no net content or weight, Grundpreis set to 0", sku));
    UnitPrice::unavailable()
}
