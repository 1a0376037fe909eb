use serde::{Deserialize, Serialize};

use crate::error::PricingError;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum UvpSource {
    MarginSolve,
    ManualOverride,
}

/// Recommended retail price, net and VAT-inclusive
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Uvp {
    pub net: f64,
    pub gross: f64,
    pub source: UvpSource,
}

/// `net = full cost / (1 − margin/100)`, `gross = net × (1 + VAT/100)`.
pub fn solve_uvp(
    full_cost: f64,
    target_margin_pct: f64,
    vat_pct: f64,
) -> Result<Uvp, PricingError> {
    if !target_margin_pct.is_finite() || target_margin_pct >= 100.0 {
        return Err(PricingError::Configuration(format!(
            "target margin {}% leaves no room for cost",
            target_margin_pct
        )));
    }

    let net = full_cost / (1.0 - target_margin_pct / 100.0);
    Ok(Uvp {
        net,
        gross: net * (1.0 + vat_pct / 100.0),
        source: UvpSource::MarginSolve,
    })
}

/// Take a manually set gross UVP and back out VAT.
pub fn from_gross_override(gross: f64, vat_pct: f64) -> Uvp {
    Uvp {
        net: gross / (1.0 + vat_pct / 100.0),
        gross,
        source: UvpSource::ManualOverride,
    }
}
