use serde::{Deserialize, Serialize};

use crate::error::PricingError;
use crate::line::{LineParameters, LineTable, ProductLine};

/// Run-wide pricing parameters, loaded once per run and never mutated.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PricingParameters {
    /// VAT in percent (19.0 for Germany)
    pub vat_pct: f64,

    /// Buffer applied to every factory price against currency moves
    pub fx_buffer_pct: f64,

    pub lines: LineTable<LineParameters>,
}

impl Default for PricingParameters {
    fn default() -> Self {
        Self {
            vat_pct: 19.0,
            fx_buffer_pct: 0.0,
            lines: LineTable::default(),
        }
    }
}

impl PricingParameters {
    pub fn line(&self, line: ProductLine) -> &LineParameters {
        self.lines.get(line)
    }

    /// VAT factor, e.g. 1.19
    pub fn vat_factor(&self) -> f64 {
        1.0 + self.vat_pct / 100.0
    }

    /// Reject parameter sets no row could be priced against.
    ///
    /// Target margins are checked per row by the UVP solver, since a line
    /// with a broken margin should fail only the rows on that line.
    pub fn validate(&self) -> Result<(), PricingError> {
        if !self.vat_pct.is_finite() || self.vat_pct < 0.0 {
            return Err(PricingError::Configuration(format!("invalid VAT rate {}", self.vat_pct)));
        }
        if !self.fx_buffer_pct.is_finite() || self.fx_buffer_pct < 0.0 {
            return Err(PricingError::Configuration(format!(
                "invalid FX buffer {}",
                self.fx_buffer_pct
            )));
        }
        let all = [
            ProductLine::Premium,
            ProductLine::Basic,
            ProductLine::Tools,
            ProductLine::Other,
        ];
        for line in all {
            let multiplier = self.line(line).floor_multiplier;
            if !multiplier.is_finite() || multiplier <= 0.0 {
                return Err(PricingError::Configuration(format!(
                    "invalid floor multiplier {} for line {}",
                    multiplier,
                    line.as_str()
                )));
            }
        }
        Ok(())
    }
}
