use serde::{Deserialize, Serialize};

use crate::error::PricingError;
use crate::product::ProductCostInputs;

/// Which catalog field the factory price came from
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum FactoryPriceSource {
    Manual,
    Carton,
    Legacy,
    Missing,
}

/// Landed cost of one unit
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CostRollUp {
    /// Factory price including the FX buffer
    pub factory_price: f64,
    pub source: FactoryPriceSource,
    pub components: f64,
    pub gift_expected_cost: f64,
    pub full_cost: f64,
}

/// Build the per-unit landed cost.
///
/// A SKU without any factory price is costed at zero with a warning; the
/// engine never invents a price.
pub fn build_cost_rollup(
    inputs: &ProductCostInputs,
    fx_buffer_pct: f64,
    warnings: &mut Vec<String>,
) -> Result<CostRollUp, PricingError> {
    inputs.validate()?;

    let (raw_price, source) = resolve_factory_price(inputs);
    if source == FactoryPriceSource::Missing {
        warnings.push(format!("{}: no factory price, costed at 0.00", inputs.sku));
    }

    let factory_price = raw_price * (1.0 + fx_buffer_pct / 100.0);
    let components = inputs.components.total();
    let gift_expected_cost = inputs.gift.as_ref().map(|g| g.expected_cost()).unwrap_or(0.0);

    Ok(CostRollUp {
        factory_price,
        source,
        components,
        gift_expected_cost,
        full_cost: factory_price + components + gift_expected_cost,
    })
}

/// Manual unit price, then carton total ÷ units, then the legacy field.
/// Zero counts as absent.
fn resolve_factory_price(inputs: &ProductCostInputs) -> (f64, FactoryPriceSource) {
    if let Some(price) = inputs.manual_unit_price.filter(|p| *p > 0.0) {
        return (price, FactoryPriceSource::Manual);
    }

    if let (Some(total), Some(units)) = (inputs.carton_total, inputs.units_per_carton) {
        if total > 0.0 && units > 0.0 {
            return (total / units, FactoryPriceSource::Carton);
        }
    }

    if let Some(price) = inputs.legacy_unit_cost.filter(|p| *p > 0.0) {
        return (price, FactoryPriceSource::Legacy);
    }

    (0.0, FactoryPriceSource::Missing)
}
