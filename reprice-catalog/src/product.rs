use serde::{Deserialize, Serialize};

use crate::error::PricingError;
use crate::line::ProductLine;

/// The eight per-unit overhead components rolled into full cost.
/// A component missing from the catalog is zero.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct CostComponents {
    pub inbound_freight: f64,
    pub customs_duty: f64,
    pub packaging: f64,
    pub labeling: f64,
    pub warehousing: f64,
    pub pick_pack: f64,
    pub insurance: f64,
    pub quality_control: f64,
}

impl CostComponents {
    pub fn named(&self) -> [(&'static str, f64); 8] {
        [
            ("inbound_freight", self.inbound_freight),
            ("customs_duty", self.customs_duty),
            ("packaging", self.packaging),
            ("labeling", self.labeling),
            ("warehousing", self.warehousing),
            ("pick_pack", self.pick_pack),
            ("insurance", self.insurance),
            ("quality_control", self.quality_control),
        ]
    }

    pub fn total(&self) -> f64 {
        self.named().iter().map(|(_, value)| value).sum()
    }
}

/// Free gift shipped with a share of orders
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GiftAttach {
    /// Gift cost only counts when a gift SKU is configured
    pub gift_sku: String,
    pub gift_cost: f64,
    /// Share of the gift cost funded by the supplier, 0..=1
    pub funding_share: f64,
    /// Extra shipping cost per parcel carrying the gift
    pub shipping_increment: f64,
    /// Share of orders that carry the gift, 0..=1
    pub attach_rate: f64,
}

impl GiftAttach {
    pub fn is_configured(&self) -> bool {
        !self.gift_sku.trim().is_empty()
    }

    /// `(cost × (1 − funding) + shipping) × attach rate`
    pub fn expected_cost(&self) -> f64 {
        if !self.is_configured() {
            return 0.0;
        }
        (self.gift_cost * (1.0 - self.funding_share) + self.shipping_increment) * self.attach_rate
    }
}

/// Everything the engine reads about one SKU
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProductCostInputs {
    pub sku: String,
    pub line: ProductLine,

    /// Factory price candidates in priority order
    pub manual_unit_price: Option<f64>,
    pub carton_total: Option<f64>,
    pub units_per_carton: Option<f64>,
    pub legacy_unit_cost: Option<f64>,

    #[serde(default)]
    pub components: CostComponents,
    pub gift: Option<GiftAttach>,

    pub net_content_ml: Option<f64>,
    pub weight_g: Option<f64>,

    /// Marketplace fulfillment size tier
    pub size_tier: Option<String>,
    /// Replaces the tiered marketplace referral percentage
    pub referral_pct_override: Option<f64>,
    /// Manually set gross UVP; skips the margin solve
    pub uvp_override_gross: Option<f64>,
}

impl ProductCostInputs {
    pub fn new(sku: impl Into<String>, line: ProductLine) -> Self {
        Self {
            sku: sku.into(),
            line,
            manual_unit_price: None,
            carton_total: None,
            units_per_carton: None,
            legacy_unit_cost: None,
            components: CostComponents::default(),
            gift: None,
            net_content_ml: None,
            weight_g: None,
            size_tier: None,
            referral_pct_override: None,
            uvp_override_gross: None,
        }
    }

    /// Reject numbers no cost roll-up can be built from.
    pub fn validate(&self) -> Result<(), PricingError> {
        let optional = [
            ("manual_unit_price", self.manual_unit_price),
            ("carton_total", self.carton_total),
            ("units_per_carton", self.units_per_carton),
            ("legacy_unit_cost", self.legacy_unit_cost),
            ("net_content_ml", self.net_content_ml),
            ("weight_g", self.weight_g),
            ("referral_pct_override", self.referral_pct_override),
            ("uvp_override_gross", self.uvp_override_gross),
        ];
        for (field, value) in optional {
            if let Some(value) = value {
                non_negative(field, value)?;
            }
        }
        for (field, value) in self.components.named() {
            non_negative(field, value)?;
        }
        if let Some(gift) = &self.gift {
            non_negative("gift_cost", gift.gift_cost)?;
            non_negative("shipping_increment", gift.shipping_increment)?;
            share("funding_share", gift.funding_share)?;
            share("attach_rate", gift.attach_rate)?;
        }
        Ok(())
    }
}

fn non_negative(field: &'static str, value: f64) -> Result<(), PricingError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(PricingError::MalformedInput { field, value })
    }
}

fn share(field: &'static str, value: f64) -> Result<(), PricingError> {
    if value.is_finite() && (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(PricingError::MalformedInput { field, value })
    }
}
