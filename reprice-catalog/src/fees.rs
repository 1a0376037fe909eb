use std::cmp::Ordering;
use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// How a carrier surcharge is charged
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum SurchargeKind {
    #[serde(rename = "Fixed_Per_Shipment")]
    FixedPerShipment,
    #[serde(rename = "Pct_Of_Base")]
    PctOfBase,
    /// Billed monthly and reconciled separately; never part of a shipment price
    #[serde(rename = "Monthly_Variable")]
    MonthlyVariable,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Surcharge {
    pub name: String,
    pub kind: SurchargeKind,
    /// Currency amount for fixed surcharges, percent for percentage surcharges
    pub amount: f64,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct SurchargeBreakdown {
    pub base: f64,
    /// Everything on top of the base rate
    pub surcharges: f64,
    pub total: f64,
}

/// Apply surcharges to a carrier base rate.
///
/// All fixed surcharges go on first. Percentage surcharges then apply in
/// order, each against the running total, so they compound. Monthly
/// surcharges are skipped.
pub fn aggregate_surcharges(base: f64, surcharges: &[Surcharge]) -> SurchargeBreakdown {
    let fixed: f64 = surcharges
        .iter()
        .filter(|s| s.kind == SurchargeKind::FixedPerShipment)
        .map(|s| s.amount)
        .sum();

    let mut total = base + fixed;
    for surcharge in surcharges.iter().filter(|s| s.kind == SurchargeKind::PctOfBase) {
        total += total * surcharge.amount / 100.0;
    }

    SurchargeBreakdown {
        base,
        surcharges: total - base,
        total,
    }
}

/// Carrier base rate for parcels up to `max_weight_g` in a zone
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WeightBand {
    pub zone: String,
    pub max_weight_g: f64,
    pub base_rate: f64,
}

/// Fees for the direct-to-consumer shop
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DirectFeeSchedule {
    /// Destination zone used for the carrier lookup
    pub zone: String,
    pub carrier_bands: Vec<WeightBand>,
    pub surcharges: Vec<Surcharge>,
}

impl Default for DirectFeeSchedule {
    fn default() -> Self {
        let band = |max_weight_g: f64, base_rate: f64| WeightBand {
            zone: "DE".to_string(),
            max_weight_g,
            base_rate,
        };
        Self {
            zone: "DE".to_string(),
            carrier_bands: vec![
                band(1000.0, 3.79),
                band(2000.0, 4.39),
                band(5000.0, 5.49),
                band(31500.0, 7.99),
            ],
            surcharges: vec![
                Surcharge {
                    name: "energy".to_string(),
                    kind: SurchargeKind::PctOfBase,
                    amount: 4.5,
                },
                Surcharge {
                    name: "toll".to_string(),
                    kind: SurchargeKind::FixedPerShipment,
                    amount: 0.19,
                },
            ],
        }
    }
}

impl DirectFeeSchedule {
    /// Smallest band in the schedule's zone that fits the parcel
    pub fn carrier_base_rate(&self, weight_g: f64) -> Option<f64> {
        self.carrier_bands
            .iter()
            .filter(|b| b.zone == self.zone && b.max_weight_g >= weight_g)
            .min_by(|a, b| a.max_weight_g.total_cmp(&b.max_weight_g))
            .map(|b| b.base_rate)
    }

    pub fn shipment_cost(&self, base_rate: f64) -> SurchargeBreakdown {
        aggregate_surcharges(base_rate, &self.surcharges)
    }
}

/// Referral percentage for gross prices up to `up_to_gross`; `None` is the top tier
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ReferralTier {
    pub up_to_gross: Option<f64>,
    pub pct: f64,
}

/// Fees charged by the marketplace
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct MarketplaceFeeSchedule {
    pub referral_tiers: Vec<ReferralTier>,
    pub referral_minimum: f64,
    /// Fixed fulfillment fee per declared size tier
    pub fulfillment_fees: HashMap<String, f64>,
    pub ad_pct: f64,
    pub returns_pct: f64,
    /// Platform charges beyond the referral fee, if any
    pub platform_pct: f64,
}

impl Default for MarketplaceFeeSchedule {
    fn default() -> Self {
        let mut fulfillment_fees = HashMap::new();
        fulfillment_fees.insert("small_envelope".to_string(), 2.07);
        fulfillment_fees.insert("standard_envelope".to_string(), 2.38);
        fulfillment_fees.insert("small_parcel".to_string(), 3.05);
        fulfillment_fees.insert("standard_parcel".to_string(), 3.73);
        Self {
            referral_tiers: vec![
                ReferralTier { up_to_gross: Some(10.0), pct: 8.0 },
                ReferralTier { up_to_gross: None, pct: 15.0 },
            ],
            referral_minimum: 0.30,
            fulfillment_fees,
            ad_pct: 6.0,
            returns_pct: 3.0,
            platform_pct: 0.0,
        }
    }
}

impl MarketplaceFeeSchedule {
    /// Tier percentage for a gross price. Tiers must be sorted, see
    /// [`ChannelFeeTables::normalized`].
    pub fn referral_pct_for(&self, gross: f64) -> f64 {
        self.referral_tiers
            .iter()
            .find(|t| t.up_to_gross.map_or(true, |cap| gross <= cap))
            .or_else(|| self.referral_tiers.last())
            .map(|t| t.pct)
            .unwrap_or(0.0)
    }

    /// Percentage of the lowest tier, used to seed the guardrail solver
    pub fn lowest_referral_pct(&self) -> f64 {
        self.referral_tiers.first().map(|t| t.pct).unwrap_or(0.0)
    }

    pub fn referral_fee(&self, gross: f64, pct: f64) -> f64 {
        (gross * pct / 100.0).max(self.referral_minimum)
    }

    pub fn fulfillment_fee(&self, size_tier: &str) -> Option<f64> {
        self.fulfillment_fees.get(size_tier.trim()).copied()
    }
}

/// Fee tables for every channel, read once per run
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ChannelFeeTables {
    pub direct: DirectFeeSchedule,
    pub marketplace: MarketplaceFeeSchedule,
}

impl ChannelFeeTables {
    /// Sort tiers and bands so lookups can take the first match.
    pub fn normalized(mut self) -> Self {
        self.marketplace
            .referral_tiers
            .sort_by(|a, b| match (a.up_to_gross, b.up_to_gross) {
                (Some(x), Some(y)) => x.total_cmp(&y),
                (Some(_), None) => Ordering::Less,
                (None, Some(_)) => Ordering::Greater,
                (None, None) => Ordering::Equal,
            });
        self.direct
            .carrier_bands
            .sort_by(|a, b| a.max_weight_g.total_cmp(&b.max_weight_g));
        self
    }
}
