use serde::{Deserialize, Serialize};

use crate::fees::{DirectFeeSchedule, MarketplaceFeeSchedule};
use crate::guardrail::{GuardrailProblem, GuardrailSolution, GuardrailSolver, ReferralRate};
use crate::line::LineParameters;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ChannelKind {
    Direct,
    Marketplace,
}

impl ChannelKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChannelKind::Direct => "direct",
            ChannelKind::Marketplace => "marketplace",
        }
    }
}

/// Itemised channel costs for one unit
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ChannelFees {
    pub ad: f64,
    pub returns: f64,
    pub loyalty: f64,
    pub payment: f64,
    pub referral: f64,
    pub fulfillment: f64,
    pub shipping_base: f64,
    pub shipping_surcharges: f64,
    pub total: f64,
}

impl ChannelFees {
    fn summed(mut self) -> Self {
        self.total = self.ad
            + self.returns
            + self.loyalty
            + self.payment
            + self.referral
            + self.fulfillment
            + self.shipping_base
            + self.shipping_surcharges;
        self
    }
}

/// Revenue, fee and margin picture of one SKU in one channel
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChannelResult {
    pub channel: ChannelKind,
    pub gross: f64,
    pub fees: ChannelFees,
    /// Gross minus channel fees
    pub net_revenue: f64,
    pub contribution_margin: f64,
    pub margin_pct: f64,
    pub guardrail_passed: bool,
    /// Lowest net price that would meet the guardrail in this channel
    pub min_guardrail_net: GuardrailSolution,
}

/// Per-SKU facts the channel calculators need
#[derive(Debug, Clone)]
pub struct ChannelInput<'a> {
    pub sku: &'a str,
    pub full_cost: f64,
    /// VAT-inclusive shelf price
    pub gross: f64,
    pub vat_pct: f64,
    pub line: &'a LineParameters,
    pub shipping_weight_g: Option<f64>,
    pub size_tier: Option<&'a str>,
    pub referral_pct_override: Option<f64>,
}

/// Own shop: percentage costs on gross plus carrier shipping.
pub fn price_direct(
    input: &ChannelInput<'_>,
    schedule: &DirectFeeSchedule,
    solver: &GuardrailSolver,
    warnings: &mut Vec<String>,
) -> ChannelResult {
    let gross = input.gross;
    let line = input.line;

    let base_rate = match input.shipping_weight_g {
        Some(weight) => match schedule.carrier_base_rate(weight) {
            Some(rate) => Some(rate),
            None => {
                warnings.push(format!(
                    "{}: no carrier band for {:.0} g in zone {}",
                    input.sku, weight, schedule.zone
                ));
                None
            }
        },
        None => {
            warnings.push(format!("{}: no shipping weight, carrier cost not included", input.sku));
            None
        }
    };
    let shipment = base_rate.map(|rate| schedule.shipment_cost(rate));

    let fees = ChannelFees {
        ad: gross * line.ad_pct / 100.0,
        returns: gross * line.returns_pct / 100.0,
        loyalty: gross * line.loyalty_pct / 100.0,
        payment: gross * line.payment_pct / 100.0,
        shipping_base: shipment.map(|s| s.base).unwrap_or(0.0),
        shipping_surcharges: shipment.map(|s| s.surcharges).unwrap_or(0.0),
        ..Default::default()
    }
    .summed();

    let problem = GuardrailProblem {
        full_cost: input.full_cost,
        fixed_fees: shipment.map(|s| s.total).unwrap_or(0.0),
        variable_pct: line.direct_cost_pct(),
        target_margin_pct: solver.settings().min_margin_pct,
        vat_pct: input.vat_pct,
    };
    let min_guardrail_net = solver.solve(&problem, ReferralRate::Constant(0.0));

    assemble(ChannelKind::Direct, input, fees, min_guardrail_net, solver)
}

/// Marketplace: tiered referral fee with a minimum, fixed fulfillment fee by
/// size tier. Payment processing is absorbed by the platform.
pub fn price_marketplace(
    input: &ChannelInput<'_>,
    schedule: &MarketplaceFeeSchedule,
    solver: &GuardrailSolver,
    warnings: &mut Vec<String>,
) -> ChannelResult {
    let gross = input.gross;

    let referral_pct = input
        .referral_pct_override
        .unwrap_or_else(|| schedule.referral_pct_for(gross));

    let fulfillment = match input.size_tier {
        Some(tier) => schedule.fulfillment_fee(tier).unwrap_or_else(|| {
            warnings.push(format!(
                "{}: size tier '{}' not in marketplace fee table, fulfillment fee set to 0.00",
                input.sku, tier
            ));
            0.0
        }),
        None => 0.0,
    };

    let fees = ChannelFees {
        ad: gross * schedule.ad_pct / 100.0,
        returns: gross * schedule.returns_pct / 100.0,
        referral: schedule.referral_fee(gross, referral_pct),
        fulfillment,
        ..Default::default()
    }
    .summed();

    let problem = GuardrailProblem {
        full_cost: input.full_cost,
        fixed_fees: fulfillment,
        variable_pct: schedule.ad_pct + schedule.returns_pct + schedule.platform_pct,
        target_margin_pct: solver.settings().min_margin_pct,
        vat_pct: input.vat_pct,
    };
    let rate = match input.referral_pct_override {
        Some(pct) => ReferralRate::Constant(pct),
        None => ReferralRate::Tiered(schedule),
    };
    let min_guardrail_net = solver.solve(&problem, rate);

    assemble(ChannelKind::Marketplace, input, fees, min_guardrail_net, solver)
}

fn assemble(
    channel: ChannelKind,
    input: &ChannelInput<'_>,
    fees: ChannelFees,
    min_guardrail_net: GuardrailSolution,
    solver: &GuardrailSolver,
) -> ChannelResult {
    let gross = input.gross;
    let contribution_margin = gross - input.full_cost - fees.total;
    let margin_pct = if gross > 0.0 {
        contribution_margin / gross * 100.0
    } else {
        0.0
    };

    ChannelResult {
        channel,
        gross,
        net_revenue: gross - fees.total,
        contribution_margin,
        margin_pct,
        guardrail_passed: gross > 0.0 && margin_pct >= solver.settings().min_margin_pct,
        fees,
        min_guardrail_net,
    }
}
