use serde::{Deserialize, Serialize};

use crate::channel::{price_direct, price_marketplace, ChannelInput, ChannelKind, ChannelResult};
use crate::cost::{build_cost_rollup, CostRollUp};
use crate::error::PricingError;
use crate::fees::ChannelFeeTables;
use crate::floor::floor_net;
use crate::grundpreis::{unit_price, UnitPrice};
use crate::guardrail::{GuardrailSettings, GuardrailSolution, GuardrailSolver};
use crate::line::ProductLine;
use crate::params::PricingParameters;
use crate::partner::{price_partner_tiers, PartnerPrice, PartnerTier, PartnerTierTable};
use crate::product::ProductCostInputs;
use crate::uvp::{from_gross_override, solve_uvp, Uvp};

/// Everything a pricing run reads once and shares across rows
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PricingContext {
    pub parameters: PricingParameters,
    pub partner_tiers: PartnerTierTable,
    pub fees: ChannelFeeTables,
    pub guardrail: GuardrailSettings,
}

impl Default for PricingContext {
    fn default() -> Self {
        Self {
            parameters: PricingParameters::default(),
            partner_tiers: PartnerTierTable::default(),
            fees: ChannelFeeTables::default(),
            guardrail: GuardrailSettings::default(),
        }
    }
}

impl PricingContext {
    pub fn new(
        parameters: PricingParameters,
        partner_tiers: PartnerTierTable,
        fees: ChannelFeeTables,
        guardrail: GuardrailSettings,
    ) -> Self {
        Self {
            parameters,
            partner_tiers,
            fees: fees.normalized(),
            guardrail,
        }
    }
}

/// Full pricing picture of one SKU
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PricingBreakdown {
    pub sku: String,
    pub line: ProductLine,
    pub cost: CostRollUp,
    pub uvp: Uvp,
    pub grundpreis: UnitPrice,
    pub floor_net: f64,
    pub channels: Vec<ChannelResult>,
    pub partners: Vec<PartnerPrice>,
    pub guardrail_violations: Vec<String>,
    pub warnings: Vec<String>,
}

impl PricingBreakdown {
    pub fn channel(&self, kind: ChannelKind) -> Option<&ChannelResult> {
        self.channels.iter().find(|c| c.channel == kind)
    }

    pub fn partner(&self, tier: PartnerTier) -> Option<&PartnerPrice> {
        self.partners.iter().find(|p| p.tier == tier)
    }
}

/// Composes the cost, price, floor, channel and partner calculators
pub struct PricingEngine {
    context: PricingContext,
    solver: GuardrailSolver,
}

impl PricingEngine {
    pub fn new(context: PricingContext) -> Result<Self, PricingError> {
        context.parameters.validate()?;
        let solver = GuardrailSolver::new(context.guardrail.clone());
        Ok(Self { context, solver })
    }

    pub fn context(&self) -> &PricingContext {
        &self.context
    }

    /// Price one SKU.
    ///
    /// Data gaps end up as warnings on a best-effort breakdown. Only malformed
    /// numbers or an unusable line configuration return an error.
    pub fn price(&self, inputs: &ProductCostInputs) -> Result<PricingBreakdown, PricingError> {
        let params = &self.context.parameters;
        let line = params.line(inputs.line);
        let mut warnings = Vec::new();
        let mut guardrail_violations = Vec::new();

        let cost = build_cost_rollup(inputs, params.fx_buffer_pct, &mut warnings)?;

        let uvp = match inputs.uvp_override_gross.filter(|g| *g > 0.0) {
            Some(gross) => from_gross_override(gross, params.vat_pct),
            None => solve_uvp(cost.full_cost, line.target_margin_pct, params.vat_pct)?,
        };

        let grundpreis = unit_price(
            &inputs.sku,
            uvp.gross,
            inputs.net_content_ml,
            inputs.weight_g,
            &mut warnings,
        );

        let floor = floor_net(cost.full_cost, line.floor_multiplier);
        if uvp.net < floor {
            warnings.push(format!(
                "{}: UVP net {:.2} is below floor {:.2}",
                inputs.sku, uvp.net, floor
            ));
        }

        let channel_input = ChannelInput {
            sku: &inputs.sku,
            full_cost: cost.full_cost,
            gross: uvp.gross,
            vat_pct: params.vat_pct,
            line,
            shipping_weight_g: inputs.weight_g.or(inputs.net_content_ml),
            size_tier: inputs.size_tier.as_deref().filter(|t| !t.trim().is_empty()),
            referral_pct_override: inputs.referral_pct_override,
        };
        let fees = &self.context.fees;
        let channels = vec![
            price_direct(&channel_input, &fees.direct, &self.solver, &mut warnings),
            price_marketplace(&channel_input, &fees.marketplace, &self.solver, &mut warnings),
        ];

        let threshold = self.context.guardrail.min_margin_pct;
        for result in &channels {
            let name = result.channel.as_str();
            if !result.guardrail_passed {
                guardrail_violations.push(format!(
                    "{}: margin {:.2}% below {:.2}%",
                    name, result.margin_pct, threshold
                ));
            }
            match result.min_guardrail_net {
                GuardrailSolution::Unsatisfiable { .. } => guardrail_violations.push(format!(
                    "{}: no net price satisfies the {:.2}% guardrail",
                    name, threshold
                )),
                GuardrailSolution::Solved {
                    converged: false,
                    iterations,
                    ..
                } => warnings.push(format!(
                    "{}: {} guardrail price did not settle after {} iterations",
                    inputs.sku, name, iterations
                )),
                GuardrailSolution::Solved { .. } => {}
            }
        }

        let partners = price_partner_tiers(uvp.net, floor, &self.context.partner_tiers);

        Ok(PricingBreakdown {
            sku: inputs.sku.clone(),
            line: inputs.line,
            cost,
            uvp,
            grundpreis,
            floor_net: floor,
            channels,
            partners,
            guardrail_violations,
            warnings,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fees::ReferralTier;
    use crate::line::{LineParameters, LineTable};
    use crate::uvp::UvpSource;

    fn context() -> PricingContext {
        let mut lines = LineTable::<LineParameters>::default();
        lines.basic.target_margin_pct = 50.0;
        lines.basic.floor_multiplier = 2.1;
        PricingContext::new(
            PricingParameters {
                vat_pct: 19.0,
                fx_buffer_pct: 0.0,
                lines,
            },
            PartnerTierTable::default(),
            ChannelFeeTables::default(),
            GuardrailSettings::default(),
        )
    }

    fn basic_sku() -> ProductCostInputs {
        let mut inputs = ProductCostInputs::new("SKU-10", ProductLine::Basic);
        inputs.manual_unit_price = Some(10.0);
        inputs.net_content_ml = Some(500.0);
        inputs.size_tier = Some("small_parcel".to_string());
        inputs
    }

    #[test]
    fn test_worked_example() {
        let engine = PricingEngine::new(context()).unwrap();
        let breakdown = engine.price(&basic_sku()).unwrap();

        assert_eq!(breakdown.cost.full_cost, 10.0);
        assert_eq!(breakdown.uvp.net, 20.0);
        assert!((breakdown.uvp.gross - 23.80).abs() < 1e-9);
        assert_eq!(breakdown.floor_net, 21.0);

        let basic = breakdown.partner(PartnerTier::DealerBasic).unwrap();
        assert_eq!(basic.net_price, 21.0);
        assert!(basic.floor_protected);

        assert_eq!(breakdown.grundpreis.to_string(), "€47.60/L");
        assert_eq!(breakdown.channels.len(), 2);
    }

    #[test]
    fn test_data_gaps_become_warnings() {
        let engine = PricingEngine::new(context()).unwrap();
        let mut inputs = ProductCostInputs::new("SKU-GAP", ProductLine::Other);
        inputs.size_tier = Some("pallet".to_string());

        let breakdown = engine.price(&inputs).unwrap();

        assert_eq!(breakdown.cost.full_cost, 0.0);
        assert_eq!(breakdown.grundpreis, UnitPrice::unavailable());
        assert_eq!(breakdown.grundpreis.value, 0.0);
        assert!(breakdown.warnings.iter().any(|w| w.contains("no factory price")));
        assert!(breakdown.warnings.iter().any(|w| w.contains("pallet")));
        assert!(breakdown.warnings.iter().any(|w| w.contains("Grundpreis")));
        assert!(!breakdown.guardrail_violations.is_empty());
    }

    #[test]
    fn test_unsettled_guardrail_price_warns() {
        let mut ctx = context();
        ctx.fees.marketplace.referral_tiers = vec![
            ReferralTier { up_to_gross: Some(40.0), pct: 20.0 },
            ReferralTier { up_to_gross: None, pct: 5.0 },
        ];
        let engine = PricingEngine::new(ctx).unwrap();
        let mut inputs = basic_sku();
        inputs.size_tier = None;

        let breakdown = engine.price(&inputs).unwrap();

        let marketplace = breakdown.channel(ChannelKind::Marketplace).unwrap();
        assert!(matches!(
            marketplace.min_guardrail_net,
            GuardrailSolution::Solved { converged: false, iterations: 5, .. }
        ));
        assert!(breakdown
            .warnings
            .iter()
            .any(|w| w.contains("did not settle after 5 iterations")));
    }

    #[test]
    fn test_override_below_floor_warns() {
        let engine = PricingEngine::new(context()).unwrap();
        let mut inputs = basic_sku();
        inputs.uvp_override_gross = Some(11.90);

        let breakdown = engine.price(&inputs).unwrap();
        assert_eq!(breakdown.uvp.source, UvpSource::ManualOverride);
        assert!((breakdown.uvp.net - 10.0).abs() < 1e-9);
        assert!(breakdown.warnings.iter().any(|w| w.contains("below floor")));
    }

    #[test]
    fn test_bad_margin_configuration_is_an_error() {
        let mut ctx = context();
        ctx.parameters.lines.basic.target_margin_pct = 100.0;
        let engine = PricingEngine::new(ctx).unwrap();
        assert!(matches!(engine.price(&basic_sku()), Err(PricingError::Configuration(_))));
    }

    #[test]
    fn test_malformed_input_is_an_error() {
        let engine = PricingEngine::new(context()).unwrap();
        let mut inputs = basic_sku();
        inputs.weight_g = Some(-1.0);
        assert!(matches!(engine.price(&inputs), Err(PricingError::MalformedInput { .. })));
    }

    #[test]
    fn test_low_margin_records_violation() {
        let mut ctx = context();
        ctx.parameters.lines.basic.target_margin_pct = 20.0;
        let engine = PricingEngine::new(ctx).unwrap();

        let breakdown = engine.price(&basic_sku()).unwrap();
        let direct = breakdown.channel(ChannelKind::Direct).unwrap();
        assert!(!direct.guardrail_passed);
        assert!(breakdown.guardrail_violations.iter().any(|v| v.starts_with("direct:")));
    }
}
