pub mod error;
pub mod money;
pub mod line;
pub mod params;
pub mod product;
pub mod cost;
pub mod uvp;
pub mod grundpreis;
pub mod floor;
pub mod fees;
pub mod guardrail;
pub mod channel;
pub mod partner;
pub mod pricing;

pub use error::PricingError;
pub use line::{LineParameters, LineTable, ProductLine};
pub use params::PricingParameters;
pub use product::{CostComponents, GiftAttach, ProductCostInputs};
pub use cost::{CostRollUp, FactoryPriceSource};
pub use uvp::{Uvp, UvpSource};
pub use grundpreis::{UnitBasis, UnitPrice};
pub use fees::{
    ChannelFeeTables, DirectFeeSchedule, MarketplaceFeeSchedule, ReferralTier, Surcharge,
    SurchargeBreakdown, SurchargeKind, WeightBand,
};
pub use guardrail::{
    GuardrailProblem, GuardrailSettings, GuardrailSolution, GuardrailSolver, ReferralRate,
};
pub use channel::{ChannelFees, ChannelKind, ChannelResult};
pub use partner::{PartnerPrice, PartnerTier, PartnerTierTable};
pub use pricing::{PricingBreakdown, PricingContext, PricingEngine};
