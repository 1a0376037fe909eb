use serde::{Deserialize, Serialize};

/// Wholesale tiers offered to B2B partners
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PartnerTier {
    DealerBasic,
    DealerPlus,
    StandPartner,
    Distributor,
}

impl PartnerTier {
    pub const ALL: [PartnerTier; 4] = [
        PartnerTier::DealerBasic,
        PartnerTier::DealerPlus,
        PartnerTier::StandPartner,
        PartnerTier::Distributor,
    ];
}

/// Share of UVP net each tier pays
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PartnerTierTable {
    pub dealer_basic: f64,
    pub dealer_plus: f64,
    pub stand_partner: f64,
    pub distributor: f64,
    /// Stand partner bonus as a share of UVP net
    pub stand_partner_bonus: f64,
}

impl Default for PartnerTierTable {
    fn default() -> Self {
        Self {
            dealer_basic: 0.60,
            dealer_plus: 0.50,
            stand_partner: 0.70,
            distributor: 0.40,
            stand_partner_bonus: 0.05,
        }
    }
}

impl PartnerTierTable {
    pub fn fraction(&self, tier: PartnerTier) -> f64 {
        match tier {
            PartnerTier::DealerBasic => self.dealer_basic,
            PartnerTier::DealerPlus => self.dealer_plus,
            PartnerTier::StandPartner => self.stand_partner,
            PartnerTier::Distributor => self.distributor,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PartnerPrice {
    pub tier: PartnerTier,
    pub net_price: f64,
    /// The floor, not the tier share, set the price
    pub floor_protected: bool,
    /// Paid separately; never part of `net_price`
    pub bonus: Option<f64>,
}

/// Tier prices from UVP net, each lifted to the floor when it would fall below.
pub fn price_partner_tiers(
    uvp_net: f64,
    floor_net: f64,
    table: &PartnerTierTable,
) -> Vec<PartnerPrice> {
    PartnerTier::ALL
        .iter()
        .map(|&tier| {
            let net_price = (uvp_net * table.fraction(tier)).max(floor_net);
            let bonus = match tier {
                PartnerTier::StandPartner => Some(uvp_net * table.stand_partner_bonus),
                _ => None,
            };
            PartnerPrice {
                tier,
                net_price,
                floor_protected: net_price == floor_net,
                bonus,
            }
        })
        .collect()
}
