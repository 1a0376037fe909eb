use serde::{Deserialize, Serialize};

use crate::fees::MarketplaceFeeSchedule;

/// Tunables for the margin guardrail and its price solver
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct GuardrailSettings {
    /// Minimum contribution margin a channel must reach
    pub min_margin_pct: f64,
    /// Convergence threshold on the solved net price
    pub epsilon: f64,
    pub max_iterations: u32,
}

impl Default for GuardrailSettings {
    fn default() -> Self {
        Self {
            min_margin_pct: 45.0,
            epsilon: 0.01,
            max_iterations: 5,
        }
    }
}

/// Outcome of solving for the lowest net price that meets the guardrail
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum GuardrailSolution {
    Solved {
        net: f64,
        gross: f64,
        referral_pct: f64,
        iterations: u32,
        /// False when the iteration cap hit before the price settled
        converged: bool,
    },
    /// Fees plus margin consume the whole price; no net price works
    Unsatisfiable { iterations: u32 },
}

impl GuardrailSolution {
    pub fn net(&self) -> Option<f64> {
        match self {
            GuardrailSolution::Solved { net, .. } => Some(*net),
            GuardrailSolution::Unsatisfiable { .. } => None,
        }
    }
}

/// Where the referral percentage comes from
#[derive(Debug, Clone, Copy)]
pub enum ReferralRate<'a> {
    Constant(f64),
    /// Depends on the gross price through the marketplace tier table
    Tiered(&'a MarketplaceFeeSchedule),
}

impl ReferralRate<'_> {
    fn seed(&self) -> f64 {
        match self {
            ReferralRate::Constant(pct) => *pct,
            ReferralRate::Tiered(schedule) => schedule.lowest_referral_pct(),
        }
    }

    fn resolve(&self, gross: f64) -> f64 {
        match self {
            ReferralRate::Constant(pct) => *pct,
            ReferralRate::Tiered(schedule) => schedule.referral_pct_for(gross),
        }
    }
}

/// `net = (full cost + fixed fees) / (1 − (variable% + referral% + margin%))`
#[derive(Debug, Clone, PartialEq)]
pub struct GuardrailProblem {
    pub full_cost: f64,
    pub fixed_fees: f64,
    /// Percentage fees other than the referral fee
    pub variable_pct: f64,
    pub target_margin_pct: f64,
    pub vat_pct: f64,
}

impl GuardrailProblem {
    fn net_for(&self, referral_pct: f64) -> Option<f64> {
        let denominator = 1.0 - (self.variable_pct + referral_pct + self.target_margin_pct) / 100.0;
        if denominator <= 0.0 {
            return None;
        }
        Some((self.full_cost + self.fixed_fees) / denominator)
    }

    fn gross_for(&self, net: f64) -> f64 {
        net * (1.0 + self.vat_pct / 100.0)
    }
}

/// Fixed-point solver for prices whose fees depend on the price itself
pub struct GuardrailSolver {
    settings: GuardrailSettings,
}

impl GuardrailSolver {
    pub fn new(settings: GuardrailSettings) -> Self {
        Self { settings }
    }

    pub fn settings(&self) -> &GuardrailSettings {
        &self.settings
    }

    /// Seed the referral rate, solve net, re-resolve the rate at the new gross
    /// and repeat until the net moves less than epsilon or the cap is hit.
    pub fn solve(
        &self,
        problem: &GuardrailProblem,
        referral: ReferralRate<'_>,
    ) -> GuardrailSolution {
        let mut referral_pct = referral.seed();
        let mut net = match problem.net_for(referral_pct) {
            Some(net) => net,
            None => return GuardrailSolution::Unsatisfiable { iterations: 0 },
        };

        let max_iterations = self.settings.max_iterations.max(1);
        for iteration in 1..=max_iterations {
            referral_pct = referral.resolve(problem.gross_for(net));
            let next = match problem.net_for(referral_pct) {
                Some(next) => next,
                None => return GuardrailSolution::Unsatisfiable { iterations: iteration },
            };

            let delta = (next - net).abs();
            net = next;
            if delta < self.settings.epsilon {
                return GuardrailSolution::Solved {
                    net,
                    gross: problem.gross_for(net),
                    referral_pct,
                    iterations: iteration,
                    converged: true,
                };
            }
        }

        GuardrailSolution::Solved {
            net,
            gross: problem.gross_for(net),
            referral_pct,
            iterations: max_iterations,
            converged: false,
        }
    }
}

impl Default for GuardrailSolver {
    fn default() -> Self {
        Self::new(GuardrailSettings::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fees::ReferralTier;

    fn problem() -> GuardrailProblem {
        GuardrailProblem {
            full_cost: 10.0,
            fixed_fees: 2.0,
            variable_pct: 10.0,
            target_margin_pct: 45.0,
            vat_pct: 19.0,
        }
    }

    #[test]
    fn test_constant_rate_converges_in_one_iteration() {
        let solution = GuardrailSolver::default().solve(&problem(), ReferralRate::Constant(15.0));

        // Closed form: 12 / (1 − 0.70)
        let expected = 12.0 / (1.0 - (10.0 + 15.0 + 45.0) / 100.0);
        match solution {
            GuardrailSolution::Solved { net, iterations, converged, referral_pct, .. } => {
                assert_eq!(iterations, 1);
                assert!(converged);
                assert_eq!(net, expected);
                assert_eq!(referral_pct, 15.0);
            }
            other => panic!("expected solved, got {:?}", other),
        }
    }

    #[test]
    fn test_tiered_rate_moves_to_upper_tier() {
        let schedule = MarketplaceFeeSchedule {
            referral_tiers: vec![
                ReferralTier { up_to_gross: Some(10.0), pct: 8.0 },
                ReferralTier { up_to_gross: None, pct: 15.0 },
            ],
            ..Default::default()
        };
        let solution =
            GuardrailSolver::default().solve(&problem(), ReferralRate::Tiered(&schedule));

        match solution {
            GuardrailSolution::Solved { net, referral_pct, converged, iterations, .. } => {
                assert!(converged);
                assert_eq!(referral_pct, 15.0);
                assert!(iterations >= 2);
                assert!((net - 40.0).abs() < 1e-9);
            }
            other => panic!("expected solved, got {:?}", other),
        }
    }

    #[test]
    fn test_oscillating_tiers_hit_iteration_cap() {
        // Cheap items pay the higher rate, so each guess flips the tier
        let schedule = MarketplaceFeeSchedule {
            referral_tiers: vec![
                ReferralTier { up_to_gross: Some(40.0), pct: 20.0 },
                ReferralTier { up_to_gross: None, pct: 5.0 },
            ],
            ..Default::default()
        };
        let solver = GuardrailSolver::default();
        let solution = solver.solve(&problem(), ReferralRate::Tiered(&schedule));

        match solution {
            GuardrailSolution::Solved { net, referral_pct, iterations, converged, .. } => {
                assert_eq!(iterations, solver.settings().max_iterations);
                assert!(!converged);
                // 12 / (1 − 0.60) after an odd number of flips
                assert_eq!(referral_pct, 5.0);
                assert!((net - 30.0).abs() < 1e-9);
            }
            other => panic!("expected solved, got {:?}", other),
        }
    }

    #[test]
    fn test_unsatisfiable_is_explicit() {
        let mut p = problem();
        p.variable_pct = 50.0;
        let solution = GuardrailSolver::default().solve(&p, ReferralRate::Constant(15.0));
        assert_eq!(solution, GuardrailSolution::Unsatisfiable { iterations: 0 });
        assert_eq!(solution.net(), None);
    }

    #[test]
    fn test_unsatisfiable_after_tier_change() {
        // Seed tier leaves room, the upper tier does not.
        let schedule = MarketplaceFeeSchedule {
            referral_tiers: vec![
                ReferralTier { up_to_gross: Some(1.0), pct: 5.0 },
                ReferralTier { up_to_gross: None, pct: 60.0 },
            ],
            ..Default::default()
        };
        let solution =
            GuardrailSolver::default().solve(&problem(), ReferralRate::Tiered(&schedule));
        assert_eq!(solution, GuardrailSolution::Unsatisfiable { iterations: 1 });
    }
}
