//! Tax-saving suggestions derived from a calculation.
//!
//! Two kinds are produced: switching to the cheaper regime, and using the
//! unclaimed headroom of capped deductions. Headroom savings are estimated by
//! simulating the filled-up deduction, so they respect slab boundaries.

use std::fmt;

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

use crate::calculations::{ScenarioDelta, TaxCalculator};
use crate::error::TaxError;
use crate::models::{DeductionCode, Regime, TaxInput};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Suggestion {
    /// The other regime yields a strictly lower liability.
    SwitchRegime { to: Regime, saving: Decimal },

    /// A capped deduction is not fully used.
    CapHeadroom {
        code: DeductionCode,
        remaining: Decimal,
        estimated_saving: Decimal,
    },
}

impl Suggestion {
    pub fn saving(&self) -> Decimal {
        match self {
            Self::SwitchRegime { saving, .. } => *saving,
            Self::CapHeadroom {
                estimated_saving, ..
            } => *estimated_saving,
        }
    }
}

/// Whole rupees, halves away from zero.
fn rupees(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
}

impl fmt::Display for Suggestion {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        match self {
            Self::SwitchRegime { to, saving } => write!(
                f,
                "Switch to the {to} regime to pay ₹{} less tax.",
                rupees(*saving)
            ),
            Self::CapHeadroom {
                code,
                remaining,
                estimated_saving,
            } => write!(
                f,
                "Invest up to ₹{} more under {} ({}); estimated saving ₹{}.",
                rupees(*remaining),
                code.as_str(),
                code.label(),
                rupees(*estimated_saving)
            ),
        }
    }
}

impl TaxCalculator<'_> {
    /// Suggestions for `input`, regime switch first, then headroom ordered
    /// by estimated saving (largest first; ties keep code order).
    pub fn suggest(
        &self,
        input: &TaxInput,
    ) -> Result<Vec<Suggestion>, TaxError> {
        let result = self.calculate(input)?;
        let mut suggestions = Vec::new();

        if let Some(better) = result.regime_better.regime() {
            if better != input.regime {
                suggestions.push(Suggestion::SwitchRegime {
                    to: better,
                    saving: result.liability_for(input.regime) - result.liability_for(better),
                });
            }
        }

        let mut headroom = Vec::new();
        for (code, used) in result.deductions_used.iter() {
            let Some(remaining) = self.rules().caps.headroom(code, used) else {
                continue;
            };
            if remaining <= Decimal::ZERO {
                continue;
            }
            let filled = self.simulate_scenario(input, &ScenarioDelta::deduction(code, remaining))?;
            headroom.push(Suggestion::CapHeadroom {
                code,
                remaining,
                estimated_saving: result.tax_liability - filled.tax_liability,
            });
        }
        headroom.sort_by(|a, b| b.saving().cmp(&a.saving()));
        suggestions.extend(headroom);

        Ok(suggestions)
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    use super::*;
    use crate::models::{DeductionSet, TaxRules};

    #[test]
    fn suggests_headroom_for_every_capped_code() {
        let rules = TaxRules::india_illustrative();
        let calculator = TaxCalculator::new(&rules);
        let input = TaxInput::new(dec!(400000), dec!(0), DeductionSet::default(), Regime::Old);

        let suggestions = calculator.suggest(&input).unwrap();

        let codes: Vec<_> = suggestions
            .iter()
            .filter_map(|s| match s {
                Suggestion::CapHeadroom { code, .. } => Some(*code),
                Suggestion::SwitchRegime { .. } => None,
            })
            .collect();
        assert_eq!(codes.len(), 4);
        assert!(codes.contains(&DeductionCode::Section80C));
        assert!(codes.contains(&DeductionCode::Nps));
        assert!(!codes.contains(&DeductionCode::Hra));
        assert!(!codes.contains(&DeductionCode::Donations));
    }

    #[test]
    fn headroom_saving_respects_slabs() {
        let rules = TaxRules::india_illustrative();
        let calculator = TaxCalculator::new(&rules);
        let deductions = DeductionSet::default().with(DeductionCode::Section80C, dec!(50000));
        let input = TaxInput::new(dec!(400000), dec!(0), deductions, Regime::Old);

        let suggestions = calculator.suggest(&input).unwrap();

        // taxable 350000 -> 250000 when 80C is filled: 100000 * 0.05
        let section_80c = suggestions
            .iter()
            .find(|s| {
                matches!(
                    s,
                    Suggestion::CapHeadroom {
                        code: DeductionCode::Section80C,
                        ..
                    }
                )
            })
            .unwrap();
        assert_eq!(
            section_80c,
            &Suggestion::CapHeadroom {
                code: DeductionCode::Section80C,
                remaining: dec!(100000),
                estimated_saving: dec!(5000),
            }
        );
    }

    #[test]
    fn headroom_sorted_by_saving() {
        let rules = TaxRules::india_illustrative();
        let calculator = TaxCalculator::new(&rules);
        let input = TaxInput::new(dec!(2000000), dec!(0), DeductionSet::default(), Regime::Old);

        let suggestions = calculator.suggest(&input).unwrap();

        let savings: Vec<_> = suggestions
            .iter()
            .filter(|s| matches!(s, Suggestion::CapHeadroom { .. }))
            .map(Suggestion::saving)
            .collect();
        // All in the 30% slab: home loan, 80C, NPS, 80D
        assert_eq!(
            savings,
            vec![dec!(60000), dec!(45000), dec!(15000), dec!(7500)]
        );
    }

    #[test]
    fn full_caps_produce_no_headroom() {
        let rules = TaxRules::india_illustrative();
        let calculator = TaxCalculator::new(&rules);
        let deductions = DeductionSet::default()
            .with(DeductionCode::Section80C, dec!(150000))
            .with(DeductionCode::Section80D, dec!(25000))
            .with(DeductionCode::HomeLoan, dec!(250000))
            .with(DeductionCode::Nps, dec!(50000));
        let input = TaxInput::new(dec!(3000000), dec!(0), deductions, Regime::Old);

        let suggestions = calculator.suggest(&input).unwrap();

        assert!(
            suggestions
                .iter()
                .all(|s| matches!(s, Suggestion::SwitchRegime { .. }))
        );
    }

    #[test]
    fn suggests_switch_when_other_regime_is_cheaper() {
        let rules = TaxRules::india_illustrative();
        let calculator = TaxCalculator::new(&rules);
        let input = TaxInput::new(dec!(1000000), dec!(0), DeductionSet::default(), Regime::Old);

        let suggestions = calculator.suggest(&input).unwrap();

        assert_eq!(
            suggestions[0],
            Suggestion::SwitchRegime {
                to: Regime::New,
                saving: dec!(52500),
            }
        );
    }

    #[test]
    fn no_switch_when_already_on_better_regime() {
        let rules = TaxRules::india_illustrative();
        let calculator = TaxCalculator::new(&rules);
        let input = TaxInput::new(dec!(1000000), dec!(0), DeductionSet::default(), Regime::New);

        let suggestions = calculator.suggest(&input).unwrap();

        assert!(
            !suggestions
                .iter()
                .any(|s| matches!(s, Suggestion::SwitchRegime { .. }))
        );
    }

    #[test]
    fn display_reads_as_sentence() {
        let suggestion = Suggestion::CapHeadroom {
            code: DeductionCode::Section80C,
            remaining: dec!(100000),
            estimated_saving: dec!(5000),
        };

        assert_eq!(
            suggestion.to_string(),
            "Invest up to ₹100000 more under 80C (Section 80C (PPF, ELSS, life insurance)); \
             estimated saving ₹5000."
        );
    }

    #[test]
    fn display_rounds_half_rupees_up() {
        let switch = Suggestion::SwitchRegime {
            to: Regime::New,
            saving: dec!(2.5),
        };
        let headroom = Suggestion::CapHeadroom {
            code: DeductionCode::Nps,
            remaining: dec!(12000.50),
            estimated_saving: dec!(3600.5),
        };

        assert_eq!(switch.to_string(), "Switch to the new regime to pay ₹3 less tax.");
        assert!(
            headroom
                .to_string()
                .starts_with("Invest up to ₹12001 more under NPS"),
            "{headroom}"
        );
        assert!(headroom.to_string().ends_with("estimated saving ₹3601."), "{headroom}");
    }
}
