use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::{TaxError, ensure_non_negative};
use crate::models::{DeductionCaps, DeductionCode, Regime, SlabTable, TaxSlab};

/// Jurisdiction-specific knobs that are not slab tables or caps.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaxPolicy {
    /// Whether `expenses` reduce taxable income.
    #[serde(default = "default_subtract_expenses")]
    pub subtract_expenses: bool,

    /// Flat amount taken off income before any itemized deduction.
    #[serde(default)]
    pub standard_deduction: Decimal,
}

fn default_subtract_expenses() -> bool {
    true
}

impl Default for TaxPolicy {
    fn default() -> Self {
        Self {
            subtract_expenses: default_subtract_expenses(),
            standard_deduction: Decimal::ZERO,
        }
    }
}

/// Everything the calculator needs besides the filer's own numbers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaxRules {
    pub name: String,
    #[serde(default)]
    pub policy: TaxPolicy,
    #[serde(default)]
    pub caps: DeductionCaps,
    pub old_regime: SlabTable,
    pub new_regime: SlabTable,
}

impl TaxRules {
    /// The illustrative two-regime India tables.
    ///
    /// | Regime | Slabs |
    /// |--------|-------|
    /// | old    | 0–2.5L @0%, 2.5L–5L @5%, 5L–10L @20%, >10L @30% |
    /// | new    | 0–3L @0%, 3L–6L @5%, 6L–9L @10%, 9L–12L @15%, 12L–15L @20%, >15L @30% |
    pub fn india_illustrative() -> Self {
        let slab = |lower: i64, upper: Option<i64>, percent: i64| {
            TaxSlab::new(
                Decimal::from(lower),
                upper.map(Decimal::from),
                Decimal::new(percent, 2),
            )
        };

        Self {
            name: "India (illustrative)".to_string(),
            policy: TaxPolicy::default(),
            caps: DeductionCaps::india_illustrative(),
            old_regime: SlabTable::from_validated(vec![
                slab(0, Some(250_000), 0),
                slab(250_000, Some(500_000), 5),
                slab(500_000, Some(1_000_000), 20),
                slab(1_000_000, None, 30),
            ]),
            new_regime: SlabTable::from_validated(vec![
                slab(0, Some(300_000), 0),
                slab(300_000, Some(600_000), 5),
                slab(600_000, Some(900_000), 10),
                slab(900_000, Some(1_200_000), 15),
                slab(1_200_000, Some(1_500_000), 20),
                slab(1_500_000, None, 30),
            ]),
        }
    }

    pub fn slabs(
        &self,
        regime: Regime,
    ) -> &SlabTable {
        match regime {
            Regime::Old => &self.old_regime,
            Regime::New => &self.new_regime,
        }
    }

    pub fn slabs_mut(
        &mut self,
        regime: Regime,
    ) -> &mut SlabTable {
        match regime {
            Regime::Old => &mut self.old_regime,
            Regime::New => &mut self.new_regime,
        }
    }

    /// Checks the parts serde cannot: caps and the standard deduction must
    /// be non-negative. Slab tables validate themselves on construction.
    pub fn validate(&self) -> Result<(), TaxError> {
        ensure_non_negative("policy.standard_deduction", self.policy.standard_deduction)?;
        for code in DeductionCode::ALL {
            if let Some(cap) = self.caps.get(code) {
                ensure_non_negative(&format!("caps.{code}"), cap)?;
            }
        }
        Ok(())
    }
}

impl Default for TaxRules {
    fn default() -> Self {
        Self::india_illustrative()
    }
}
