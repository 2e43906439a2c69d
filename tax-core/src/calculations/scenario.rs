//! What-if simulation on top of [`TaxCalculator`].
//!
//! A scenario adds deltas to a base input and recalculates. The base input
//! is never modified, and caps apply to the simulated amounts exactly as
//! they do to the originals: anything pushed over a cap is reported in
//! [`TaxResult::deductions_excess`].

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::calculations::TaxCalculator;
use crate::error::{TaxError, checked_add, ensure_non_negative};
use crate::models::{DeductionCode, DeductionSet, TaxInput, TaxResult};

/// Adjustments applied on top of a base input. Deltas may be negative.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScenarioDelta {
    #[serde(default)]
    pub income: Decimal,
    #[serde(default)]
    pub deductions: DeductionSet,
}

impl ScenarioDelta {
    pub fn income(delta: Decimal) -> Self {
        Self {
            income: delta,
            ..Default::default()
        }
    }

    pub fn deduction(
        code: DeductionCode,
        delta: Decimal,
    ) -> Self {
        Self {
            deductions: DeductionSet::default().with(code, delta),
            ..Default::default()
        }
    }

    pub fn is_zero(&self) -> bool {
        self.income.is_zero() && self.deductions.is_zero()
    }

    /// Returns a copy of `base` with the deltas applied.
    ///
    /// # Errors
    ///
    /// Returns [`TaxError::InvalidInput`] when a delta drives the simulated
    /// income or a deduction below zero or past `Decimal::MAX`.
    pub fn apply(
        &self,
        base: &TaxInput,
    ) -> Result<TaxInput, TaxError> {
        let mut simulated = base.clone();

        simulated.income = checked_add("simulated income", simulated.income, self.income)?;
        ensure_non_negative("simulated income", simulated.income)?;

        for (code, delta) in self.deductions.iter() {
            simulated.deductions.add(code, delta)?;
            ensure_non_negative(
                &format!("simulated deductions.{code}"),
                simulated.deductions.get(code),
            )?;
        }

        Ok(simulated)
    }
}

impl TaxCalculator<'_> {
    /// Recalculates `base` with `delta` applied.
    ///
    /// A zero delta yields exactly [`calculate`](TaxCalculator::calculate)
    /// on `base`.
    pub fn simulate_scenario(
        &self,
        base: &TaxInput,
        delta: &ScenarioDelta,
    ) -> Result<TaxResult, TaxError> {
        base.validate()?;
        let simulated = delta.apply(base)?;
        let result = self.calculate(&simulated)?;

        if result.has_excess() {
            debug!(
                excess = ?result.deductions_excess.total(),
                "simulated deductions exceed caps; excess ignored"
            );
        }

        Ok(result)
    }

    /// Liability change a scenario would produce (negative means less tax).
    pub fn scenario_impact(
        &self,
        base: &TaxInput,
        delta: &ScenarioDelta,
    ) -> Result<Decimal, TaxError> {
        let before = self.calculate(base)?;
        let after = self.simulate_scenario(base, delta)?;
        Ok(after.tax_liability - before.tax_liability)
    }
}
