use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::{TaxError, ensure_non_negative};
use crate::models::{DeductionSet, Regime};

/// The filer's numbers for one calculation. Built per request, never stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaxInput {
    pub income: Decimal,
    pub expenses: Decimal,
    #[serde(default)]
    pub deductions: DeductionSet,
    pub regime: Regime,
}

impl TaxInput {
    pub fn new(
        income: Decimal,
        expenses: Decimal,
        deductions: DeductionSet,
        regime: Regime,
    ) -> Self {
        Self {
            income,
            expenses,
            deductions,
            regime,
        }
    }

    /// Rejects negative income, expenses or deduction amounts.
    pub fn validate(&self) -> Result<(), TaxError> {
        ensure_non_negative("income", self.income)?;
        ensure_non_negative("expenses", self.expenses)?;
        for (code, amount) in self.deductions.iter() {
            ensure_non_negative(&format!("deductions.{code}"), amount)?;
        }
        Ok(())
    }
}
