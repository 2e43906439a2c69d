use std::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::models::{DeductionSet, Regime, RegimeBetter};

/// Output of a single calculation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaxResult {
    /// Regime the headline liability was computed under.
    pub regime: Regime,
    pub income: Decimal,
    pub expenses: Decimal,

    /// Deductions after caps.
    pub deductions_used: DeductionSet,
    /// Amount per code ignored because it exceeded the cap.
    pub deductions_excess: DeductionSet,
    pub total_deductions: Decimal,

    pub taxable_income: Decimal,
    pub tax_liability: Decimal,
    pub tax_liability_without_deductions: Decimal,
    pub tax_savings: Decimal,

    // Both regimes on the same taxable income
    pub old_regime_tax_liability: Decimal,
    pub new_regime_tax_liability: Decimal,
    pub regime_better: RegimeBetter,
}

impl TaxResult {
    pub fn liability_for(
        &self,
        regime: Regime,
    ) -> Decimal {
        match regime {
            Regime::Old => self.old_regime_tax_liability,
            Regime::New => self.new_regime_tax_liability,
        }
    }

    /// True when some deduction was clamped to its cap.
    pub fn has_excess(&self) -> bool {
        !self.deductions_excess.is_zero()
    }
}

impl fmt::Display for TaxResult {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        writeln!(f, "Regime:                   {}", self.regime)?;
        writeln!(f, "Income:                   {}", self.income)?;
        writeln!(f, "Expenses:                 {}", self.expenses)?;
        writeln!(f, "Deductions used:")?;
        for (code, amount) in self.deductions_used.iter() {
            let excess = self.deductions_excess.get(code);
            if excess.is_zero() {
                writeln!(f, "  {:<10}             {}", code.as_str(), amount)?;
            } else {
                writeln!(
                    f,
                    "  {:<10}             {} (capped, {} ignored)",
                    code.as_str(),
                    amount,
                    excess
                )?;
            }
        }
        writeln!(f, "Total deductions:         {}", self.total_deductions)?;
        writeln!(f, "Taxable income:           {}", self.taxable_income)?;
        writeln!(f, "Tax liability:            {}", self.tax_liability)?;
        writeln!(
            f,
            "Without deductions:       {}",
            self.tax_liability_without_deductions
        )?;
        writeln!(f, "Tax savings:              {}", self.tax_savings)?;
        writeln!(f, "Old regime liability:     {}", self.old_regime_tax_liability)?;
        writeln!(f, "New regime liability:     {}", self.new_regime_tax_liability)?;
        write!(f, "Better regime:            {}", self.regime_better)
    }
}
