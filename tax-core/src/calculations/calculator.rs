//! Progressive income tax with a two-regime comparison.
//!
//! # Calculation Steps
//!
//! | Step | Description |
//! |------|-------------|
//! | 1    | Clamp each deduction to its cap; record the excess |
//! | 2    | Total deductions (sum of clamped amounts) |
//! | 3    | Base income: income − expenses (policy) − standard deduction, min 0 |
//! | 4    | Taxable income: base income − total deductions, min 0 |
//! | 5    | Liability without deductions: slab tax on base income |
//! | 6    | Liability: slab tax on taxable income |
//! | 7    | Savings: step 5 − step 6 |
//! | 8    | Old and new regime liability on the taxable income |
//! | 9    | Better regime: strictly lower of step 8, else equal |
//!
//! # Example
//!
//! ```
//! use rust_decimal_macros::dec;
//! use tax_core::calculations::TaxCalculator;
//! use tax_core::{DeductionCode, DeductionSet, Regime, RegimeBetter, TaxInput, TaxRules};
//!
//! let rules = TaxRules::india_illustrative();
//! let calculator = TaxCalculator::new(&rules);
//!
//! let deductions = DeductionSet::default().with(DeductionCode::Section80C, dec!(150000));
//! let input = TaxInput::new(dec!(500000), dec!(200000), deductions, Regime::Old);
//!
//! let result = calculator.calculate(&input).unwrap();
//!
//! assert_eq!(result.taxable_income, dec!(150000));
//! assert_eq!(result.tax_liability, dec!(0));
//! assert_eq!(result.tax_liability_without_deductions, dec!(2500));
//! assert_eq!(result.regime_better, RegimeBetter::Equal);
//! ```

use rust_decimal::Decimal;
use tracing::debug;

use crate::calculations::common::{floor_zero, sub_floor_zero};
use crate::error::TaxError;
use crate::models::{DeductionSet, Regime, RegimeBetter, TaxInput, TaxResult, TaxRules};

/// Calculator over a borrowed rule set.
///
/// Holds no mutable state, so one instance can serve any number of
/// concurrent callers.
#[derive(Debug, Clone, Copy)]
pub struct TaxCalculator<'a> {
    rules: &'a TaxRules,
}

impl<'a> TaxCalculator<'a> {
    pub fn new(rules: &'a TaxRules) -> Self {
        Self { rules }
    }

    pub fn rules(&self) -> &'a TaxRules {
        self.rules
    }

    /// Runs every calculation step for `input`.
    ///
    /// # Errors
    ///
    /// Returns [`TaxError::InvalidInput`] when income, expenses or any
    /// deduction is negative, or when the capped deductions sum past
    /// `Decimal::MAX`. Deductions above their cap are clamped, not rejected.
    pub fn calculate(
        &self,
        input: &TaxInput,
    ) -> Result<TaxResult, TaxError> {
        input.validate()?;

        let (deductions_used, deductions_excess) = self.apply_caps(&input.deductions);
        let total_deductions = deductions_used.total()?;

        let base_income = self.base_income(input.income, input.expenses);
        let taxable_income = self.taxable_income(base_income, total_deductions);

        let tax_liability_without_deductions = self.progressive_tax(base_income, input.regime);
        let tax_liability = self.progressive_tax(taxable_income, input.regime);
        let tax_savings = tax_liability_without_deductions - tax_liability;

        let old_regime_tax_liability = self.progressive_tax(taxable_income, Regime::Old);
        let new_regime_tax_liability = self.progressive_tax(taxable_income, Regime::New);
        let regime_better =
            self.compare_regimes(old_regime_tax_liability, new_regime_tax_liability);

        debug!(
            regime = %input.regime,
            %taxable_income,
            %tax_liability,
            %regime_better,
            "calculated tax"
        );

        Ok(TaxResult {
            regime: input.regime,
            income: input.income,
            expenses: input.expenses,
            deductions_used,
            deductions_excess,
            total_deductions,
            taxable_income,
            tax_liability,
            tax_liability_without_deductions,
            tax_savings,
            old_regime_tax_liability,
            new_regime_tax_liability,
            regime_better,
        })
    }

    /// Same as [`calculate`](Self::calculate) but takes the regime as text,
    /// the way it arrives from forms and query strings.
    ///
    /// # Errors
    ///
    /// Returns [`TaxError::InvalidRegime`] for anything other than `old` or
    /// `new`; never falls back to a default regime.
    pub fn calculate_with_regime_str(
        &self,
        income: Decimal,
        expenses: Decimal,
        deductions: DeductionSet,
        regime: &str,
    ) -> Result<TaxResult, TaxError> {
        let regime = regime.parse::<Regime>()?;
        self.calculate(&TaxInput::new(income, expenses, deductions, regime))
    }

    /// Slab tax on `taxable_income` under `regime`.
    pub fn progressive_tax(
        &self,
        taxable_income: Decimal,
        regime: Regime,
    ) -> Decimal {
        self.rules.slabs(regime).tax_by_base(taxable_income)
    }

    /// Clamps each deduction to its cap.
    ///
    /// Returns `(used, excess)` with `used + excess == requested` per code.
    fn apply_caps(
        &self,
        requested: &DeductionSet,
    ) -> (DeductionSet, DeductionSet) {
        let mut used = DeductionSet::default();
        let mut excess = DeductionSet::default();
        for (code, amount) in requested.iter() {
            let (allowed, over) = self.rules.caps.clamp(code, amount);
            if !over.is_zero() {
                debug!(%code, requested = %amount, %allowed, "deduction clamped to cap");
            }
            used.set(code, allowed);
            excess.set(code, over);
        }
        (used, excess)
    }

    /// Income before itemized deductions.
    fn base_income(
        &self,
        income: Decimal,
        expenses: Decimal,
    ) -> Decimal {
        let policy = &self.rules.policy;
        let after_expenses = if policy.subtract_expenses {
            income - expenses
        } else {
            income
        };
        floor_zero(after_expenses - policy.standard_deduction)
    }

    fn taxable_income(
        &self,
        base_income: Decimal,
        total_deductions: Decimal,
    ) -> Decimal {
        sub_floor_zero(base_income, total_deductions)
    }

    fn compare_regimes(
        &self,
        old: Decimal,
        new: Decimal,
    ) -> RegimeBetter {
        match old.cmp(&new) {
            std::cmp::Ordering::Less => RegimeBetter::Old,
            std::cmp::Ordering::Greater => RegimeBetter::New,
            std::cmp::Ordering::Equal => RegimeBetter::Equal,
        }
    }
}
