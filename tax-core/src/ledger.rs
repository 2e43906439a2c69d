//! Aggregation of raw ledger entries into calculator input.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{TaxError, checked_add, ensure_non_negative};
use crate::models::{DeductionCode, DeductionEntry, DeductionSet, Period, Regime, TaxInput, Transaction};

/// Income, expenses and claimed deductions for one period.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerSummary {
    pub period: Period,
    pub income: Decimal,
    pub expenses: Decimal,
    /// Raw claimed amounts; caps are applied later by the calculator.
    pub deductions: DeductionSet,
    /// Deduction entries skipped because their code is not recognised.
    pub ignored_entries: usize,
}

impl LedgerSummary {
    /// Sums the entries dated inside `period`.
    ///
    /// Positive transaction amounts count as income and negative ones as
    /// expenses. Deduction entries with unknown codes are skipped and
    /// counted.
    ///
    /// # Errors
    ///
    /// Returns [`TaxError::InvalidInput`] for a negative deduction entry or
    /// when a running total overflows.
    pub fn build(
        period: Period,
        transactions: &[Transaction],
        entries: &[DeductionEntry],
    ) -> Result<Self, TaxError> {
        let mut income = Decimal::ZERO;
        let mut expenses = Decimal::ZERO;
        for tx in transactions.iter().filter(|tx| period.contains(tx.date)) {
            if tx.amount > Decimal::ZERO {
                income = checked_add("income", income, tx.amount)?;
            } else {
                expenses = checked_add("expenses", expenses, tx.amount.abs())?;
            }
        }

        let mut deductions = DeductionSet::default();
        let mut ignored_entries = 0;
        for entry in entries.iter().filter(|e| period.contains(e.date)) {
            ensure_non_negative(&format!("deduction entry {}", entry.code), entry.amount)?;
            match DeductionCode::parse(&entry.code) {
                Some(code) => deductions.add(code, entry.amount)?,
                None => {
                    warn!(code = %entry.code, date = %entry.date, "ignoring unknown deduction code");
                    ignored_entries += 1;
                }
            }
        }

        Ok(Self {
            period,
            income,
            expenses,
            deductions,
            ignored_entries,
        })
    }

    pub fn net(&self) -> Decimal {
        self.income - self.expenses
    }

    pub fn to_input(
        &self,
        regime: Regime,
    ) -> TaxInput {
        TaxInput::new(self.income, self.expenses, self.deductions, regime)
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    use super::*;

    fn tx(
        date: &str,
        amount: Decimal,
    ) -> Transaction {
        Transaction {
            date: date.parse::<NaiveDate>().unwrap(),
            description: "test".to_string(),
            amount,
            category: None,
        }
    }

    fn entry(
        date: &str,
        code: &str,
        amount: Decimal,
    ) -> DeductionEntry {
        DeductionEntry {
            date: date.parse::<NaiveDate>().unwrap(),
            code: code.to_string(),
            amount,
        }
    }

    #[test]
    fn build_splits_income_and_expenses_by_sign() {
        let fy = Period::financial_year(2024).unwrap();
        let transactions = vec![
            tx("2024-04-30", dec!(500000)),
            tx("2024-06-01", dec!(150000)),
            tx("2024-07-15", dec!(-20000)),
        ];

        let summary = LedgerSummary::build(fy, &transactions, &[]).unwrap();

        assert_eq!(summary.income, dec!(650000));
        assert_eq!(summary.expenses, dec!(20000));
        assert_eq!(summary.net(), dec!(630000));
    }

    #[test]
    fn build_filters_by_period() {
        let fy = Period::financial_year(2024).unwrap();
        let transactions = vec![
            tx("2024-03-31", dec!(1000)),
            tx("2024-04-01", dec!(2000)),
            tx("2025-04-01", dec!(4000)),
        ];
        let entries = vec![
            entry("2024-01-10", "80C", dec!(10000)),
            entry("2025-01-10", "80C", dec!(20000)),
        ];

        let summary = LedgerSummary::build(fy, &transactions, &entries).unwrap();

        assert_eq!(summary.income, dec!(2000));
        assert_eq!(summary.deductions.section_80c, dec!(20000));
    }

    #[test]
    fn build_sums_deductions_without_capping() {
        let fy = Period::financial_year(2024).unwrap();
        let entries = vec![
            entry("2024-05-01", "80C", dec!(80000)),
            entry("2024-06-01", "80C", dec!(70000)),
            entry("2024-07-01", "80C", dec!(20000)),
            entry("2024-08-01", "HRA", dec!(60000)),
        ];

        let summary = LedgerSummary::build(fy, &[], &entries).unwrap();

        assert_eq!(summary.deductions.section_80c, dec!(170000));
        assert_eq!(summary.deductions.hra, dec!(60000));
    }

    #[test]
    fn build_counts_unknown_codes() {
        let fy = Period::financial_year(2024).unwrap();
        let entries = vec![
            entry("2024-05-01", "PPF", dec!(80000)),
            entry("2024-05-02", "NPS", dec!(40000)),
        ];

        let summary = LedgerSummary::build(fy, &[], &entries).unwrap();

        assert_eq!(summary.ignored_entries, 1);
        assert_eq!(summary.deductions.total(), Ok(dec!(40000)));
    }

    #[test]
    fn build_rejects_negative_deduction_entry() {
        let fy = Period::financial_year(2024).unwrap();
        let entries = vec![entry("2024-05-01", "80D", dec!(-1))];

        let result = LedgerSummary::build(fy, &[], &entries);

        assert_eq!(
            result,
            Err(TaxError::negative("deduction entry 80D", dec!(-1)))
        );
    }

    #[test]
    fn build_rejects_totals_past_max() {
        let fy = Period::financial_year(2024).unwrap();
        let transactions = vec![tx("2024-05-01", Decimal::MAX), tx("2024-06-01", dec!(1))];
        let entries = vec![
            entry("2024-05-01", "donations", Decimal::MAX),
            entry("2024-06-01", "donations", dec!(1)),
        ];

        assert_eq!(
            LedgerSummary::build(fy, &transactions, &[]),
            Err(TaxError::too_large("income"))
        );
        assert_eq!(
            LedgerSummary::build(fy, &[], &entries),
            Err(TaxError::too_large("deductions.donations"))
        );
    }

    #[test]
    fn to_input_carries_raw_amounts() {
        let fy = Period::financial_year(2024).unwrap();
        let transactions = vec![tx("2024-05-01", dec!(500000)), tx("2024-05-02", dec!(-200000))];
        let entries = vec![entry("2024-05-03", "80C", dec!(150000))];
        let summary = LedgerSummary::build(fy, &transactions, &entries).unwrap();

        let input = summary.to_input(Regime::Old);

        assert_eq!(input.income, dec!(500000));
        assert_eq!(input.expenses, dec!(200000));
        assert_eq!(input.deductions.section_80c, dec!(150000));
        assert_eq!(input.regime, Regime::Old);
    }
}
