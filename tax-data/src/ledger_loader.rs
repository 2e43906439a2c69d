//! CSV loaders for ledger data.
//!
//! ## Transactions
//!
//! | Column        | Required | Type    | Notes                                   |
//! |---------------|----------|---------|-----------------------------------------|
//! | `date`        | yes      | date    | ISO `YYYY-MM-DD`                        |
//! | `description` | yes      | string  |                                         |
//! | `amount`      | yes      | decimal | positive = income, negative = expense   |
//! | `category`    | no       | string  | Leave cell empty (or drop the column)   |
//!
//! ## Deduction entries
//!
//! | Column   | Required | Type    | Notes                                                 |
//! |----------|----------|---------|-------------------------------------------------------|
//! | `date`   | yes      | date    | ISO `YYYY-MM-DD`                                      |
//! | `code`   | yes      | string  | `80C`, `80D`, `HRA`, `home_loan`, `NPS`, `donations`  |
//! | `amount` | yes      | decimal | must not be negative                                  |
//!
//! Headers are matched by name, so column order does not matter. Values are
//! trimmed. Unknown deduction codes are kept here and skipped during
//! aggregation.
//!
//! ```csv
//! date,description,amount,category
//! 2024-04-30,Salary,85000.00,income
//! 2024-05-02,Rent,-20000.00,housing
//! ```

use std::path::Path;

use rust_decimal::Decimal;
use serde::de::DeserializeOwned;
use tax_core::{DeductionEntry, Transaction};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LedgerLoadError {
    /// Bad structure, missing column, unparsable date or amount.
    #[error("CSV parse error: {0}")]
    Parse(#[from] csv::Error),

    /// A deduction row carried a negative amount. `row` is 1-based.
    #[error("negative deduction amount {amount} on row {row}")]
    NegativeDeduction { amount: Decimal, row: usize },

    #[error("cannot read '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

fn reader(input: &str) -> csv::Reader<&[u8]> {
    csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .flexible(false)
        .from_reader(input.as_bytes())
}

fn deserialize_all<T: DeserializeOwned>(input: &str) -> Result<Vec<T>, LedgerLoadError> {
    reader(input)
        .deserialize::<T>()
        .map(|row| row.map_err(LedgerLoadError::from))
        .collect()
}

/// Parse transactions from CSV text, in file order.
pub fn load_transactions_from_str(input: &str) -> Result<Vec<Transaction>, LedgerLoadError> {
    let mut transactions: Vec<Transaction> = deserialize_all(input)?;
    for tx in &mut transactions {
        if tx.category.as_deref().is_some_and(|c| c.is_empty()) {
            tx.category = None;
        }
    }
    Ok(transactions)
}

/// Parse deduction entries from CSV text, in file order.
///
/// # Errors
///
/// * [`LedgerLoadError::Parse`] for structural or type errors.
/// * [`LedgerLoadError::NegativeDeduction`] when an amount is below zero.
pub fn load_deductions_from_str(input: &str) -> Result<Vec<DeductionEntry>, LedgerLoadError> {
    let entries: Vec<DeductionEntry> = deserialize_all(input)?;
    if let Some((idx, entry)) = entries
        .iter()
        .enumerate()
        .find(|(_, e)| e.amount < Decimal::ZERO)
    {
        return Err(LedgerLoadError::NegativeDeduction {
            amount: entry.amount,
            row: idx + 1,
        });
    }
    Ok(entries)
}

fn read_file(path: &Path) -> Result<String, LedgerLoadError> {
    std::fs::read_to_string(path).map_err(|source| LedgerLoadError::Io {
        path: path.display().to_string(),
        source,
    })
}

/// Read a transactions file and delegate to [`load_transactions_from_str`].
pub fn load_transactions_from_file(path: &Path) -> Result<Vec<Transaction>, LedgerLoadError> {
    load_transactions_from_str(&read_file(path)?)
}

/// Read a deductions file and delegate to [`load_deductions_from_str`].
pub fn load_deductions_from_file(path: &Path) -> Result<Vec<DeductionEntry>, LedgerLoadError> {
    load_deductions_from_str(&read_file(path)?)
}
