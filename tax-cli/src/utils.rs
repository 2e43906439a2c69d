use rust_decimal::Decimal;
use tax_core::{DeductionCode, DeductionSet, TaxError};
use thiserror::Error;

/// Error returned when a command-line value cannot be interpreted.
#[derive(Debug, Error)]
pub enum ParseArgError {
    #[error("invalid amount '{input}': {source}")]
    Decimal {
        input: String,
        #[source]
        source: rust_decimal::Error,
    },

    #[error("expected CODE=AMOUNT, got '{0}'")]
    MissingEquals(String),

    #[error("unknown deduction code '{0}' (expected one of 80C, 80D, HRA, home_loan, NPS, donations)")]
    UnknownCode(String),
}

/// Normalizes input for decimal parsing: trims whitespace and removes commas (thousands separator).
fn normalize_decimal_input(s: &str) -> String {
    s.trim().replace(',', "")
}

/// Parses a string into a [`Decimal`].
///
/// Handles comma as thousands separator (e.g. `"1,234.56"`) and a leading
/// `₹`. Empty or whitespace-only input is treated as 0.
pub fn parse_decimal(s: &str) -> Result<Decimal, ParseArgError> {
    let normalized = normalize_decimal_input(s);
    let normalized = normalized.strip_prefix('₹').unwrap_or(&normalized);
    if normalized.is_empty() {
        return Ok(Decimal::ZERO);
    }
    normalized.parse().map_err(|e| ParseArgError::Decimal {
        input: s.to_string(),
        source: e,
    })
}

/// A `CODE=AMOUNT` pair given on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeductionArg {
    pub code: DeductionCode,
    pub amount: Decimal,
}

/// Parses `CODE=AMOUNT`, e.g. `80C=1,50,000` or `NPS=-5000`.
///
/// The sign is kept; whether a negative amount is allowed is up to the
/// calculation it feeds.
pub fn parse_deduction_arg(s: &str) -> Result<DeductionArg, ParseArgError> {
    let (code, amount) = s
        .split_once('=')
        .ok_or_else(|| ParseArgError::MissingEquals(s.to_string()))?;
    let code = DeductionCode::parse(code)
        .ok_or_else(|| ParseArgError::UnknownCode(code.trim().to_string()))?;
    Ok(DeductionArg {
        code,
        amount: parse_decimal(amount)?,
    })
}

/// Folds repeated arguments into one set; repeated codes are summed.
pub fn deduction_set(args: &[DeductionArg]) -> Result<DeductionSet, TaxError> {
    DeductionSet::try_from_pairs(args.iter().map(|arg| (arg.code, arg.amount)))
}
