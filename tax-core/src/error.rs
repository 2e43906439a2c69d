use rust_decimal::Decimal;
use thiserror::Error;

/// Errors raised by the calculator and by model validation.
///
/// Every variant is a local, synchronous failure; nothing here is retryable.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TaxError {
    /// An input value is out of range (negative amounts, bad periods, ...).
    #[error("invalid input for {field}: {reason}")]
    InvalidInput { field: String, reason: String },

    /// A regime string was neither `old` nor `new`.
    #[error("unknown regime '{0}' (expected 'old' or 'new')")]
    InvalidRegime(String),

    /// A slab table failed structural validation.
    #[error("invalid slab table: {0}")]
    InvalidSlabTable(String),
}

impl TaxError {
    pub fn invalid_input(
        field: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self::InvalidInput {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Shorthand for the most common validation failure.
    pub fn negative(
        field: impl Into<String>,
        value: Decimal,
    ) -> Self {
        Self::invalid_input(field, format!("must not be negative (got {value})"))
    }

    pub fn too_large(field: impl Into<String>) -> Self {
        Self::invalid_input(field, "amount too large")
    }
}

/// Rejects a negative amount, naming the offending field.
pub fn ensure_non_negative(
    field: &str,
    value: Decimal,
) -> Result<(), TaxError> {
    if value.is_sign_negative() && !value.is_zero() {
        return Err(TaxError::negative(field, value));
    }
    Ok(())
}

/// `a + b`, or [`TaxError::too_large`] naming `field` when the sum does not
/// fit in a `Decimal`.
pub fn checked_add(
    field: &str,
    a: Decimal,
    b: Decimal,
) -> Result<Decimal, TaxError> {
    a.checked_add(b).ok_or_else(|| TaxError::too_large(field))
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    use super::*;

    #[test]
    fn ensure_non_negative_accepts_zero_and_positive() {
        assert_eq!(ensure_non_negative("income", dec!(0)), Ok(()));
        assert_eq!(ensure_non_negative("income", dec!(-0.00)), Ok(()));
        assert_eq!(ensure_non_negative("income", dec!(10.50)), Ok(()));
    }

    #[test]
    fn ensure_non_negative_names_the_field() {
        let err = ensure_non_negative("expenses", dec!(-1)).unwrap_err();

        assert_eq!(
            err.to_string(),
            "invalid input for expenses: must not be negative (got -1)"
        );
    }

    #[test]
    fn checked_add_reports_overflow_by_field() {
        assert_eq!(checked_add("income", dec!(1), dec!(2)), Ok(dec!(3)));

        let err = checked_add("income", Decimal::MAX, dec!(1)).unwrap_err();

        assert_eq!(
            err.to_string(),
            "invalid input for income: amount too large"
        );
    }
}
