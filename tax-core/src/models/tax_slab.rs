use std::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::calculations::common::round_half_up;
use crate::error::TaxError;

/// An income range taxed at a fixed marginal rate.
///
/// `rate` is a fraction (`0.05` is 5%). `upper: None` marks the open-ended
/// top slab.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaxSlab {
    pub lower: Decimal,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub upper: Option<Decimal>,
    pub rate: Decimal,
}

impl TaxSlab {
    pub fn new(
        lower: Decimal,
        upper: Option<Decimal>,
        rate: Decimal,
    ) -> Self {
        Self { lower, upper, rate }
    }

    /// Width of the slab, `None` when unbounded.
    pub fn width(&self) -> Option<Decimal> {
        self.upper.map(|upper| upper - self.lower)
    }
}

/// A validated, ordered slab table covering `[0, ∞)`.
///
/// Construction checks that the slabs start at zero, are contiguous with
/// strictly increasing bounds, and end with a single unbounded slab. The
/// tax accumulated below each slab's lower bound is precomputed so the
/// closed form needs one lookup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<TaxSlab>", into = "Vec<TaxSlab>")]
pub struct SlabTable {
    slabs: Vec<TaxSlab>,
    base_taxes: Vec<Decimal>,
}

impl SlabTable {
    /// Validates `slabs` and builds the table.
    ///
    /// # Errors
    ///
    /// Returns [`TaxError::InvalidSlabTable`] describing the first rule the
    /// slabs break.
    pub fn new(slabs: Vec<TaxSlab>) -> Result<Self, TaxError> {
        validate(&slabs)?;
        Ok(Self::from_validated(slabs))
    }

    /// Builds a table from slabs already known to be well formed.
    pub(crate) fn from_validated(slabs: Vec<TaxSlab>) -> Self {
        let mut base_taxes = Vec::with_capacity(slabs.len());
        let mut accumulated = Decimal::ZERO;
        for slab in &slabs {
            base_taxes.push(accumulated);
            if let Some(width) = slab.width() {
                accumulated += width * slab.rate;
            }
        }
        Self { slabs, base_taxes }
    }

    pub fn slabs(&self) -> &[TaxSlab] {
        &self.slabs
    }

    /// Tax owed on everything below `slabs()[index].lower`.
    pub fn base_tax(
        &self,
        index: usize,
    ) -> Option<Decimal> {
        self.base_taxes.get(index).copied()
    }

    /// Index of the slab `income` falls into, walking thresholds top-down.
    /// `None` when income is zero or negative.
    pub fn slab_index(
        &self,
        income: Decimal,
    ) -> Option<usize> {
        if income <= Decimal::ZERO {
            return None;
        }
        self.slabs.iter().rposition(|slab| slab.lower < income)
    }

    /// Marginal rate applied to the last unit of `income`.
    pub fn marginal_rate(
        &self,
        income: Decimal,
    ) -> Decimal {
        self.slab_index(income)
            .map(|i| self.slabs[i].rate)
            .unwrap_or(Decimal::ZERO)
    }

    /// Closed form: base tax of the matching slab plus the marginal part.
    pub fn tax_by_base(
        &self,
        income: Decimal,
    ) -> Decimal {
        let Some(index) = self.slab_index(income) else {
            return Decimal::ZERO;
        };
        let slab = &self.slabs[index];
        round_half_up(self.base_taxes[index] + (income - slab.lower) * slab.rate)
    }

    /// Sums the tax on the portion of `income` inside each slab.
    pub fn tax_by_portions(
        &self,
        income: Decimal,
    ) -> Decimal {
        if income <= Decimal::ZERO {
            return Decimal::ZERO;
        }
        let tax: Decimal = self
            .slabs
            .iter()
            .filter(|slab| slab.lower < income)
            .map(|slab| {
                let top = slab.upper.map_or(income, |upper| upper.min(income));
                (top - slab.lower.max(Decimal::ZERO)) * slab.rate
            })
            .sum();
        round_half_up(tax)
    }
}

impl TryFrom<Vec<TaxSlab>> for SlabTable {
    type Error = TaxError;

    fn try_from(slabs: Vec<TaxSlab>) -> Result<Self, Self::Error> {
        Self::new(slabs)
    }
}

impl From<SlabTable> for Vec<TaxSlab> {
    fn from(table: SlabTable) -> Self {
        table.slabs
    }
}

/// One line per slab: `lower - upper  rate%`, with `and above` for the top
/// slab.
impl fmt::Display for SlabTable {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        for (i, slab) in self.slabs.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            let upper = slab
                .upper
                .map_or_else(|| "and above".to_string(), |u| u.to_string());
            write!(
                f,
                "{:>12} - {:<12} {:>5}%",
                slab.lower,
                upper,
                (slab.rate * Decimal::ONE_HUNDRED).normalize()
            )?;
        }
        Ok(())
    }
}

fn validate(slabs: &[TaxSlab]) -> Result<(), TaxError> {
    let invalid = |msg: String| Err(TaxError::InvalidSlabTable(msg));

    let Some(first) = slabs.first() else {
        return invalid("no slabs provided".to_string());
    };
    if !first.lower.is_zero() {
        return invalid(format!("first slab must start at 0, starts at {}", first.lower));
    }

    let last_index = slabs.len() - 1;
    for (i, slab) in slabs.iter().enumerate() {
        if slab.rate < Decimal::ZERO || slab.rate > Decimal::ONE {
            return invalid(format!("slab {i} rate {} is outside [0, 1]", slab.rate));
        }
        match slab.upper {
            None if i != last_index => {
                return invalid(format!("slab {i} is unbounded but is not the last slab"));
            }
            None => {}
            Some(_) if i == last_index => {
                return invalid(format!("last slab {i} must be unbounded"));
            }
            Some(upper) => {
                if upper <= slab.lower {
                    return invalid(format!(
                        "slab {i} upper bound {upper} must exceed lower bound {}",
                        slab.lower
                    ));
                }
                let next = &slabs[i + 1];
                if next.lower != upper {
                    return invalid(format!(
                        "slab {} starts at {} but slab {i} ends at {upper}",
                        i + 1,
                        next.lower
                    ));
                }
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    use super::*;

    fn old_regime_slabs() -> Vec<TaxSlab> {
        vec![
            TaxSlab::new(dec!(0), Some(dec!(250000)), dec!(0)),
            TaxSlab::new(dec!(250000), Some(dec!(500000)), dec!(0.05)),
            TaxSlab::new(dec!(500000), Some(dec!(1000000)), dec!(0.20)),
            TaxSlab::new(dec!(1000000), None, dec!(0.30)),
        ]
    }

    // =========================================================================
    // validation tests
    // =========================================================================

    #[test]
    fn new_accepts_well_formed_table() {
        let table = SlabTable::new(old_regime_slabs()).unwrap();

        assert_eq!(table.slabs().len(), 4);
    }

    #[test]
    fn new_rejects_empty_table() {
        let result = SlabTable::new(vec![]);

        assert_eq!(
            result,
            Err(TaxError::InvalidSlabTable("no slabs provided".to_string()))
        );
    }

    #[test]
    fn new_rejects_table_not_starting_at_zero() {
        let mut slabs = old_regime_slabs();
        slabs[0].lower = dec!(100);

        assert!(SlabTable::new(slabs).is_err());
    }

    #[test]
    fn new_rejects_gap_between_slabs() {
        let mut slabs = old_regime_slabs();
        slabs[2].lower = dec!(510000);

        let err = SlabTable::new(slabs).unwrap_err();

        assert_eq!(
            err,
            TaxError::InvalidSlabTable(
                "slab 2 starts at 510000 but slab 1 ends at 500000".to_string()
            )
        );
    }

    #[test]
    fn new_rejects_overlapping_slabs() {
        let mut slabs = old_regime_slabs();
        slabs[2].lower = dec!(400000);

        assert!(SlabTable::new(slabs).is_err());
    }

    #[test]
    fn new_rejects_non_increasing_bounds() {
        let slabs = vec![
            TaxSlab::new(dec!(0), Some(dec!(0)), dec!(0)),
            TaxSlab::new(dec!(0), None, dec!(0.10)),
        ];

        assert!(SlabTable::new(slabs).is_err());
    }

    #[test]
    fn new_rejects_bounded_last_slab() {
        let mut slabs = old_regime_slabs();
        slabs[3].upper = Some(dec!(2000000));

        assert!(SlabTable::new(slabs).is_err());
    }

    #[test]
    fn new_rejects_unbounded_middle_slab() {
        let mut slabs = old_regime_slabs();
        slabs[1].upper = None;

        assert!(SlabTable::new(slabs).is_err());
    }

    #[test]
    fn new_rejects_rate_outside_unit_interval() {
        let mut slabs = old_regime_slabs();
        slabs[3].rate = dec!(30);

        assert!(SlabTable::new(slabs).is_err());
    }

    // =========================================================================
    // base tax tests
    // =========================================================================

    #[test]
    fn base_taxes_accumulate_full_slabs() {
        let table = SlabTable::new(old_regime_slabs()).unwrap();

        assert_eq!(table.base_tax(0), Some(dec!(0)));
        assert_eq!(table.base_tax(1), Some(dec!(0)));
        assert_eq!(table.base_tax(2), Some(dec!(12500)));
        assert_eq!(table.base_tax(3), Some(dec!(112500)));
        assert_eq!(table.base_tax(4), None);
    }

    // =========================================================================
    // tax evaluation tests
    // =========================================================================

    #[test]
    fn zero_income_owes_nothing() {
        let table = SlabTable::new(old_regime_slabs()).unwrap();

        assert_eq!(table.tax_by_base(dec!(0)), dec!(0));
        assert_eq!(table.tax_by_portions(dec!(0)), dec!(0));
    }

    #[test]
    fn negative_income_owes_nothing() {
        let table = SlabTable::new(old_regime_slabs()).unwrap();

        assert_eq!(table.tax_by_base(dec!(-5000)), dec!(0));
        assert_eq!(table.tax_by_portions(dec!(-5000)), dec!(0));
    }

    #[test]
    fn income_at_slab_boundary_uses_lower_slab() {
        let table = SlabTable::new(old_regime_slabs()).unwrap();

        assert_eq!(table.slab_index(dec!(500000)), Some(1));
        assert_eq!(table.tax_by_base(dec!(500000)), dec!(12500));
    }

    #[test]
    fn both_formulations_agree_in_each_slab() {
        let table = SlabTable::new(old_regime_slabs()).unwrap();

        for income in [
            dec!(1),
            dec!(250000),
            dec!(250001),
            dec!(600000),
            dec!(1000000),
            dec!(2500000.55),
        ] {
            assert_eq!(
                table.tax_by_base(income),
                table.tax_by_portions(income),
                "formulations disagree at {income}"
            );
        }
    }

    #[test]
    fn top_slab_taxes_marginal_income() {
        let table = SlabTable::new(old_regime_slabs()).unwrap();

        // 112500 + 500000 * 0.30
        assert_eq!(table.tax_by_base(dec!(1500000)), dec!(262500));
    }

    #[test]
    fn marginal_rate_tracks_slab() {
        let table = SlabTable::new(old_regime_slabs()).unwrap();

        assert_eq!(table.marginal_rate(dec!(0)), dec!(0));
        assert_eq!(table.marginal_rate(dec!(300000)), dec!(0.05));
        assert_eq!(table.marginal_rate(dec!(5000000)), dec!(0.30));
    }

    // =========================================================================
    // serde tests
    // =========================================================================

    #[test]
    fn deserialize_validates_table() {
        let json = r#"[{"lower": "0", "upper": "100", "rate": "0"},
                       {"lower": "150", "rate": "0.1"}]"#;

        let result: Result<SlabTable, _> = serde_json::from_str(json);

        let err = result.unwrap_err().to_string();
        assert!(err.contains("invalid slab table"), "unexpected error: {err}");
    }

    #[test]
    fn deserialize_builds_base_taxes() {
        let json = r#"[{"lower": "0", "upper": "100", "rate": "0.1"},
                       {"lower": "100", "rate": "0.2"}]"#;

        let table: SlabTable = serde_json::from_str(json).unwrap();

        assert_eq!(table.base_tax(1), Some(dec!(10)));
        assert_eq!(table.tax_by_base(dec!(150)), dec!(20));
    }

    #[test]
    fn display_lists_one_line_per_slab() {
        let table = SlabTable::new(old_regime_slabs()).unwrap();

        let text = table.to_string();
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines.len(), 4);
        assert!(lines[1].contains("250000") && lines[1].trim_end().ends_with("5%"));
        assert!(lines[3].contains("and above"));
        assert!(lines[3].trim_end().ends_with("30%"));
    }
}
