use std::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::{TaxError, checked_add};

/// The fixed set of itemized deductions the calculator understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum DeductionCode {
    #[serde(rename = "80C")]
    Section80C,
    #[serde(rename = "80D")]
    Section80D,
    #[serde(rename = "HRA")]
    Hra,
    #[serde(rename = "home_loan")]
    HomeLoan,
    #[serde(rename = "NPS")]
    Nps,
    #[serde(rename = "donations")]
    Donations,
}

impl DeductionCode {
    /// Every code, in canonical order.
    pub const ALL: [DeductionCode; 6] = [
        DeductionCode::Section80C,
        DeductionCode::Section80D,
        DeductionCode::Hra,
        DeductionCode::HomeLoan,
        DeductionCode::Nps,
        DeductionCode::Donations,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Section80C => "80C",
            Self::Section80D => "80D",
            Self::Hra => "HRA",
            Self::HomeLoan => "home_loan",
            Self::Nps => "NPS",
            Self::Donations => "donations",
        }
    }

    /// Parses a wire code. Matching is exact apart from surrounding
    /// whitespace; unknown codes yield `None`.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim() {
            "80C" => Some(Self::Section80C),
            "80D" => Some(Self::Section80D),
            "HRA" => Some(Self::Hra),
            "home_loan" => Some(Self::HomeLoan),
            "NPS" => Some(Self::Nps),
            "donations" => Some(Self::Donations),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Section80C => "Section 80C (PPF, ELSS, life insurance)",
            Self::Section80D => "Section 80D (health insurance)",
            Self::Hra => "House rent allowance",
            Self::HomeLoan => "Home loan interest",
            Self::Nps => "NPS contributions (80CCD(1B))",
            Self::Donations => "Charitable donations",
        }
    }
}

impl fmt::Display for DeductionCode {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One amount per [`DeductionCode`].
///
/// Serializes as a map keyed by the wire codes. Missing keys read as zero
/// and unknown keys are ignored.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeductionSet {
    #[serde(rename = "80C")]
    pub section_80c: Decimal,
    #[serde(rename = "80D")]
    pub section_80d: Decimal,
    #[serde(rename = "HRA")]
    pub hra: Decimal,
    pub home_loan: Decimal,
    #[serde(rename = "NPS")]
    pub nps: Decimal,
    pub donations: Decimal,
}

impl DeductionSet {
    pub fn get(
        &self,
        code: DeductionCode,
    ) -> Decimal {
        match code {
            DeductionCode::Section80C => self.section_80c,
            DeductionCode::Section80D => self.section_80d,
            DeductionCode::Hra => self.hra,
            DeductionCode::HomeLoan => self.home_loan,
            DeductionCode::Nps => self.nps,
            DeductionCode::Donations => self.donations,
        }
    }

    fn slot(
        &mut self,
        code: DeductionCode,
    ) -> &mut Decimal {
        match code {
            DeductionCode::Section80C => &mut self.section_80c,
            DeductionCode::Section80D => &mut self.section_80d,
            DeductionCode::Hra => &mut self.hra,
            DeductionCode::HomeLoan => &mut self.home_loan,
            DeductionCode::Nps => &mut self.nps,
            DeductionCode::Donations => &mut self.donations,
        }
    }

    pub fn set(
        &mut self,
        code: DeductionCode,
        amount: Decimal,
    ) {
        *self.slot(code) = amount;
    }

    /// Adds `amount` to `code`.
    ///
    /// # Errors
    ///
    /// Returns [`TaxError::InvalidInput`] for `deductions.{code}` when the
    /// sum overflows; the set is left unchanged.
    pub fn add(
        &mut self,
        code: DeductionCode,
        amount: Decimal,
    ) -> Result<(), TaxError> {
        let slot = self.slot(code);
        *slot = checked_add(&format!("deductions.{code}"), *slot, amount)?;
        Ok(())
    }

    /// Sums `(code, amount)` pairs; repeated codes are added together.
    pub fn try_from_pairs<I>(pairs: I) -> Result<Self, TaxError>
    where
        I: IntoIterator<Item = (DeductionCode, Decimal)>,
    {
        let mut set = DeductionSet::default();
        for (code, amount) in pairs {
            set.add(code, amount)?;
        }
        Ok(set)
    }

    /// Builder-style [`set`](Self::set).
    pub fn with(
        mut self,
        code: DeductionCode,
        amount: Decimal,
    ) -> Self {
        self.set(code, amount);
        self
    }

    /// `(code, amount)` pairs in canonical code order.
    pub fn iter(&self) -> impl Iterator<Item = (DeductionCode, Decimal)> + '_ {
        DeductionCode::ALL
            .into_iter()
            .map(move |code| (code, self.get(code)))
    }

    /// Sum over every code.
    ///
    /// # Errors
    ///
    /// Returns [`TaxError::InvalidInput`] for `deductions` when the sum
    /// overflows, e.g. with two huge uncapped amounts.
    pub fn total(&self) -> Result<Decimal, TaxError> {
        self.iter()
            .try_fold(Decimal::ZERO, |sum, (_, amount)| {
                checked_add("deductions", sum, amount)
            })
    }

    pub fn is_zero(&self) -> bool {
        self.iter().all(|(_, amount)| amount.is_zero())
    }
}

/// Per-code maximum allowed deduction. `None` means uncapped.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeductionCaps {
    #[serde(rename = "80C")]
    pub section_80c: Option<Decimal>,
    #[serde(rename = "80D")]
    pub section_80d: Option<Decimal>,
    #[serde(rename = "HRA")]
    pub hra: Option<Decimal>,
    pub home_loan: Option<Decimal>,
    #[serde(rename = "NPS")]
    pub nps: Option<Decimal>,
    pub donations: Option<Decimal>,
}

impl DeductionCaps {
    /// Caps: 80C 150000, 80D 25000, home loan 200000, NPS 50000; HRA and
    /// donations uncapped.
    pub fn india_illustrative() -> Self {
        Self {
            section_80c: Some(Decimal::from(150_000)),
            section_80d: Some(Decimal::from(25_000)),
            hra: None,
            home_loan: Some(Decimal::from(200_000)),
            nps: Some(Decimal::from(50_000)),
            donations: None,
        }
    }

    pub fn get(
        &self,
        code: DeductionCode,
    ) -> Option<Decimal> {
        match code {
            DeductionCode::Section80C => self.section_80c,
            DeductionCode::Section80D => self.section_80d,
            DeductionCode::Hra => self.hra,
            DeductionCode::HomeLoan => self.home_loan,
            DeductionCode::Nps => self.nps,
            DeductionCode::Donations => self.donations,
        }
    }

    /// Splits `amount` into the part allowed under the cap and the excess.
    pub fn clamp(
        &self,
        code: DeductionCode,
        amount: Decimal,
    ) -> (Decimal, Decimal) {
        match self.get(code) {
            Some(cap) if amount > cap => (cap, amount - cap),
            _ => (amount, Decimal::ZERO),
        }
    }

    /// Remaining allowance for `code` given the amount already claimed.
    /// `None` for uncapped codes.
    pub fn headroom(
        &self,
        code: DeductionCode,
        claimed: Decimal,
    ) -> Option<Decimal> {
        self.get(code).map(|cap| (cap - claimed).max(Decimal::ZERO))
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    use super::*;

    #[test]
    fn parse_round_trips_every_code() {
        for code in DeductionCode::ALL {
            assert_eq!(DeductionCode::parse(code.as_str()), Some(code));
        }
    }

    #[test]
    fn parse_ignores_unknown_codes() {
        assert_eq!(DeductionCode::parse("80E"), None);
        assert_eq!(DeductionCode::parse("hra"), None);
    }

    #[test]
    fn deduction_set_deserializes_missing_keys_as_zero() {
        let set: DeductionSet =
            serde_json::from_str(r#"{"80C": "150000", "donations": 500}"#).unwrap();

        assert_eq!(set.section_80c, dec!(150000));
        assert_eq!(set.donations, dec!(500));
        assert_eq!(set.section_80d, Decimal::ZERO);
        assert_eq!(set.total(), Ok(dec!(150500)));
    }

    #[test]
    fn deduction_set_ignores_unknown_keys() {
        let set: DeductionSet = serde_json::from_str(r#"{"80E": 1000, "NPS": 20}"#).unwrap();

        assert_eq!(set.total(), Ok(dec!(20)));
    }

    #[test]
    fn try_from_pairs_sums_repeated_codes() {
        let set = DeductionSet::try_from_pairs([
            (DeductionCode::Section80C, dec!(80000)),
            (DeductionCode::Section80C, dec!(70000)),
            (DeductionCode::Hra, dec!(12000)),
        ])
        .unwrap();

        assert_eq!(set.get(DeductionCode::Section80C), dec!(150000));
        assert_eq!(set.get(DeductionCode::Hra), dec!(12000));
    }

    #[test]
    fn add_overflow_is_an_error_and_keeps_the_amount() {
        let mut set = DeductionSet::default().with(DeductionCode::Hra, Decimal::MAX);

        let err = set.add(DeductionCode::Hra, dec!(1)).unwrap_err();

        assert_eq!(err, TaxError::too_large("deductions.HRA"));
        assert_eq!(set.hra, Decimal::MAX);
    }

    #[test]
    fn total_overflow_is_an_error() {
        let half = Decimal::MAX / dec!(2) + dec!(1);
        let set = DeductionSet::default()
            .with(DeductionCode::Hra, half)
            .with(DeductionCode::Donations, half);

        assert_eq!(set.total(), Err(TaxError::too_large("deductions")));
    }

    #[test]
    fn iter_follows_canonical_order() {
        let codes: Vec<_> = DeductionSet::default().iter().map(|(c, _)| c).collect();

        assert_eq!(codes, DeductionCode::ALL.to_vec());
    }

    #[test]
    fn clamp_splits_excess_over_cap() {
        let caps = DeductionCaps::india_illustrative();

        assert_eq!(
            caps.clamp(DeductionCode::Section80C, dec!(999999)),
            (dec!(150000), dec!(849999))
        );
        assert_eq!(
            caps.clamp(DeductionCode::Section80D, dec!(10000)),
            (dec!(10000), dec!(0))
        );
    }

    #[test]
    fn clamp_leaves_uncapped_codes_alone() {
        let caps = DeductionCaps::india_illustrative();

        assert_eq!(
            caps.clamp(DeductionCode::Hra, dec!(5000000)),
            (dec!(5000000), dec!(0))
        );
    }

    #[test]
    fn headroom_is_floored_at_zero() {
        let caps = DeductionCaps::india_illustrative();

        assert_eq!(
            caps.headroom(DeductionCode::Nps, dec!(20000)),
            Some(dec!(30000))
        );
        assert_eq!(
            caps.headroom(DeductionCode::Nps, dec!(90000)),
            Some(dec!(0))
        );
        assert_eq!(caps.headroom(DeductionCode::Donations, dec!(1)), None);
    }
}
