use std::fmt;

use chrono::{Datelike, Months, NaiveDate};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::TaxError;

/// A ledger line. Positive amounts are income, negative amounts expenses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    pub date: NaiveDate,
    pub description: String,
    pub amount: Decimal,
    #[serde(default)]
    pub category: Option<String>,
}

/// A claimed deduction as recorded, before the code is interpreted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeductionEntry {
    pub date: NaiveDate,
    pub code: String,
    pub amount: Decimal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PeriodKind {
    /// 1 April to 31 March.
    FinancialYear,
    Month,
    Custom,
}

/// An inclusive date range the ledger is summarized over.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Period {
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub kind: PeriodKind,
}

fn out_of_range(what: String) -> TaxError {
    TaxError::invalid_input("period", format!("{what} is out of range"))
}

impl Period {
    /// Financial year named by its starting calendar year: `2024` covers
    /// 2024-04-01 through 2025-03-31.
    pub fn financial_year(start_year: i32) -> Result<Self, TaxError> {
        let start = NaiveDate::from_ymd_opt(start_year, 4, 1)
            .ok_or_else(|| out_of_range(format!("financial year {start_year}")))?;
        let end = NaiveDate::from_ymd_opt(start_year + 1, 3, 31)
            .ok_or_else(|| out_of_range(format!("financial year {start_year}")))?;
        Ok(Self {
            start,
            end,
            kind: PeriodKind::FinancialYear,
        })
    }

    pub fn month(
        year: i32,
        month: u32,
    ) -> Result<Self, TaxError> {
        let start = NaiveDate::from_ymd_opt(year, month, 1)
            .ok_or_else(|| out_of_range(format!("month {year}-{month:02}")))?;
        let end = start
            .checked_add_months(Months::new(1))
            .and_then(|next| next.pred_opt())
            .ok_or_else(|| out_of_range(format!("month {year}-{month:02}")))?;
        Ok(Self {
            start,
            end,
            kind: PeriodKind::Month,
        })
    }

    pub fn custom(
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Self, TaxError> {
        if end < start {
            return Err(TaxError::invalid_input(
                "period",
                format!("end {end} is before start {start}"),
            ));
        }
        Ok(Self {
            start,
            end,
            kind: PeriodKind::Custom,
        })
    }

    /// Financial year containing `date`.
    pub fn financial_year_of(date: NaiveDate) -> Result<Self, TaxError> {
        let start_year = if date.month() >= 4 {
            date.year()
        } else {
            date.year() - 1
        };
        Self::financial_year(start_year)
    }

    /// The period of the same kind immediately before this one.
    pub fn previous(&self) -> Result<Self, TaxError> {
        match self.kind {
            PeriodKind::FinancialYear => Self::financial_year(self.start.year() - 1),
            PeriodKind::Month => {
                let start = self
                    .start
                    .checked_sub_months(Months::new(1))
                    .ok_or_else(|| out_of_range(format!("month before {}", self.start)))?;
                Self::month(start.year(), start.month())
            }
            PeriodKind::Custom => {
                let length = self.end.signed_duration_since(self.start);
                let end = self
                    .start
                    .pred_opt()
                    .ok_or_else(|| out_of_range(format!("day before {}", self.start)))?;
                let start = end
                    .checked_sub_signed(length)
                    .ok_or_else(|| out_of_range(format!("range ending {end}")))?;
                Self::custom(start, end)
            }
        }
    }

    pub fn contains(
        &self,
        date: NaiveDate,
    ) -> bool {
        self.start <= date && date <= self.end
    }
}

impl fmt::Display for Period {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        match self.kind {
            PeriodKind::FinancialYear => write!(
                f,
                "FY {}-{:02}",
                self.start.year(),
                self.end.year().rem_euclid(100)
            ),
            PeriodKind::Month => write!(f, "{}", self.start.format("%Y-%m")),
            PeriodKind::Custom => write!(f, "{}..{}", self.start, self.end),
        }
    }
}
