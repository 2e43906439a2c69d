use std::collections::BTreeMap;
use std::io::Read;

use rust_decimal::Decimal;
use serde::Deserialize;
use tax_core::{Regime, SlabTable, TaxError, TaxRules, TaxSlab};
use thiserror::Error;
use tracing::info;

/// Errors that can occur when loading slab tables from CSV.
#[derive(Debug, Error)]
pub enum SlabLoaderError {
    #[error("CSV parse error: {0}")]
    CsvParse(String),

    #[error("unknown regime '{regime}' on row {row}")]
    InvalidRegime { regime: String, row: usize },

    #[error("{regime} regime: {source}")]
    Table {
        regime: Regime,
        #[source]
        source: TaxError,
    },
}

impl From<csv::Error> for SlabLoaderError {
    fn from(err: csv::Error) -> Self {
        SlabLoaderError::CsvParse(err.to_string())
    }
}

/// A single row of a slab CSV file.
///
/// - `regime`: `old` or `new`
/// - `lower`: lower bound of the slab
/// - `upper`: upper bound (empty for the open-ended top slab)
/// - `rate`: marginal rate as a fraction (e.g. 0.05 for 5%)
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct SlabRecord {
    pub regime: String,
    pub lower: Decimal,
    #[serde(deserialize_with = "deserialize_optional_decimal")]
    pub upper: Option<Decimal>,
    pub rate: Decimal,
}

fn deserialize_optional_decimal<'de, D>(deserializer: D) -> Result<Option<Decimal>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let s: Option<String> = Option::deserialize(deserializer)?;
    match s {
        Some(s) if s.trim().is_empty() => Ok(None),
        Some(s) => s
            .trim()
            .parse::<Decimal>()
            .map(Some)
            .map_err(serde::de::Error::custom),
        None => Ok(None),
    }
}

/// Loader for per-regime slab tables from CSV.
///
/// Rows for one regime may appear in any order; they are sorted by lower
/// bound before the table is validated.
pub struct SlabTableLoader;

impl SlabTableLoader {
    /// Parse slab records from a CSV reader.
    pub fn parse<R: Read>(reader: R) -> Result<Vec<SlabRecord>, SlabLoaderError> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(reader);
        let mut records = Vec::new();

        for result in csv_reader.deserialize() {
            let record: SlabRecord = result?;
            records.push(record);
        }

        Ok(records)
    }

    /// Group records by regime and build a validated table for each regime
    /// present.
    pub fn build(records: &[SlabRecord]) -> Result<BTreeMap<Regime, SlabTable>, SlabLoaderError> {
        let mut groups: BTreeMap<Regime, Vec<TaxSlab>> = BTreeMap::new();

        for (idx, record) in records.iter().enumerate() {
            let regime =
                Regime::parse(&record.regime).ok_or_else(|| SlabLoaderError::InvalidRegime {
                    regime: record.regime.clone(),
                    row: idx + 1,
                })?;
            groups
                .entry(regime)
                .or_default()
                .push(TaxSlab::new(record.lower, record.upper, record.rate));
        }

        groups
            .into_iter()
            .map(|(regime, mut slabs)| {
                slabs.sort_by(|a, b| a.lower.cmp(&b.lower));
                SlabTable::new(slabs)
                    .map(|table| (regime, table))
                    .map_err(|source| SlabLoaderError::Table { regime, source })
            })
            .collect()
    }

    /// Replace the slab tables in `rules` for every regime present in
    /// `records`. Regimes absent from the file keep their current table.
    ///
    /// Returns the number of tables replaced.
    pub fn apply(
        rules: &mut TaxRules,
        records: &[SlabRecord],
    ) -> Result<usize, SlabLoaderError> {
        let tables = Self::build(records)?;
        let mut replaced = 0;

        for (regime, table) in tables {
            info!(%regime, slabs = table.slabs().len(), "replacing slab table");
            *rules.slabs_mut(regime) = table;
            replaced += 1;
        }

        Ok(replaced)
    }
}
