use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tax_core::{DeductionEntry, LedgerSource, Period, SourceError, Transaction};
use tracing::debug;

use crate::ledger_loader::{
    LedgerLoadError, load_deductions_from_str, load_transactions_from_str,
};

/// A [`LedgerSource`] backed by a transactions CSV and an optional
/// deductions CSV.
///
/// Files are re-read on every call so edits show up on the next refresh.
#[derive(Debug, Clone)]
pub struct CsvLedgerSource {
    transactions_path: PathBuf,
    deductions_path: Option<PathBuf>,
}

impl CsvLedgerSource {
    pub fn new(
        transactions_path: impl Into<PathBuf>,
        deductions_path: Option<PathBuf>,
    ) -> Self {
        Self {
            transactions_path: transactions_path.into(),
            deductions_path,
        }
    }

    pub fn transactions_path(&self) -> &Path {
        &self.transactions_path
    }

    pub fn deductions_path(&self) -> Option<&Path> {
        self.deductions_path.as_deref()
    }
}

async fn read(path: &Path) -> Result<String, SourceError> {
    tokio::fs::read_to_string(path).await.map_err(|err| {
        let shown = path.display().to_string();
        match err.kind() {
            ErrorKind::NotFound => SourceError::NotFound(shown),
            _ => SourceError::Io(format!("{shown}: {err}")),
        }
    })
}

fn parse_error(
    path: &Path,
    err: LedgerLoadError,
) -> SourceError {
    SourceError::Parse(format!("{}: {err}", path.display()))
}

#[async_trait]
impl LedgerSource for CsvLedgerSource {
    async fn transactions(
        &self,
        period: &Period,
    ) -> Result<Vec<Transaction>, SourceError> {
        let path = &self.transactions_path;
        let contents = read(path).await?;
        let all = load_transactions_from_str(&contents).map_err(|e| parse_error(path, e))?;
        let total = all.len();

        let selected: Vec<Transaction> =
            all.into_iter().filter(|tx| period.contains(tx.date)).collect();
        debug!(
            path = %path.display(),
            %period,
            total,
            selected = selected.len(),
            "read transactions"
        );
        Ok(selected)
    }

    async fn deduction_entries(
        &self,
        period: &Period,
    ) -> Result<Vec<DeductionEntry>, SourceError> {
        let Some(path) = self.deductions_path.as_deref() else {
            return Ok(Vec::new());
        };
        let contents = read(path).await?;
        let all = load_deductions_from_str(&contents).map_err(|e| parse_error(path, e))?;

        Ok(all.into_iter().filter(|e| period.contains(e.date)).collect())
    }
}
