use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

use crate::error::TaxError;
use crate::ledger::LedgerSummary;
use crate::models::{DeductionEntry, Period, Transaction};

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("ledger not found: {0}")]
    NotFound(String),

    #[error("I/O error: {0}")]
    Io(String),

    #[error("parse error: {0}")]
    Parse(String),

    #[error("fetch timed out after {0:?}")]
    Timeout(Duration),

    #[error(transparent)]
    Invalid(#[from] TaxError),
}

/// Where ledger entries come from.
///
/// Implementations return only the entries dated inside the requested
/// period. Calls may be slow or fail; callers decide on timeouts.
#[async_trait]
pub trait LedgerSource: Send + Sync {
    async fn transactions(
        &self,
        period: &Period,
    ) -> Result<Vec<Transaction>, SourceError>;

    async fn deduction_entries(
        &self,
        period: &Period,
    ) -> Result<Vec<DeductionEntry>, SourceError>;

    /// Fetches both entry kinds and aggregates them.
    async fn summary(
        &self,
        period: &Period,
    ) -> Result<LedgerSummary, SourceError> {
        let transactions = self.transactions(period).await?;
        let entries = self.deduction_entries(period).await?;
        Ok(LedgerSummary::build(*period, &transactions, &entries)?)
    }
}
