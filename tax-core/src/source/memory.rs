use async_trait::async_trait;

use super::ledger_source::{LedgerSource, SourceError};
use crate::models::{DeductionEntry, Period, Transaction};

/// A ledger held in memory. Useful for tests and for callers that already
/// have the entries loaded.
#[derive(Debug, Clone, Default)]
pub struct MemoryLedgerSource {
    transactions: Vec<Transaction>,
    entries: Vec<DeductionEntry>,
}

impl MemoryLedgerSource {
    pub fn new(
        transactions: Vec<Transaction>,
        entries: Vec<DeductionEntry>,
    ) -> Self {
        Self {
            transactions,
            entries,
        }
    }
}

#[async_trait]
impl LedgerSource for MemoryLedgerSource {
    async fn transactions(
        &self,
        period: &Period,
    ) -> Result<Vec<Transaction>, SourceError> {
        Ok(self
            .transactions
            .iter()
            .filter(|tx| period.contains(tx.date))
            .cloned()
            .collect())
    }

    async fn deduction_entries(
        &self,
        period: &Period,
    ) -> Result<Vec<DeductionEntry>, SourceError> {
        Ok(self
            .entries
            .iter()
            .filter(|e| period.contains(e.date))
            .cloned()
            .collect())
    }
}
