//! Session state for the estimator.
//!
//! [`TaxSession`] owns the rules, the filer's choices (regime, manual
//! deduction overrides, what-if deltas) and the most recently fetched ledger
//! summaries. Every derived figure comes from the selectors, which
//! recompute from stored state and never touch the ledger source.
//!
//! Refreshes are last-write-wins: each call to [`TaxSession::refresh`]
//! takes a generation ticket, and a fetch that completes after a newer
//! refresh has started is discarded.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use rust_decimal::Decimal;
use tax_core::{
    DeductionCode, LedgerSource, LedgerSummary, Period, Regime, ScenarioDelta, SourceError,
    Suggestion, TaxCalculator, TaxError, TaxInput, TaxResult, TaxRules,
};
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::{debug, info};

pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("no ledger data loaded yet; refresh first")]
    NotLoaded,

    #[error(transparent)]
    Source(#[from] SourceError),

    #[error(transparent)]
    Tax(#[from] TaxError),
}

/// What happened to a refresh once its fetch completed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshOutcome {
    /// The fetched summaries are now the session's data.
    Applied { generation: u64 },
    /// A newer refresh started while this one was in flight.
    Stale { generation: u64, latest: u64 },
}

/// Summaries for a period and the one before it, as of one refresh.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadedPeriod {
    pub generation: u64,
    pub current: LedgerSummary,
    pub previous: LedgerSummary,
}

#[derive(Debug, Clone)]
struct SessionState {
    regime: Regime,
    overrides: BTreeMap<DeductionCode, Decimal>,
    delta: ScenarioDelta,
    loaded: Option<LoadedPeriod>,
}

pub struct TaxSession {
    rules: TaxRules,
    source: Arc<dyn LedgerSource>,
    fetch_timeout: Duration,
    generation: AtomicU64,
    state: RwLock<SessionState>,
}

impl TaxSession {
    pub fn new(
        rules: TaxRules,
        source: Arc<dyn LedgerSource>,
        regime: Regime,
    ) -> Self {
        Self {
            rules,
            source,
            fetch_timeout: DEFAULT_FETCH_TIMEOUT,
            generation: AtomicU64::new(0),
            state: RwLock::new(SessionState {
                regime,
                overrides: BTreeMap::new(),
                delta: ScenarioDelta::default(),
                loaded: None,
            }),
        }
    }

    /// Bounds each ledger fetch. Applies to the current and previous period
    /// separately.
    pub fn with_fetch_timeout(
        mut self,
        timeout: Duration,
    ) -> Self {
        self.fetch_timeout = timeout;
        self
    }

    pub fn rules(&self) -> &TaxRules {
        &self.rules
    }

    pub fn calculator(&self) -> TaxCalculator<'_> {
        TaxCalculator::new(&self.rules)
    }

    // ─── refresh ────────────────────────────────────────────────────────────

    /// Fetches `period` and the period before it concurrently and stores
    /// both summaries, unless a newer refresh was started meanwhile.
    ///
    /// # Errors
    ///
    /// Returns the first fetch failure, including
    /// [`SourceError::Timeout`]. A failed refresh leaves previously loaded
    /// data in place.
    pub async fn refresh(
        &self,
        period: Period,
    ) -> Result<RefreshOutcome, SessionError> {
        let ticket = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let previous_period = period.previous()?;
        debug!(ticket, %period, previous = %previous_period, "refreshing ledger");

        let (current, previous) =
            tokio::try_join!(self.fetch(period), self.fetch(previous_period))?;

        let mut state = self.state.write().await;
        let latest = self.generation.load(Ordering::SeqCst);
        if latest != ticket {
            info!(ticket, latest, %period, "discarding stale refresh");
            return Ok(RefreshOutcome::Stale {
                generation: ticket,
                latest,
            });
        }

        state.loaded = Some(LoadedPeriod {
            generation: ticket,
            current,
            previous,
        });
        Ok(RefreshOutcome::Applied { generation: ticket })
    }

    async fn fetch(
        &self,
        period: Period,
    ) -> Result<LedgerSummary, SourceError> {
        tokio::time::timeout(self.fetch_timeout, self.source.summary(&period))
            .await
            .map_err(|_| SourceError::Timeout(self.fetch_timeout))?
    }

    /// The data stored by the latest applied refresh.
    pub async fn loaded(&self) -> Option<LoadedPeriod> {
        self.state.read().await.loaded.clone()
    }

    // ─── form state ─────────────────────────────────────────────────────────

    pub async fn regime(&self) -> Regime {
        self.state.read().await.regime
    }

    pub async fn set_regime(
        &self,
        regime: Regime,
    ) {
        self.state.write().await.regime = regime;
    }

    /// Replaces the ledger amount for `code`; `None` goes back to the
    /// ledger.
    pub async fn set_override(
        &self,
        code: DeductionCode,
        amount: Option<Decimal>,
    ) {
        let mut state = self.state.write().await;
        match amount {
            Some(amount) => state.overrides.insert(code, amount),
            None => state.overrides.remove(&code),
        };
    }

    pub async fn set_delta(
        &self,
        delta: ScenarioDelta,
    ) {
        self.state.write().await.delta = delta;
    }

    // ─── selectors ──────────────────────────────────────────────────────────

    /// Calculator input built from the current period's summary with the
    /// manual overrides applied.
    pub async fn current_input(&self) -> Result<TaxInput, SessionError> {
        let state = self.state.read().await;
        let loaded = state.loaded.as_ref().ok_or(SessionError::NotLoaded)?;
        Ok(input_for(&state, &loaded.current))
    }

    pub async fn current_result(&self) -> Result<TaxResult, SessionError> {
        let input = self.current_input().await?;
        Ok(self.calculator().calculate(&input)?)
    }

    /// The previous period under the same regime and overrides, for
    /// comparison.
    pub async fn previous_result(&self) -> Result<TaxResult, SessionError> {
        let input = {
            let state = self.state.read().await;
            let loaded = state.loaded.as_ref().ok_or(SessionError::NotLoaded)?;
            input_for(&state, &loaded.previous)
        };
        Ok(self.calculator().calculate(&input)?)
    }

    /// The current period with the what-if deltas applied.
    ///
    /// Input and deltas are read under one lock, so a concurrent
    /// `set_delta` or `set_override` is seen entirely or not at all.
    pub async fn simulated_result(&self) -> Result<TaxResult, SessionError> {
        let (input, delta) = {
            let state = self.state.read().await;
            let loaded = state.loaded.as_ref().ok_or(SessionError::NotLoaded)?;
            (input_for(&state, &loaded.current), state.delta)
        };
        Ok(self.calculator().simulate_scenario(&input, &delta)?)
    }

    pub async fn suggestions(&self) -> Result<Vec<Suggestion>, SessionError> {
        let input = self.current_input().await?;
        Ok(self.calculator().suggest(&input)?)
    }
}

fn input_for(
    state: &SessionState,
    summary: &LedgerSummary,
) -> TaxInput {
    let mut input = summary.to_input(state.regime);
    for (&code, &amount) in &state.overrides {
        input.deductions.set(code, amount);
    }
    input
}
