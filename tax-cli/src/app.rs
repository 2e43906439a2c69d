//! Command handlers. Each returns the text to print so the binary only
//! parses arguments and writes output.

use std::fmt::Write as _;
use std::path::Path;

use anyhow::{Context, Result};
use rust_decimal::Decimal;
use serde::Serialize;
use tax_core::{
    LedgerSummary, Period, Regime, ScenarioDelta, SlabTable, Suggestion, TaxCalculator, TaxInput,
    TaxResult, TaxRules,
};
use tax_data::load_rules_from_file;
use tracing::{debug, info, warn};

use crate::state::TaxSession;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

/// Rules from `path`, or the built-in illustrative rules.
pub fn load_rules(path: Option<&Path>) -> Result<TaxRules> {
    match path {
        Some(path) => {
            let rules = load_rules_from_file(path)
                .with_context(|| format!("Failed to load rules: {}", path.display()))?;
            info!(name = %rules.name, path = %path.display(), "using rules file");
            Ok(rules)
        }
        None => {
            debug!("using built-in rules");
            Ok(TaxRules::india_illustrative())
        }
    }
}

fn to_json<T: Serialize>(value: &T) -> Result<String> {
    serde_json::to_string_pretty(value).context("Failed to serialize output")
}

fn render_suggestions(suggestions: &[Suggestion]) -> String {
    if suggestions.is_empty() {
        return "No suggestions: deductions are at their caps and the regime is already the cheaper one.".to_string();
    }
    suggestions
        .iter()
        .enumerate()
        .map(|(i, s)| format!("{}. {s}", i + 1))
        .collect::<Vec<_>>()
        .join("\n")
}

// ─── calculate ───────────────────────────────────────────────────────────────

pub fn calculate(
    rules: &TaxRules,
    input: &TaxInput,
    format: OutputFormat,
) -> Result<String> {
    let result = TaxCalculator::new(rules)
        .calculate(input)
        .context("Calculation failed")?;
    if result.has_excess() {
        warn!(
            excess = ?result.deductions_excess.total(),
            "some deductions exceed their caps; the excess is ignored"
        );
    }
    match format {
        OutputFormat::Text => Ok(result.to_string()),
        OutputFormat::Json => to_json(&result),
    }
}

// ─── simulate ────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct SimulationReport {
    pub delta: ScenarioDelta,
    pub base: TaxResult,
    pub simulated: TaxResult,
    /// Simulated liability minus base liability; negative means less tax.
    pub impact: Decimal,
}

pub fn simulate(
    rules: &TaxRules,
    input: &TaxInput,
    delta: &ScenarioDelta,
    format: OutputFormat,
) -> Result<String> {
    let calculator = TaxCalculator::new(rules);
    let base = calculator.calculate(input).context("Calculation failed")?;
    let simulated = calculator
        .simulate_scenario(input, delta)
        .context("Simulation failed")?;
    let report = SimulationReport {
        delta: *delta,
        impact: simulated.tax_liability - base.tax_liability,
        base,
        simulated,
    };

    match format {
        OutputFormat::Json => to_json(&report),
        OutputFormat::Text => {
            let mut out = String::new();
            writeln!(out, "== Base ==\n{}\n", report.base)?;
            writeln!(out, "== Simulated ==\n{}\n", report.simulated)?;
            let verdict = match report.impact.cmp(&Decimal::ZERO) {
                std::cmp::Ordering::Less => "less",
                std::cmp::Ordering::Greater => "more",
                std::cmp::Ordering::Equal => "the same",
            };
            if report.impact.is_zero() {
                write!(out, "Impact: {verdict} tax.")?;
            } else {
                write!(out, "Impact: {} {verdict} tax.", report.impact.abs().round_dp(2))?;
            }
            Ok(out)
        }
    }
}

// ─── suggest ─────────────────────────────────────────────────────────────────

pub fn suggest(
    rules: &TaxRules,
    input: &TaxInput,
    format: OutputFormat,
) -> Result<String> {
    let suggestions = TaxCalculator::new(rules)
        .suggest(input)
        .context("Could not compute suggestions")?;
    match format {
        OutputFormat::Text => Ok(render_suggestions(&suggestions)),
        OutputFormat::Json => to_json(&suggestions),
    }
}

// ─── summary ─────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct SummaryReport {
    pub current: LedgerSummary,
    pub previous: LedgerSummary,
    pub result: TaxResult,
    pub previous_result: TaxResult,
    pub suggestions: Vec<Suggestion>,
}

/// Refreshes `session` for `period` and reports the current year against
/// the previous one.
pub async fn summary(
    session: &TaxSession,
    period: Period,
    format: OutputFormat,
) -> Result<String> {
    session
        .refresh(period)
        .await
        .with_context(|| format!("Failed to load ledger for {period}"))?;
    let loaded = session
        .loaded()
        .await
        .context("Ledger refresh did not store any data")?;

    let report = SummaryReport {
        result: session.current_result().await?,
        previous_result: session.previous_result().await?,
        suggestions: session.suggestions().await?,
        current: loaded.current,
        previous: loaded.previous,
    };
    if report.current.ignored_entries > 0 {
        warn!(
            count = report.current.ignored_entries,
            "deduction entries with unknown codes were ignored"
        );
    }

    match format {
        OutputFormat::Json => to_json(&report),
        OutputFormat::Text => {
            let mut out = String::new();
            writeln!(out, "Period:                   {}", report.current.period)?;
            writeln!(out, "Net (income - expenses):  {}", report.current.net())?;
            if report.current.ignored_entries > 0 {
                writeln!(
                    out,
                    "Ignored entries:          {}",
                    report.current.ignored_entries
                )?;
            }
            writeln!(out, "\n{}\n", report.result)?;
            let change = report.result.tax_liability - report.previous_result.tax_liability;
            writeln!(
                out,
                "Previous period ({}): liability {} ({}{} this period)\n",
                report.previous.period,
                report.previous_result.tax_liability,
                if change >= Decimal::ZERO { "+" } else { "" },
                change
            )?;
            writeln!(out, "Suggestions:")?;
            write!(out, "{}", render_suggestions(&report.suggestions))?;
            Ok(out)
        }
    }
}

// ─── slabs ───────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
struct SlabListing<'a> {
    regime: Regime,
    slabs: &'a SlabTable,
}

pub fn slabs(
    rules: &TaxRules,
    regime: Option<Regime>,
    format: OutputFormat,
) -> Result<String> {
    let regimes: Vec<Regime> = match regime {
        Some(regime) => vec![regime],
        None => Regime::ALL.to_vec(),
    };

    match format {
        OutputFormat::Json => {
            let listing: Vec<SlabListing<'_>> = regimes
                .into_iter()
                .map(|regime| SlabListing {
                    regime,
                    slabs: rules.slabs(regime),
                })
                .collect();
            to_json(&listing)
        }
        OutputFormat::Text => {
            let mut out = format!("Rules: {}", rules.name);
            for regime in regimes {
                write!(out, "\n\n{regime} regime:\n{}", rules.slabs(regime))?;
            }
            Ok(out)
        }
    }
}
