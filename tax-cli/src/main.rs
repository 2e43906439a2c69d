use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use chrono::Local;
use clap::{Args, Parser, Subcommand};
use rust_decimal::Decimal;
use tracing::debug;

use tax_core::{Period, Regime, ScenarioDelta, TaxError, TaxInput};
use tax_data::CsvLedgerSource;
use tax_cli::utils::{DeductionArg, deduction_set, parse_decimal, parse_deduction_arg};
use tax_cli::{OutputFormat, TaxSession, app, logging};

// ─── CLI definition ──────────────────────────────────────────────────────────

/// Income tax estimator comparing the old and new regimes.
///
/// Uses the built-in illustrative rules unless `--rules` points at a TOML
/// rules file.
#[derive(Debug, Parser)]
#[command(name = "tax-estimator", version, about, long_about = None)]
struct Cli {
    /// Rules file (TOML) with slab tables, caps and policy.
    #[arg(long, global = true)]
    rules: Option<PathBuf>,

    /// Print machine-readable JSON instead of text.
    #[arg(long, global = true, default_value_t = false)]
    json: bool,

    /// Log level or filter directive. Overrides `RUST_LOG`.
    #[arg(long, global = true)]
    log_level: Option<String>,

    /// Also append log records to this file.
    #[arg(long, global = true)]
    log_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

/// The filer's numbers, shared by `calculate`, `simulate` and `suggest`.
#[derive(Debug, Args)]
struct InputArgs {
    /// Gross income. Commas are accepted (`12,00,000`).
    #[arg(long, value_parser = parse_decimal)]
    income: Decimal,

    /// Business or other expenses.
    #[arg(long, value_parser = parse_decimal, default_value = "0")]
    expenses: Decimal,

    /// Claimed deduction as CODE=AMOUNT; repeat for several codes.
    #[arg(long = "deduction", value_name = "CODE=AMOUNT", value_parser = parse_deduction_arg)]
    deductions: Vec<DeductionArg>,

    /// `old` or `new`.
    #[arg(long)]
    regime: Regime,
}

impl InputArgs {
    fn to_input(&self) -> Result<TaxInput, TaxError> {
        Ok(TaxInput::new(
            self.income,
            self.expenses,
            deduction_set(&self.deductions)?,
            self.regime,
        ))
    }
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Calculate liability under both regimes.
    Calculate(InputArgs),

    /// Recalculate with changed income or deductions.
    Simulate {
        #[command(flatten)]
        input: InputArgs,

        /// Change to income; may be negative.
        #[arg(long, value_parser = parse_decimal, allow_hyphen_values = true, default_value = "0")]
        income_delta: Decimal,

        /// Change to one deduction as CODE=AMOUNT; may be negative.
        #[arg(long = "deduction-delta", value_name = "CODE=AMOUNT", value_parser = parse_deduction_arg, allow_hyphen_values = true)]
        deduction_deltas: Vec<DeductionArg>,
    },

    /// Suggest a regime switch and unused deduction headroom.
    Suggest(InputArgs),

    /// Summarize a financial year from ledger CSV files.
    Summary {
        /// Transactions CSV (`date,description,amount,category`).
        #[arg(long)]
        transactions: PathBuf,

        /// Deductions CSV (`date,code,amount`).
        #[arg(long)]
        deductions: Option<PathBuf>,

        /// Financial year by starting year (2024 = FY 2024-25). Defaults to
        /// the current one.
        #[arg(long)]
        fy: Option<i32>,

        /// `old` or `new`.
        #[arg(long)]
        regime: Regime,

        /// Replace the ledger amount for a code as CODE=AMOUNT.
        #[arg(long = "override", value_name = "CODE=AMOUNT", value_parser = parse_deduction_arg)]
        overrides: Vec<DeductionArg>,

        /// Give up on a ledger read after this many seconds.
        #[arg(long, default_value_t = 10)]
        timeout_secs: u64,
    },

    /// Print the slab tables.
    Slabs {
        /// Only this regime.
        #[arg(long)]
        regime: Option<Regime>,
    },
}

// ─── entry point ─────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    logging::init_logging(cli.log_level.as_deref(), cli.log_file.as_deref())?;

    let format = if cli.json {
        OutputFormat::Json
    } else {
        OutputFormat::Text
    };
    let rules = app::load_rules(cli.rules.as_deref())?;
    debug!(?cli.command, "running command");

    let output = match cli.command {
        Command::Calculate(input) => app::calculate(&rules, &input.to_input()?, format)?,
        Command::Simulate {
            input,
            income_delta,
            deduction_deltas,
        } => {
            let delta = ScenarioDelta {
                income: income_delta,
                deductions: deduction_set(&deduction_deltas)?,
            };
            app::simulate(&rules, &input.to_input()?, &delta, format)?
        }
        Command::Suggest(input) => app::suggest(&rules, &input.to_input()?, format)?,
        Command::Summary {
            transactions,
            deductions,
            fy,
            regime,
            overrides,
            timeout_secs,
        } => {
            let period = match fy {
                Some(year) => Period::financial_year(year)?,
                None => Period::financial_year_of(Local::now().date_naive())?,
            };
            let source = CsvLedgerSource::new(transactions, deductions);
            let session = TaxSession::new(rules, Arc::new(source), regime)
                .with_fetch_timeout(Duration::from_secs(timeout_secs));
            for arg in overrides {
                session.set_override(arg.code, Some(arg.amount)).await;
            }
            app::summary(&session, period, format)
                .await
                .context("Summary failed")?
        }
        Command::Slabs { regime } => app::slabs(&rules, regime, format)?,
    };

    println!("{output}");
    Ok(())
}
