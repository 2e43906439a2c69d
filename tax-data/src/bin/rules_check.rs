use std::fs::File;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tax_core::{Regime, TaxRules};
use tax_data::{SlabTableLoader, load_rules_from_file, rules_to_toml};

/// Validate a tax rules file and print the slab tables it defines.
///
/// A slab CSV may be layered on top. It must have the columns:
/// - regime: `old` or `new`
/// - lower: lower bound of the slab
/// - upper: upper bound (empty for the open-ended top slab)
/// - rate: marginal rate as a fraction (e.g., 0.05)
#[derive(Parser, Debug)]
#[command(name = "tax-rules-check")]
#[command(version, about, long_about = None)]
struct Args {
    /// Rules TOML file. The built-in illustrative rules are used when omitted
    #[arg(short, long)]
    rules: Option<PathBuf>,

    /// Slab CSV replacing the tables of every regime it mentions
    #[arg(short, long)]
    slabs: Option<PathBuf>,

    /// Print the resulting rules as TOML instead of a summary
    #[arg(short, long, default_value_t = false)]
    dump: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let mut rules = match &args.rules {
        Some(path) => load_rules_from_file(path)
            .with_context(|| format!("Failed to load rules: {}", path.display()))?,
        None => TaxRules::india_illustrative(),
    };

    if let Some(path) = &args.slabs {
        let file =
            File::open(path).with_context(|| format!("Failed to open: {}", path.display()))?;
        let records = SlabTableLoader::parse(file)
            .with_context(|| format!("Failed to parse CSV: {}", path.display()))?;
        let replaced = SlabTableLoader::apply(&mut rules, &records)
            .with_context(|| format!("Invalid slab table in: {}", path.display()))?;
        eprintln!(
            "Replaced {} slab table(s) from {} records.",
            replaced,
            records.len()
        );
    }

    if args.dump {
        print!("{}", rules_to_toml(&rules).context("Failed to render rules as TOML")?);
        return Ok(());
    }

    println!("Rules: {}", rules.name);
    println!(
        "Expenses reduce income: {}",
        if rules.policy.subtract_expenses { "yes" } else { "no" }
    );
    println!("Standard deduction: {}", rules.policy.standard_deduction);
    for regime in Regime::ALL {
        println!();
        println!("{regime} regime:");
        println!("{}", rules.slabs(regime));
    }

    Ok(())
}
