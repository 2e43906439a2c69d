//! Loader for jurisdiction rule files.
//!
//! ## TOML Format
//!
//! ```toml
//! name = "India (illustrative)"
//!
//! [policy]                  # optional
//! subtract_expenses = true  # default true
//! standard_deduction = "0"  # default 0
//!
//! [caps]                    # codes left out are uncapped
//! "80C" = "150000"
//! "80D" = "25000"
//! home_loan = "200000"
//! NPS = "50000"
//!
//! [[old_regime]]
//! lower = "0"
//! upper = "250000"
//! rate = "0"
//!
//! [[old_regime]]
//! lower = "250000"
//! rate = "0.05"             # no `upper`: open-ended top slab
//! ```
//!
//! Amounts may be written as TOML strings or integers. Rates should be
//! strings so they stay exact.

use std::path::Path;

use tax_core::{TaxError, TaxRules};
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum RulesLoadError {
    #[error("cannot read rules file '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("rules file is not valid: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("rules file is not valid: {0}")]
    Invalid(#[from] TaxError),
}

/// Parse and validate rules from TOML text.
pub fn load_rules_from_str(input: &str) -> Result<TaxRules, RulesLoadError> {
    let rules: TaxRules = toml::from_str(input)?;
    rules.validate()?;
    debug!(name = %rules.name, "loaded tax rules");
    Ok(rules)
}

/// Read a rules file from disk and delegate to [`load_rules_from_str`].
pub fn load_rules_from_file(path: &Path) -> Result<TaxRules, RulesLoadError> {
    let contents = std::fs::read_to_string(path).map_err(|source| RulesLoadError::Io {
        path: path.display().to_string(),
        source,
    })?;
    load_rules_from_str(&contents)
}

/// Render rules back to TOML, e.g. to write out the built-in defaults as a
/// starting point.
pub fn rules_to_toml(rules: &TaxRules) -> Result<String, toml::ser::Error> {
    toml::to_string_pretty(rules)
}
