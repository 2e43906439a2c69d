pub mod calculations;
pub mod error;
pub mod ledger;
pub mod models;
pub mod source;

pub use calculations::{ScenarioDelta, Suggestion, TaxCalculator};
pub use error::TaxError;
pub use ledger::LedgerSummary;
pub use models::*;
pub use source::{LedgerSource, MemoryLedgerSource, SourceError};
