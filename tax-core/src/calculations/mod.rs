//! Tax calculation: slab evaluation, regime comparison, what-if scenarios
//! and saving suggestions.
//!
//! Everything in this module is pure; no I/O happens here.

pub mod calculator;
pub mod common;
pub mod scenario;
pub mod suggestions;

pub use calculator::TaxCalculator;
pub use scenario::ScenarioDelta;
pub use suggestions::Suggestion;
