mod deduction;
mod ledger;
mod regime;
mod tax_input;
mod tax_result;
mod tax_rules;
mod tax_slab;

pub use deduction::{DeductionCaps, DeductionCode, DeductionSet};
pub use ledger::{DeductionEntry, Period, PeriodKind, Transaction};
pub use regime::{Regime, RegimeBetter};
pub use tax_input::TaxInput;
pub use tax_result::TaxResult;
pub use tax_rules::{TaxPolicy, TaxRules};
pub use tax_slab::{SlabTable, TaxSlab};
