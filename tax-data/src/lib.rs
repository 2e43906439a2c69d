pub mod csv_source;
pub mod ledger_loader;
pub mod rules_loader;
pub mod slab_loader;

pub use csv_source::CsvLedgerSource;
pub use ledger_loader::{
    LedgerLoadError, load_deductions_from_file, load_deductions_from_str,
    load_transactions_from_file, load_transactions_from_str,
};
pub use rules_loader::{RulesLoadError, load_rules_from_file, load_rules_from_str, rules_to_toml};
pub use slab_loader::{SlabLoaderError, SlabRecord, SlabTableLoader};
