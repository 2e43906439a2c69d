pub mod ledger_source;
pub mod memory;

pub use ledger_source::{LedgerSource, SourceError};
pub use memory::MemoryLedgerSource;
