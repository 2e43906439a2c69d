pub mod app;
pub mod logging;
pub mod state;
pub mod utils;

pub use app::OutputFormat;
pub use state::{LoadedPeriod, RefreshOutcome, SessionError, TaxSession};
