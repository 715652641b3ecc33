//! Sales ledger tracking: load a CSV or workbook of sales records, derive
//! outstanding balances and commissions, filter, aggregate and export.

pub mod aggregate;
pub mod error;
pub mod export;
pub mod filter;
pub mod input;
pub mod loader;
pub mod money;
pub mod record;
pub mod report;
pub mod session;
pub mod settings;

pub use error::{FileReadError, LedgerError};
pub use filter::{DateRange, ExecutiveFilter, Filter, View};
pub use loader::{InputFormat, RawTable};
pub use record::{Ledger, LedgerDate, Record};
pub use report::Table;
pub use session::{Download, Selection, Session};
pub use settings::Settings;
