use chrono::NaiveDate;
use thiserror::Error;

/// Errors that stop a run. Coerced amounts and unknown dates are not errors.
#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("File read error: {0}")]
    FileRead(#[from] FileReadError),

    #[error("Missing columns: {}", .0.join(", "))]
    MissingColumns(Vec<String>),

    #[error("Invalid date range: {from} is after {to}")]
    InvalidRange { from: NaiveDate, to: NaiveDate },

    #[error("Amounts of order {order_no:?} are too large to compute outstanding")]
    RowOverflow { order_no: String },

    #[error("Total {column} is too large to compute")]
    TotalOverflow { column: &'static str },
}

/// Why the uploaded bytes could not be read as a table.
#[derive(Debug, Error)]
pub enum FileReadError {
    #[error("{0}")]
    Csv(#[from] csv::Error),

    #[error("{0}")]
    Workbook(#[from] calamine::Error),

    #[error("workbook has no sheets")]
    NoSheets,

    #[error("no columns to parse from file")]
    NoHeader,

    #[error("line {line}: expected at most {expected} fields, found {found}")]
    RowTooLong {
        line: u64,
        expected: usize,
        found: usize,
    },
}

pub type Result<T, E = LedgerError> = std::result::Result<T, E>;
