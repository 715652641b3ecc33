//! Reads an uploaded file into a header-normalized table and checks the schema.

use crate::error::{FileReadError, LedgerError, Result};
use calamine::{Data, Reader, open_workbook_auto_from_rs};
use csv::ReaderBuilder;
use serde::{Deserialize, Serialize};
use std::io::Cursor;
use std::path::Path;
use std::str::FromStr;
use tracing::{debug, info};

pub const DATE: &str = "date";
pub const ORDER_NO: &str = "order no";
pub const EXECUTIVE_NAME: &str = "executive name";
pub const CUSTOMER_NAME: &str = "customer name";
pub const OPENING_BALANCE: &str = "opening balance";
pub const SALES_VALUE: &str = "sales value";
pub const SALES_RETURN: &str = "sales return";
pub const SALES_IN_AND_OUT: &str = "sales in and out";
pub const PAID_AMOUNT: &str = "paid amount";
pub const CASHBACK: &str = "cashback";
pub const COMMISSION: &str = "commission";

/// Columns every upload must carry, by normalized name.
pub const REQUIRED_COLUMNS: [&str; 11] = [
    DATE,
    ORDER_NO,
    EXECUTIVE_NAME,
    CUSTOMER_NAME,
    OPENING_BALANCE,
    SALES_VALUE,
    SALES_RETURN,
    SALES_IN_AND_OUT,
    PAID_AMOUNT,
    CASHBACK,
    COMMISSION,
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InputFormat {
    Csv,
    Workbook,
}

impl InputFormat {
    /// Guesses the format from a file extension.
    pub fn from_path(path: &str) -> Option<Self> {
        let ext = Path::new(path).extension()?.to_string_lossy().to_lowercase();
        match ext.as_str() {
            "csv" => Some(Self::Csv),
            "xlsx" | "xlsm" | "xlsb" | "xls" | "ods" => Some(Self::Workbook),
            _ => None,
        }
    }
}

impl FromStr for InputFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> anyhow::Result<Self> {
        match s.to_lowercase().as_str() {
            "csv" => Ok(Self::Csv),
            "workbook" | "xlsx" | "excel" => Ok(Self::Workbook),
            other => anyhow::bail!("{} is not a valid input format", other),
        }
    }
}

/// Lower-cases and trims a header cell.
pub fn normalize_column(name: &str) -> String {
    name.trim().to_lowercase()
}

/// Text cells of an upload with normalized headers and the required set present.
#[derive(Debug, Clone, PartialEq)]
pub struct RawTable {
    columns: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl RawTable {
    /// Builds a table from a header and rows, failing if required columns are absent.
    pub fn new(header: Vec<String>, rows: Vec<Vec<String>>) -> Result<Self> {
        let columns: Vec<String> = header.iter().map(|c| normalize_column(c)).collect();
        let missing = missing_columns(&columns);
        if !missing.is_empty() {
            return Err(LedgerError::MissingColumns(missing));
        }
        Ok(Self { columns, rows })
    }

    /// Parses uploaded bytes in the declared format.
    pub fn read(bytes: &[u8], format: InputFormat) -> Result<Self> {
        let (header, rows) = match format {
            InputFormat::Csv => read_csv(bytes)?,
            InputFormat::Workbook => read_workbook(bytes)?,
        };
        info!(
            ?format,
            columns = header.len(),
            rows = rows.len(),
            "read uploaded table"
        );
        Self::new(header, rows)
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    /// Position of a normalized column name. The last duplicate wins.
    pub fn position(&self, column: &str) -> Option<usize> {
        self.columns.iter().rposition(|c| c == column)
    }
}

/// Required columns absent from `columns`, in required order.
pub fn missing_columns(columns: &[String]) -> Vec<String> {
    REQUIRED_COLUMNS
        .iter()
        .filter(|required| !columns.iter().any(|c| c == *required))
        .map(|required| required.to_string())
        .collect()
}

fn is_blank(row: &[String]) -> bool {
    row.iter().all(|cell| cell.trim().is_empty())
}

fn read_csv(bytes: &[u8]) -> Result<(Vec<String>, Vec<Vec<String>>), FileReadError> {
    // short rows are padded with blanks later, long ones are rejected here
    let mut rdr = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(bytes);
    let header: Vec<String> = rdr.headers()?.iter().map(ToOwned::to_owned).collect();
    if header.iter().all(|c| c.trim().is_empty()) {
        return Err(FileReadError::NoHeader);
    }
    let mut rows = Vec::new();
    for record in rdr.records() {
        let record = record?;
        if record.len() > header.len() {
            return Err(FileReadError::RowTooLong {
                line: record.position().map(|p| p.line()).unwrap_or_default(),
                expected: header.len(),
                found: record.len(),
            });
        }
        let row: Vec<String> = record.iter().map(ToOwned::to_owned).collect();
        if !is_blank(&row) {
            rows.push(row);
        }
    }
    debug!(rows = rows.len(), "parsed csv");
    Ok((header, rows))
}

fn read_workbook(bytes: &[u8]) -> Result<(Vec<String>, Vec<Vec<String>>), FileReadError> {
    let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes.to_vec()))?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or(FileReadError::NoSheets)??;
    let mut cells = range.rows().map(|r| r.iter().map(cell_to_string).collect::<Vec<_>>());
    let header = cells.next().ok_or(FileReadError::NoHeader)?;
    if is_blank(&header) {
        return Err(FileReadError::NoHeader);
    }
    let rows: Vec<Vec<String>> = cells.filter(|row| !is_blank(row)).collect();
    debug!(rows = rows.len(), "parsed workbook");
    Ok((header, rows))
}

/// Workbook cell as text. Dates become ISO dates so they parse like CSV dates.
fn cell_to_string(cell: &Data) -> String {
    match cell {
        Data::String(v) => v.to_string(),
        Data::Float(v) => v.to_string(),
        Data::Int(v) => v.to_string(),
        Data::Bool(v) => v.to_string(),
        Data::DateTime(v) => v
            .as_datetime()
            .map(|dt| {
                if dt.time() == chrono::NaiveTime::MIN {
                    dt.date().to_string()
                } else {
                    dt.format("%Y-%m-%d %H:%M:%S").to_string()
                }
            })
            .unwrap_or_default(),
        Data::DateTimeIso(v) => v.to_string(),
        Data::DurationIso(v) => v.to_string(),
        Data::Error(_) => String::new(),
        Data::Empty => String::new(),
    }
}

#[cfg(test)]
mod loader_tests {
    use super::*;
    use anyhow::Result;
    use indoc::indoc;

    #[test]
    fn normalizes_headers() -> Result<()> {
        let csv = indoc! {"
            Date , ORDER NO,Executive Name,customer name,Opening Balance,Sales Value,sales return,Sales In And Out,Paid Amount,Cashback,Commission,Region
            2024-01-05,1001,Asha,Acme,100,50,0,0,30,5,2,North
        "};
        let table = RawTable::read(csv.as_bytes(), InputFormat::Csv)?;
        assert_eq!(table.columns()[0], "date");
        assert_eq!(table.columns()[1], "order no");
        assert_eq!(table.columns()[11], "region");
        assert_eq!(table.rows().len(), 1);
        assert_eq!(table.position("region"), Some(11));
        Ok(())
    }

    #[test]
    fn reports_each_missing_column() -> Result<()> {
        for dropped in REQUIRED_COLUMNS {
            let header: Vec<String> = REQUIRED_COLUMNS
                .iter()
                .filter(|c| **c != dropped)
                .map(|c| c.to_uppercase())
                .chain(std::iter::once("notes".to_string()))
                .collect();
            let result = RawTable::new(header, Vec::new());
            assert!(
                matches!(&result, Err(LedgerError::MissingColumns(m)) if m == &vec![dropped.to_string()]),
                "dropping {dropped} should be reported alone, got {result:?}"
            );
        }
        Ok(())
    }

    #[test]
    fn missing_columns_listed_in_required_order() {
        let result = RawTable::new(vec!["date".to_string(), "cashback".to_string()], Vec::new());
        match result {
            Err(LedgerError::MissingColumns(missing)) => {
                assert_eq!(missing.len(), 9);
                assert_eq!(missing[0], "order no");
                assert_eq!(missing[8], "commission");
            }
            other => panic!("expected missing columns, got {other:?}"),
        }
    }

    #[test]
    fn long_csv_row_is_a_read_error() {
        let csv = "date,order no\n2024-01-01,1\n2024-01-02,2,extra\n";
        let result = RawTable::read(csv.as_bytes(), InputFormat::Csv);
        assert!(matches!(
            result,
            Err(LedgerError::FileRead(FileReadError::RowTooLong {
                line: 3,
                expected: 2,
                found: 3,
            }))
        ));
    }

    #[test]
    fn short_csv_row_reads_as_blank_cells() -> Result<()> {
        let csv = indoc! {"
            date,order no,executive name,customer name,opening balance,sales value,sales return,sales in and out,paid amount,cashback,commission
            2024-01-05,1001,Asha,Acme,100,50,0,0,30
            2024-01-06,1002,Ravi,Globex,0,80,0,0,80,0,0
        "};
        let table = RawTable::read(csv.as_bytes(), InputFormat::Csv)?;
        assert_eq!(table.rows().len(), 2);
        assert_eq!(table.rows()[0].len(), 9);

        let ledger = crate::record::Ledger::derive(&table, &crate::record::DEFAULT_DATE_FORMATS)?;
        let first = &ledger.records()[0];
        assert_eq!(first.amounts().cashback, "0".parse()?);
        assert_eq!(first.outstanding(), "120".parse()?);
        Ok(())
    }

    #[test]
    fn empty_input_is_a_read_error() {
        let result = RawTable::read(b"", InputFormat::Csv);
        assert!(matches!(result, Err(LedgerError::FileRead(FileReadError::NoHeader))));
    }

    #[test]
    fn garbage_workbook_is_a_read_error() {
        let result = RawTable::read(b"definitely not a zip archive", InputFormat::Workbook);
        assert!(matches!(result, Err(LedgerError::FileRead(_))));
    }

    #[test]
    fn blank_rows_are_skipped() -> Result<()> {
        let csv = indoc! {"
            date,order no,executive name,customer name,opening balance,sales value,sales return,sales in and out,paid amount,cashback,commission
            2024-01-05,1001,Asha,Acme,100,50,0,0,30,5,2
            ,,,,,,,,,,
        "};
        let table = RawTable::read(csv.as_bytes(), InputFormat::Csv)?;
        assert_eq!(table.rows().len(), 1);
        Ok(())
    }

    #[test]
    fn format_from_extension() {
        assert_eq!(InputFormat::from_path("sales.CSV"), Some(InputFormat::Csv));
        assert_eq!(InputFormat::from_path("/tmp/ledger.xlsx"), Some(InputFormat::Workbook));
        assert_eq!(InputFormat::from_path("ledger.xls"), Some(InputFormat::Workbook));
        assert_eq!(InputFormat::from_path("ledger.txt"), None);
        assert_eq!(InputFormat::from_path("ledger"), None);
    }
}
