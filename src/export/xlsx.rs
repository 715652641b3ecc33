use super::{ExportError, ExportFormat, ExportOptions, Exporter};
use crate::report::{Field, Table};
use rust_xlsxwriter::{Format, Workbook};

/// One sheet: bold header row, then the table rows. Amounts are written as
/// numbers unless a float cannot hold them, then as their exact decimal text.
pub struct XlsxExporter;

impl Exporter for XlsxExporter {
    fn format(&self) -> ExportFormat {
        ExportFormat::Xlsx
    }

    fn export(&self, table: &Table, options: &ExportOptions) -> Result<Vec<u8>, ExportError> {
        let mut workbook = Workbook::new();
        let bold = Format::new().set_bold();
        let sheet = workbook.add_worksheet();
        sheet.set_name(options.sheet_name.as_str())?;

        for (col, name) in table.columns.iter().enumerate() {
            sheet.write_string_with_format(0, col as u16, name.as_str(), &bold)?;
        }
        for (i, row) in table.rows.iter().enumerate() {
            let r = i as u32 + 1;
            for (col, field) in row.iter().enumerate() {
                let c = col as u16;
                match field {
                    Field::Text(text) if text.is_empty() => {}
                    Field::Text(text) => {
                        sheet.write_string(r, c, text.as_str())?;
                    }
                    Field::Amount(money) => match money.to_exact_f64() {
                        Some(number) => {
                            sheet.write_number(r, c, number)?;
                        }
                        None => {
                            sheet.write_string(r, c, money.0.to_string())?;
                        }
                    },
                    Field::Date(date) => {
                        if let Some(date) = date.known() {
                            sheet.write_string(r, c, date.format("%Y-%m-%d").to_string())?;
                        }
                    }
                    Field::Count(n) => {
                        sheet.write_number(r, c, *n as f64)?;
                    }
                }
            }
        }
        Ok(workbook.save_to_buffer()?)
    }
}
