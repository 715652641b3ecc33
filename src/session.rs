//! Per-run context: the settings, the current upload and the selection
//! made against it.

use crate::error::Result;
use crate::export::{ExportError, ExportFormat, ExportOptions, Exporters};
use crate::filter::{DateRange, ExecutiveFilter, Filter, View};
use crate::loader::{InputFormat, RawTable};
use crate::record::Ledger;
use crate::report::Table;
use crate::settings::Settings;
use chrono::NaiveDate;
use std::path::PathBuf;
use tracing::info;

/// The filter choices of a run. Unset bounds fall back to the ledger's date span.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Selection {
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
    pub executives: ExecutiveFilter,
}

impl Selection {
    /// Resolves the selection against a ledger.
    ///
    /// Missing bounds take the earliest and latest known dates. With no
    /// bound given and no known dates there is no date range at all.
    pub fn filter(&self, ledger: &Ledger) -> Result<Filter> {
        let span = ledger.date_span();
        let from = self.from.or(span.map(|(min, _)| min));
        let to = self.to.or(span.map(|(_, max)| max));
        let date_range = match (from, to) {
            (None, None) => None,
            (from, to) => Some(DateRange::new(
                from.unwrap_or(NaiveDate::MIN),
                to.unwrap_or(NaiveDate::MAX),
            )?),
        };
        Ok(Filter::new(date_range, self.executives.clone()))
    }
}

/// Which download a table is saved as.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Download {
    Sales,
    Outstanding,
}

struct Upload {
    name: String,
    ledger: Ledger,
}

pub struct Session {
    settings: Settings,
    exporters: Exporters,
    upload: Option<Upload>,
}

impl Session {
    pub fn new(settings: Settings) -> Self {
        Self::with_exporters(settings, Exporters::available())
    }

    pub fn with_exporters(settings: Settings, exporters: Exporters) -> Self {
        Session {
            settings,
            exporters,
            upload: None,
        }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn exporters(&self) -> &Exporters {
        &self.exporters
    }

    /// Validates and derives an upload, replacing any previous one.
    /// A failed upload leaves the session without a ledger.
    pub fn upload(&mut self, name: &str, bytes: &[u8], format: InputFormat) -> Result<&Ledger> {
        self.upload = None;
        let table = RawTable::read(bytes, format)?;
        let ledger = Ledger::derive(&table, &self.settings.date_formats)?;
        info!(source = name, records = ledger.len(), "uploaded ledger");
        let upload = self.upload.insert(Upload {
            name: name.to_owned(),
            ledger,
        });
        Ok(&upload.ledger)
    }

    pub fn ledger(&self) -> Option<&Ledger> {
        self.upload.as_ref().map(|u| &u.ledger)
    }

    /// Name of the current upload.
    pub fn source(&self) -> Option<&str> {
        self.upload.as_ref().map(|u| u.name.as_str())
    }

    /// The selected view of the current upload, `None` before any upload.
    pub fn view(&self, selection: &Selection) -> Result<Option<View<'_>>> {
        let Some(ledger) = self.ledger() else {
            return Ok(None);
        };
        let filter = selection.filter(ledger)?;
        Ok(Some(ledger.view().filter(&filter)))
    }

    /// File name, sheet name and title for a download.
    pub fn export_target(&self, download: Download, format: ExportFormat) -> (PathBuf, ExportOptions) {
        let settings = &self.settings;
        let (path, sheet_name) = match (download, format) {
            (Download::Sales, _) => (settings.sales_path(), &settings.sales_sheet),
            (Download::Outstanding, ExportFormat::Pdf) => {
                (settings.pdf_path(), &settings.outstanding_sheet)
            }
            (Download::Outstanding, ExportFormat::Xlsx) => {
                (settings.outstanding_path(), &settings.outstanding_sheet)
            }
        };
        let path = match (download, format) {
            (Download::Sales, ExportFormat::Pdf) => path.with_extension(format.extension()),
            _ => path,
        };
        let options = ExportOptions {
            sheet_name: sheet_name.clone(),
            title: settings.report_title.clone(),
            generated: chrono::Local::now().date_naive(),
        };
        (path, options)
    }

    /// Serializes a table for a download, returning where it should be written.
    pub fn export(
        &self,
        download: Download,
        format: ExportFormat,
        table: &Table,
    ) -> std::result::Result<(PathBuf, Vec<u8>), ExportError> {
        let (path, options) = self.export_target(download, format);
        let bytes = self.exporters.export(format, table, &options)?;
        Ok((path, bytes))
    }
}
