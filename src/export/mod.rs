//! Serializes report tables to downloadable files.
//!
//! Which formats exist is a capability of the build: callers ask
//! [`Exporters::supports`] instead of checking for libraries themselves.

#[cfg(feature = "pdf")]
pub mod pdf;
pub mod xlsx;

use crate::report::Table;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use tracing::{info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    Xlsx,
    Pdf,
}

impl ExportFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Xlsx => "xlsx",
            ExportFormat::Pdf => "pdf",
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExportFormat::Xlsx => f.pad("Excel"),
            ExportFormat::Pdf => f.pad("PDF"),
        }
    }
}

impl FromStr for ExportFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> anyhow::Result<Self> {
        match s.to_lowercase().as_str() {
            "xlsx" | "excel" => Ok(ExportFormat::Xlsx),
            "pdf" => Ok(ExportFormat::Pdf),
            other => anyhow::bail!("{} is not a valid export format", other),
        }
    }
}

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("{0} export is not available in this build")]
    Unavailable(ExportFormat),

    #[error("Spreadsheet export failed: {0}")]
    Xlsx(#[from] rust_xlsxwriter::XlsxError),

    #[error("PDF export failed: {0}")]
    Pdf(String),
}

/// Labels that go into an exported file besides the table itself.
#[derive(Debug, Clone, PartialEq)]
pub struct ExportOptions {
    pub sheet_name: String,
    pub title: String,
    pub generated: NaiveDate,
}

pub trait Exporter {
    fn format(&self) -> ExportFormat;
    fn export(&self, table: &Table, options: &ExportOptions) -> Result<Vec<u8>, ExportError>;
}

/// The exporters this build provides.
pub struct Exporters(Vec<Box<dyn Exporter>>);

impl Exporters {
    /// Everything compiled in.
    pub fn available() -> Self {
        let mut exporters: Vec<Box<dyn Exporter>> = vec![Box::new(xlsx::XlsxExporter)];
        #[cfg(feature = "pdf")]
        exporters.push(Box::new(pdf::PdfExporter));
        Self(exporters)
    }

    /// Only the given exporters, e.g. to run without PDF support.
    pub fn with(exporters: Vec<Box<dyn Exporter>>) -> Self {
        Self(exporters)
    }

    pub fn supports(&self, format: ExportFormat) -> bool {
        self.0.iter().any(|e| e.format() == format)
    }

    pub fn export(
        &self,
        format: ExportFormat,
        table: &Table,
        options: &ExportOptions,
    ) -> Result<Vec<u8>, ExportError> {
        let Some(exporter) = self.0.iter().find(|e| e.format() == format) else {
            warn!(%format, "export requested but not available");
            return Err(ExportError::Unavailable(format));
        };
        let bytes = exporter.export(table, options)?;
        info!(%format, rows = table.rows.len(), bytes = bytes.len(), "exported table");
        Ok(bytes)
    }
}

impl Default for Exporters {
    fn default() -> Self {
        Self::available()
    }
}
