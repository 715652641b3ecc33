pub mod raw;

use crate::record::DEFAULT_DATE_FORMATS;
use anyhow::{Context, Error, Result, anyhow, bail};
use raw::RawSettings;
use std::convert::{TryFrom, TryInto};
use std::path::PathBuf;
use std::str::FromStr;
use tracing::info;

/// Environment variable naming a settings file when `--config` is absent.
pub const CONFIG_ENV: &str = "SALES_TRACKER_CONFIG";

/// Parsing and export defaults for a run.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub date_formats: Vec<String>,
    pub report_title: String,
    pub sales_sheet: String,
    pub outstanding_sheet: String,
    pub sales_file: String,
    pub outstanding_file: String,
    pub pdf_file: String,
    pub output_dir: PathBuf,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            date_formats: DEFAULT_DATE_FORMATS.iter().map(|f| f.to_string()).collect(),
            report_title: "Customer Outstanding Report".to_string(),
            sales_sheet: "sales".to_string(),
            outstanding_sheet: "outstanding".to_string(),
            sales_file: "sales_filtered.xlsx".to_string(),
            outstanding_file: "outstanding.xlsx".to_string(),
            pdf_file: "outstanding.pdf".to_string(),
            output_dir: PathBuf::from("."),
        }
    }
}

impl TryFrom<RawSettings> for Settings {
    type Error = Error;

    fn try_from(raw: RawSettings) -> Result<Self> {
        let defaults = Settings::default();
        let date_formats = match raw.date_formats {
            Some(formats) if formats.is_empty() => bail!("date_formats must not be empty"),
            Some(formats) => formats,
            None => defaults.date_formats,
        };
        // sheet names are limited by the workbook format
        for sheet in [&raw.sales_sheet, &raw.outstanding_sheet].into_iter().flatten() {
            if sheet.is_empty() || sheet.chars().count() > 31 {
                bail!("Invalid sheet name {sheet:?}");
            }
        }
        Ok(Settings {
            date_formats,
            report_title: raw.report_title.unwrap_or(defaults.report_title),
            sales_sheet: raw.sales_sheet.unwrap_or(defaults.sales_sheet),
            outstanding_sheet: raw.outstanding_sheet.unwrap_or(defaults.outstanding_sheet),
            sales_file: raw.sales_file.unwrap_or(defaults.sales_file),
            outstanding_file: raw.outstanding_file.unwrap_or(defaults.outstanding_file),
            pdf_file: raw.pdf_file.unwrap_or(defaults.pdf_file),
            output_dir: raw.output_dir.map(PathBuf::from).unwrap_or(defaults.output_dir),
        })
    }
}

impl FromStr for Settings {
    type Err = Error;

    fn from_str(doc: &str) -> Result<Self> {
        // an empty file means defaults
        if doc.trim().is_empty() {
            return Ok(Settings::default());
        }
        let raw: RawSettings = serde_yaml::from_str(doc)
            .with_context(|| anyhow!("Failed to deserialize settings:\n{doc:?}"))?;
        let settings: Self = raw
            .clone()
            .try_into()
            .with_context(|| anyhow!("Failed to convert settings:\n{raw:?}"))?;
        Ok(settings)
    }
}

impl Settings {
    pub async fn from_file(file: &str) -> Result<Self> {
        let doc = async_std::fs::read_to_string(file)
            .await
            .with_context(|| format!("Failed to read settings file {file}"))?;
        let settings = doc.parse()?;
        info!(file, "loaded settings");
        Ok(settings)
    }

    /// Settings from the given path, else from `SALES_TRACKER_CONFIG`, else defaults.
    pub async fn load(path: Option<&str>) -> Result<Self> {
        let env_path = std::env::var(CONFIG_ENV).ok();
        match path.or(env_path.as_deref()) {
            Some(file) => Self::from_file(file).await,
            None => Ok(Settings::default()),
        }
    }

    pub fn sales_path(&self) -> PathBuf {
        self.output_dir.join(&self.sales_file)
    }

    pub fn outstanding_path(&self) -> PathBuf {
        self.output_dir.join(&self.outstanding_file)
    }

    pub fn pdf_path(&self) -> PathBuf {
        self.output_dir.join(&self.pdf_file)
    }
}
