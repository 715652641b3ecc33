use serde::{Deserialize, Serialize};

/// Raw struct deserialized from yaml. Every key is optional.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct RawSettings {
    pub date_formats: Option<Vec<String>>,
    pub report_title: Option<String>,
    pub sales_sheet: Option<String>,
    pub outstanding_sheet: Option<String>,
    pub sales_file: Option<String>,
    pub outstanding_file: Option<String>,
    pub pdf_file: Option<String>,
    pub output_dir: Option<String>,
}
