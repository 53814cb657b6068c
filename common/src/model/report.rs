use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Identifiers of the built-in report columns. Columns appended by an import
/// are registered on top of these and carry the `ext_` prefix, so the two
/// sets can never collide.
pub const BASE_COLUMN_IDS: [&str; 9] = [
    "date",
    "adCopyTitle",
    "adGroupName",
    "impressions",
    "clicks",
    "ctr",
    "cpc",
    "cpm",
    "costs",
];

/// One line of the ad-copy performance report fetched from the upstream
/// network. The merge step appends dynamically-named external columns; those
/// live in `external` and are flattened into the same JSON object.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportRow {
    pub date: String,
    pub ad_copy_name: String,
    pub ad_copy_title: String,
    #[serde(default)]
    pub ad_group_name: String,
    pub impressions: u64,
    pub clicks: u64,
    pub ctr: f64,
    pub cpc: f64,
    pub cpm: f64,
    pub costs: f64,
    #[serde(flatten)]
    pub external: BTreeMap<String, Option<String>>,
}

impl ReportRow {
    /// Key used to join against imported data: the title when present,
    /// otherwise the technical name.
    pub fn join_key(&self) -> &str {
        if self.ad_copy_title.is_empty() {
            &self.ad_copy_name
        } else {
            &self.ad_copy_title
        }
    }
}

/// Display format of a report column, inferred from the column name for
/// imported columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnFormat {
    Text,
    Currency,
    Percent,
}

/// One entry of the report's column configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnConfig {
    pub id: String,
    pub label: String,
    pub visible: bool,
    pub format: ColumnFormat,
    #[serde(default)]
    pub is_external: bool,
}
