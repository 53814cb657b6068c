use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Result of parsing an uploaded tabular file from a chosen header line.
///
/// Every row record carries exactly the declared columns as keys; cells
/// missing in the source default to the empty string.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParsedTable {
    pub columns: Vec<String>,
    pub rows: Vec<HashMap<String, String>>,
    /// Delimiter used for text files, `None` for spreadsheets.
    pub separator: Option<char>,
}

impl ParsedTable {
    pub fn empty(separator: Option<char>) -> Self {
        Self {
            columns: Vec::new(),
            rows: Vec::new(),
            separator,
        }
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }
}
