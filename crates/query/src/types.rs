//! Wire types for the query backend.

use serde::{Deserialize, Serialize};

/// Maximum number of rows a preview carries.
pub const PREVIEW_ROW_LIMIT: usize = 5;

/// A bounded sample of matching rows plus the total match count.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PreviewResult {
    /// Total rows matching the criteria, not just the sample.
    pub total_rows: i64,
    /// At most [`PREVIEW_ROW_LIMIT`] sample rows, as raw JSON objects.
    pub preview_rows: Vec<serde_json::Value>,
    /// Column names of the result set, in order.
    pub column_names: Vec<String>,
    /// Backend-reported execution time, e.g. `"0.42s"`.
    pub execution_time: String,
}

/// A full extract of matching rows.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportResult {
    pub total_rows: i64,
    pub rows: Vec<serde_json::Value>,
    pub column_names: Vec<String>,
    pub execution_time: String,
}
