use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

// Query params for the table catalog
#[derive(Debug, Clone, Default, Deserialize, IntoParams, ToSchema)]
pub struct TableQueryParams {
    /// Case-insensitive substring of the table name
    pub search: Option<String>,
}

/// One entry of the table catalog
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct TableSummaryDto {
    pub table_name: String,
    pub row_count: i64,
}

/// First rows of a backing table
#[derive(Debug, Serialize, ToSchema)]
pub struct TablePreviewDto {
    pub table_name: String,
    /// Column names in ordinal order
    pub columns: Vec<String>,
    /// Row objects keyed by column name
    #[schema(value_type = Vec<Object>)]
    pub rows: Vec<serde_json::Value>,
    /// Total rows in the table
    pub row_count: i64,
    /// True when `rows` holds fewer than `row_count` entries
    pub truncated: bool,
}
