use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

/// Database model for an uploaded file and its backing table (if any)
#[derive(Debug, Clone, FromRow)]
pub struct UploadedFile {
    pub id: Uuid,
    pub title: String,
    /// Object key in storage
    pub file_path: String,
    /// Lowercase extension without the dot
    pub file_type: String,
    /// Empty until ingestion completes, and for non-tabular files
    pub table_name: String,
    pub uploaded_by: Option<Uuid>,
    pub uploaded_at: DateTime<Utc>,
}
