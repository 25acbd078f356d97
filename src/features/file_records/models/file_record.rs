use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

/// Database model for a file entry inside a folder
#[derive(Debug, Clone, FromRow)]
pub struct FileRecord {
    pub id: Uuid,
    pub folder_id: Uuid,
    pub name: String,
    pub file_type: String,
    pub display_order: i32,
    pub created_at: DateTime<Utc>,
}
