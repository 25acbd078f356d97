use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

/// Database model for a folder inside a section
#[derive(Debug, Clone, FromRow)]
pub struct Folder {
    pub id: Uuid,
    pub section_id: Uuid,
    pub name: String,
    pub display_order: i32,
    pub created_at: DateTime<Utc>,
}
