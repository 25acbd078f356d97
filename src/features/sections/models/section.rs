use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

/// Database model for a top-level section; ownership is enforced in the queries
#[derive(Debug, Clone, FromRow)]
pub struct Section {
    pub id: Uuid,
    pub name: String,
    pub display_order: i32,
    pub created_at: DateTime<Utc>,
}
