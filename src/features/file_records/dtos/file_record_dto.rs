use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use crate::features::file_records::models::FileRecord;

/// Response DTO for a file record
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct FileRecordDto {
    pub id: Uuid,
    pub folder_id: Uuid,
    pub name: String,
    pub file_type: String,
    pub order: i32,
    pub created_at: DateTime<Utc>,
}

impl From<FileRecord> for FileRecordDto {
    fn from(r: FileRecord) -> Self {
        Self {
            id: r.id,
            folder_id: r.folder_id,
            name: r.name,
            file_type: r.file_type,
            order: r.display_order,
            created_at: r.created_at,
        }
    }
}

/// File fields shared by every create path
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct NewFileRecordDto {
    #[validate(length(min = 1, max = 255))]
    pub name: String,

    #[validate(length(min = 1, max = 50))]
    pub file_type: String,

    #[serde(default)]
    pub order: i32,
}

/// Create request for `POST /api/files/`
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateFileRecordDto {
    pub folder_id: Uuid,

    #[validate(length(min = 1, max = 255))]
    pub name: String,

    #[validate(length(min = 1, max = 50))]
    pub file_type: String,

    #[serde(default)]
    pub order: i32,
}

impl CreateFileRecordDto {
    pub fn into_parts(self) -> (Uuid, NewFileRecordDto) {
        (
            self.folder_id,
            NewFileRecordDto {
                name: self.name,
                file_type: self.file_type,
                order: self.order,
            },
        )
    }
}

/// Full replacement (PUT)
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct ReplaceFileRecordDto {
    #[validate(length(min = 1, max = 255))]
    pub name: String,

    #[validate(length(min = 1, max = 50))]
    pub file_type: String,

    #[serde(default)]
    pub order: i32,

    /// Move the file to another of the caller's folders
    pub folder_id: Option<Uuid>,
}

/// Partial update (PATCH)
#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
pub struct UpdateFileRecordDto {
    #[validate(length(min = 1, max = 255))]
    pub name: Option<String>,

    #[validate(length(min = 1, max = 50))]
    pub file_type: Option<String>,

    pub order: Option<i32>,

    pub folder_id: Option<Uuid>,
}

impl From<ReplaceFileRecordDto> for UpdateFileRecordDto {
    fn from(dto: ReplaceFileRecordDto) -> Self {
        Self {
            name: Some(dto.name),
            file_type: Some(dto.file_type),
            order: Some(dto.order),
            folder_id: dto.folder_id,
        }
    }
}

// Query params for listing the caller's files
#[derive(Debug, Clone, Default, Deserialize, IntoParams, ToSchema)]
pub struct FileRecordQueryParams {
    /// Only files inside this folder
    pub folder_id: Option<Uuid>,
}

// Filters for the admin listing
#[derive(Debug, Clone, Default, Deserialize, IntoParams, ToSchema)]
pub struct AdminFileRecordQueryParams {
    /// Search in file name or folder name
    pub search: Option<String>,
    pub file_type: Option<String>,
    pub folder_id: Option<Uuid>,
}

/// Admin listing row: a file with its folder
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
pub struct AdminFileRecordDto {
    pub id: Uuid,
    pub name: String,
    pub file_type: String,
    #[serde(rename = "order")]
    pub display_order: i32,
    pub created_at: DateTime<Utc>,
    pub folder_id: Uuid,
    pub folder_name: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_order_defaults_to_zero() {
        let dto: CreateFileRecordDto = serde_json::from_value(serde_json::json!({
            "folder_id": Uuid::nil(),
            "name": "roads.geojson",
            "file_type": "geojson"
        }))
        .unwrap();
        assert_eq!(dto.order, 0);
        assert!(dto.validate().is_ok());
    }

    #[test]
    fn test_validation_rejects_blank_name() {
        let dto = UpdateFileRecordDto {
            name: Some(String::new()),
            ..Default::default()
        };
        assert!(dto.validate().is_err());
        assert!(UpdateFileRecordDto::default().validate().is_ok());
    }

    #[test]
    fn test_replace_sets_every_field() {
        let update = UpdateFileRecordDto::from(ReplaceFileRecordDto {
            name: "a".to_string(),
            file_type: "kml".to_string(),
            order: 0,
            folder_id: None,
        });
        assert_eq!(update.order, Some(0));
        assert_eq!(update.file_type.as_deref(), Some("kml"));
    }
}
