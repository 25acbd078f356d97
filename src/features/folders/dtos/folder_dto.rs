use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::collections::HashMap;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use crate::features::file_records::dtos::FileRecordDto;
use crate::features::folders::models::Folder;

/// Response DTO for a folder with its files
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct FolderDto {
    pub id: Uuid,
    pub section_id: Uuid,
    pub name: String,
    pub order: i32,
    pub files: Vec<FileRecordDto>,
    pub created_at: DateTime<Utc>,
}

impl From<Folder> for FolderDto {
    fn from(f: Folder) -> Self {
        Self {
            id: f.id,
            section_id: f.section_id,
            name: f.name,
            order: f.display_order,
            files: Vec::new(),
            created_at: f.created_at,
        }
    }
}

impl FolderDto {
    /// Attach files to their folders, keeping the input order of both lists
    pub fn assemble(folders: Vec<Folder>, files: Vec<FileRecordDto>) -> Vec<FolderDto> {
        let mut by_folder: HashMap<Uuid, Vec<FileRecordDto>> = HashMap::new();
        for file in files {
            by_folder.entry(file.folder_id).or_default().push(file);
        }

        folders
            .into_iter()
            .map(|f| FolderDto {
                files: by_folder.remove(&f.id).unwrap_or_default(),
                ..FolderDto::from(f)
            })
            .collect()
    }
}

/// Folder fields shared by every create path
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct NewFolderDto {
    #[validate(length(min = 1, max = 255))]
    pub name: String,

    #[serde(default)]
    pub order: i32,
}

/// Create request for `POST /api/folders/`
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateFolderDto {
    pub section_id: Uuid,

    #[validate(length(min = 1, max = 255))]
    pub name: String,

    #[serde(default)]
    pub order: i32,
}

impl CreateFolderDto {
    pub fn into_parts(self) -> (Uuid, NewFolderDto) {
        (
            self.section_id,
            NewFolderDto {
                name: self.name,
                order: self.order,
            },
        )
    }
}

/// Full replacement (PUT)
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct ReplaceFolderDto {
    #[validate(length(min = 1, max = 255))]
    pub name: String,

    #[serde(default)]
    pub order: i32,

    /// Move the folder to another of the caller's sections
    pub section_id: Option<Uuid>,
}

/// Partial update (PATCH)
#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
pub struct UpdateFolderDto {
    #[validate(length(min = 1, max = 255))]
    pub name: Option<String>,

    pub order: Option<i32>,

    pub section_id: Option<Uuid>,
}

impl From<ReplaceFolderDto> for UpdateFolderDto {
    fn from(dto: ReplaceFolderDto) -> Self {
        Self {
            name: Some(dto.name),
            order: Some(dto.order),
            section_id: dto.section_id,
        }
    }
}

// Query params for listing the caller's folders
#[derive(Debug, Clone, Default, Deserialize, IntoParams, ToSchema)]
pub struct FolderQueryParams {
    /// Only folders inside this section
    pub section_id: Option<Uuid>,
}

// Filters for the admin listing
#[derive(Debug, Clone, Default, Deserialize, IntoParams, ToSchema)]
pub struct AdminFolderQueryParams {
    /// Search in folder name or section name
    pub search: Option<String>,
    pub section_id: Option<Uuid>,
}

/// Admin listing row: a folder with its section and file count
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
pub struct AdminFolderDto {
    pub id: Uuid,
    pub name: String,
    #[serde(rename = "order")]
    pub display_order: i32,
    pub created_at: DateTime<Utc>,
    pub section_id: Uuid,
    pub section_name: String,
    pub file_count: i64,
}
