use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::Path;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use crate::features::uploads::models::UploadedFile;
use crate::shared::constants::ALLOWED_EXTENSIONS;

/// Longest title stored on an uploaded record
pub const MAX_TITLE_LEN: usize = 255;

/// Multipart form for `POST /api/upload/` (documentation only).
///
/// The handler reads the fields straight from axum's Multipart extractor.
#[derive(Debug, ToSchema)]
#[allow(dead_code)]
pub struct UploadFormDto {
    /// File with extension .geojson, .kml, .shp, .csv or .gml
    #[schema(format = Binary, content_media_type = "application/octet-stream")]
    pub file: String,
    /// Display title; defaults to the file name without extension
    #[schema(example = "Population 2024")]
    pub title: Option<String>,
}

/// File part of an upload, read fully into memory
#[derive(Debug, Clone)]
pub struct IncomingFile {
    pub file_name: String,
    pub content_type: String,
    pub data: Vec<u8>,
}

impl IncomingFile {
    /// Lowercase extension when it is one we accept
    pub fn allowed_extension(&self) -> Option<String> {
        let ext = Path::new(&self.file_name)
            .extension()?
            .to_str()?
            .to_lowercase();
        ALLOWED_EXTENSIONS.contains(&ext.as_str()).then_some(ext)
    }

    /// Title used when the form does not carry one
    pub fn default_title(&self) -> String {
        Path::new(&self.file_name)
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or(&self.file_name)
            .to_string()
    }
}

/// Body of a successful upload
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UploadResponseDto {
    pub message: String,
    pub file_path: String,
    pub id: Uuid,
    pub title: String,
    pub file_type: String,
    /// Backing table holding the CSV rows; empty for other file types
    pub table_name: String,
    pub row_count: u64,
}

/// Body of a rejected upload
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UploadErrorDto {
    pub error: String,
}

/// Uploaded record as shown to staff
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UploadedFileDto {
    pub id: Uuid,
    pub title: String,
    pub file_path: String,
    pub file_type: String,
    pub table_name: String,
    pub uploaded_by: Option<Uuid>,
    pub uploaded_at: DateTime<Utc>,
}

impl From<UploadedFile> for UploadedFileDto {
    fn from(f: UploadedFile) -> Self {
        Self {
            id: f.id,
            title: f.title,
            file_path: f.file_path,
            file_type: f.file_type,
            table_name: f.table_name,
            uploaded_by: f.uploaded_by,
            uploaded_at: f.uploaded_at,
        }
    }
}

// Filters for the admin listing
#[derive(Debug, Clone, Default, Deserialize, IntoParams, ToSchema)]
pub struct UploadQueryParams {
    /// Search in title or file type
    pub search: Option<String>,
    /// Exact file type, e.g. `csv`
    pub file_type: Option<String>,
}
