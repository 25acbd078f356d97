use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::collections::HashMap;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use crate::features::folders::dtos::FolderDto;
use crate::features::sections::models::Section;

/// Response DTO for a section with its folders and their files
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SectionDto {
    pub id: Uuid,
    pub name: String,
    pub order: i32,
    pub folders: Vec<FolderDto>,
    pub created_at: DateTime<Utc>,
}

impl From<Section> for SectionDto {
    fn from(s: Section) -> Self {
        Self {
            id: s.id,
            name: s.name,
            order: s.display_order,
            folders: Vec::new(),
            created_at: s.created_at,
        }
    }
}

impl SectionDto {
    /// Attach folders to their sections, keeping the input order of both lists
    pub fn assemble(sections: Vec<Section>, folders: Vec<FolderDto>) -> Vec<SectionDto> {
        let mut by_section: HashMap<Uuid, Vec<FolderDto>> = HashMap::new();
        for folder in folders {
            by_section.entry(folder.section_id).or_default().push(folder);
        }

        sections
            .into_iter()
            .map(|s| SectionDto {
                folders: by_section.remove(&s.id).unwrap_or_default(),
                ..SectionDto::from(s)
            })
            .collect()
    }
}

/// Node of the caller's full Section → Folder → File tree
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SectionTreeDto {
    pub id: Uuid,
    pub name: String,
    pub order: i32,
    pub folders: Vec<FolderDto>,
}

impl From<SectionDto> for SectionTreeDto {
    fn from(s: SectionDto) -> Self {
        Self {
            id: s.id,
            name: s.name,
            order: s.order,
            folders: s.folders,
        }
    }
}

/// Section fields for create and add paths
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct NewSectionDto {
    #[validate(length(min = 1, max = 255))]
    pub name: String,

    #[serde(default)]
    pub order: i32,
}

/// Partial update (PATCH); PUT sends a full [`NewSectionDto`]
#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
pub struct UpdateSectionDto {
    #[validate(length(min = 1, max = 255))]
    pub name: Option<String>,

    pub order: Option<i32>,
}

impl From<NewSectionDto> for UpdateSectionDto {
    fn from(dto: NewSectionDto) -> Self {
        Self {
            name: Some(dto.name),
            order: Some(dto.order),
        }
    }
}

// Filters for the admin listing
#[derive(Debug, Clone, Default, Deserialize, IntoParams, ToSchema)]
pub struct AdminSectionQueryParams {
    /// Search in section name or owner email
    pub search: Option<String>,
    pub user_id: Option<Uuid>,
}

/// Admin listing row: a section with its owner and folder count
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
pub struct AdminSectionDto {
    pub id: Uuid,
    pub name: String,
    #[serde(rename = "order")]
    pub display_order: i32,
    pub created_at: DateTime<Utc>,
    pub user_id: Uuid,
    pub user_email: String,
    pub folder_count: i64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::folders::models::Folder;

    #[test]
    fn test_assemble_and_tree_shape() {
        let section = Section {
            id: Uuid::new_v4(),
            name: "Transport".to_string(),
            display_order: 2,
            created_at: Utc::now(),
        };
        let folder = FolderDto::from(Folder {
            id: Uuid::new_v4(),
            section_id: section.id,
            name: "Roads".to_string(),
            display_order: 0,
            created_at: Utc::now(),
        });

        let mut sections = SectionDto::assemble(vec![section], vec![folder]);
        assert_eq!(sections[0].folders.len(), 1);

        let tree = SectionTreeDto::from(sections.remove(0));
        let json = serde_json::to_value(&tree).unwrap();
        assert_eq!(json["order"], 2);
        assert_eq!(json["folders"][0]["name"], "Roads");
        assert!(json.get("created_at").is_none());
    }
}
