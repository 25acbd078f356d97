use axum::{
    extract::{Query, State},
    Json,
};
use std::sync::Arc;

use crate::core::error::Result;
use crate::features::auth::guards::RequireStaff;
use crate::features::folders::dtos::{AdminFolderDto, AdminFolderQueryParams};
use crate::features::folders::services::FolderService;
use crate::shared::types::{ApiResponse, Meta, PaginationQuery};

/// List every user's folders (staff only)
#[utoipa::path(
    get,
    path = "/api/admin/folders",
    params(PaginationQuery, AdminFolderQueryParams),
    responses(
        (status = 200, description = "Folders retrieved successfully", body = ApiResponse<Vec<AdminFolderDto>>),
        (status = 403, description = "Forbidden - staff only")
    ),
    tag = "admin",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn admin_list_folders(
    RequireStaff(_user): RequireStaff,
    State(service): State<Arc<FolderService>>,
    Query(page): Query<PaginationQuery>,
    Query(params): Query<AdminFolderQueryParams>,
) -> Result<Json<ApiResponse<Vec<AdminFolderDto>>>> {
    let (folders, total) = service.admin_list(&page, &params).await?;
    Ok(Json(ApiResponse::success(
        Some(folders),
        None,
        Some(Meta { total }),
    )))
}
