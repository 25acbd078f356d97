use axum::{
    extract::{Query, State},
    Json,
};
use std::sync::Arc;

use crate::core::error::Result;
use crate::features::auth::guards::RequireStaff;
use crate::features::file_records::dtos::{AdminFileRecordDto, AdminFileRecordQueryParams};
use crate::features::file_records::services::FileRecordService;
use crate::shared::types::{ApiResponse, Meta, PaginationQuery};

/// List every user's files (staff only)
#[utoipa::path(
    get,
    path = "/api/admin/files",
    params(PaginationQuery, AdminFileRecordQueryParams),
    responses(
        (status = 200, description = "Files retrieved successfully", body = ApiResponse<Vec<AdminFileRecordDto>>),
        (status = 403, description = "Forbidden - staff only")
    ),
    tag = "admin",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn admin_list_files(
    RequireStaff(_user): RequireStaff,
    State(service): State<Arc<FileRecordService>>,
    Query(page): Query<PaginationQuery>,
    Query(params): Query<AdminFileRecordQueryParams>,
) -> Result<Json<ApiResponse<Vec<AdminFileRecordDto>>>> {
    let (files, total) = service.admin_list(&page, &params).await?;
    Ok(Json(ApiResponse::success(
        Some(files),
        None,
        Some(Meta { total }),
    )))
}
