use axum::{
    extract::{Query, State},
    Json,
};
use std::sync::Arc;

use crate::core::error::Result;
use crate::features::auth::guards::RequireStaff;
use crate::features::sections::dtos::{AdminSectionDto, AdminSectionQueryParams};
use crate::features::sections::services::SectionService;
use crate::shared::types::{ApiResponse, Meta, PaginationQuery};

/// List every user's sections (staff only)
#[utoipa::path(
    get,
    path = "/api/admin/sections",
    params(PaginationQuery, AdminSectionQueryParams),
    responses(
        (status = 200, description = "Sections retrieved successfully", body = ApiResponse<Vec<AdminSectionDto>>),
        (status = 403, description = "Forbidden - staff only")
    ),
    tag = "admin",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn admin_list_sections(
    RequireStaff(_user): RequireStaff,
    State(service): State<Arc<SectionService>>,
    Query(page): Query<PaginationQuery>,
    Query(params): Query<AdminSectionQueryParams>,
) -> Result<Json<ApiResponse<Vec<AdminSectionDto>>>> {
    let (sections, total) = service.admin_list(&page, &params).await?;
    Ok(Json(ApiResponse::success(
        Some(sections),
        None,
        Some(Meta { total }),
    )))
}
