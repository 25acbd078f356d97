use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use std::sync::Arc;
use uuid::Uuid;

use crate::core::error::Result;
use crate::features::auth::guards::RequireStaff;
use crate::features::uploads::dtos::{UploadQueryParams, UploadedFileDto};
use crate::features::uploads::services::UploadService;
use crate::shared::types::{ApiResponse, Meta, PaginationQuery};

/// List uploaded files, newest first (staff only)
#[utoipa::path(
    get,
    path = "/api/admin/uploads",
    params(PaginationQuery, UploadQueryParams),
    responses(
        (status = 200, description = "Uploads retrieved successfully", body = ApiResponse<Vec<UploadedFileDto>>),
        (status = 403, description = "Forbidden - staff only")
    ),
    tag = "admin",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn admin_list_uploads(
    RequireStaff(_user): RequireStaff,
    State(service): State<Arc<UploadService>>,
    Query(page): Query<PaginationQuery>,
    Query(params): Query<UploadQueryParams>,
) -> Result<Json<ApiResponse<Vec<UploadedFileDto>>>> {
    let (uploads, total) = service.list(&page, &params).await?;
    Ok(Json(ApiResponse::success(
        Some(uploads),
        None,
        Some(Meta { total }),
    )))
}

#[utoipa::path(
    get,
    path = "/api/admin/uploads/{id}",
    params(
        ("id" = Uuid, Path, description = "Uploaded file ID")
    ),
    responses(
        (status = 200, description = "Upload found", body = ApiResponse<UploadedFileDto>),
        (status = 403, description = "Forbidden - staff only"),
        (status = 404, description = "Upload not found")
    ),
    tag = "admin",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn admin_get_upload(
    RequireStaff(_user): RequireStaff,
    State(service): State<Arc<UploadService>>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<UploadedFileDto>>> {
    let upload = service.get(id).await?;
    Ok(Json(ApiResponse::success(Some(upload), None, None)))
}

/// Download the stored file as an attachment (staff only)
#[utoipa::path(
    get,
    path = "/api/admin/uploads/{id}/download",
    params(
        ("id" = Uuid, Path, description = "Uploaded file ID")
    ),
    responses(
        (status = 200, description = "File contents", content_type = "application/octet-stream"),
        (status = 403, description = "Forbidden - staff only"),
        (status = 404, description = "Upload or stored object not found")
    ),
    tag = "admin",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn admin_download_upload(
    RequireStaff(_user): RequireStaff,
    State(service): State<Arc<UploadService>>,
    Path(id): Path<Uuid>,
) -> Result<Response> {
    let file = service.download(id).await?;
    let disposition = format!(
        "attachment; filename*=UTF-8''{}",
        urlencoding::encode(&file.file_name)
    );

    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, file.content_type),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        file.data,
    )
        .into_response())
}

/// Delete an upload together with its table and stored object (staff only)
#[utoipa::path(
    delete,
    path = "/api/admin/uploads/{id}",
    params(
        ("id" = Uuid, Path, description = "Uploaded file ID")
    ),
    responses(
        (status = 200, description = "Upload deleted"),
        (status = 403, description = "Forbidden - staff only"),
        (status = 404, description = "Upload not found")
    ),
    tag = "admin",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn admin_delete_upload(
    RequireStaff(_user): RequireStaff,
    State(service): State<Arc<UploadService>>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<()>>> {
    service.delete(id).await?;
    Ok(Json(ApiResponse::success(
        None,
        Some("Upload deleted".to_string()),
        None,
    )))
}
