use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use std::sync::Arc;
use uuid::Uuid;
use validator::Validate;

use crate::core::error::{AppError, Result};
use crate::core::extractor::AppJson;
use crate::features::auth::model::AuthenticatedUser;
use crate::features::file_records::dtos::{
    CreateFileRecordDto, FileRecordDto, FileRecordQueryParams, ReplaceFileRecordDto,
    UpdateFileRecordDto,
};
use crate::features::file_records::services::FileRecordService;
use crate::shared::types::{ApiResponse, Meta};

/// List the caller's files
#[utoipa::path(
    get,
    path = "/api/files/",
    params(FileRecordQueryParams),
    responses(
        (status = 200, description = "Files retrieved successfully", body = ApiResponse<Vec<FileRecordDto>>),
        (status = 401, description = "Unauthorized")
    ),
    tag = "files",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn list_files(
    user: AuthenticatedUser,
    State(service): State<Arc<FileRecordService>>,
    Query(params): Query<FileRecordQueryParams>,
) -> Result<Json<ApiResponse<Vec<FileRecordDto>>>> {
    let files = service.list(user.user_id, params.folder_id).await?;
    let total = files.len() as i64;
    Ok(Json(ApiResponse::success(
        Some(files),
        None,
        Some(Meta { total }),
    )))
}

/// Create a file in one of the caller's folders
#[utoipa::path(
    post,
    path = "/api/files/",
    request_body = CreateFileRecordDto,
    responses(
        (status = 201, description = "File created successfully", body = ApiResponse<FileRecordDto>),
        (status = 400, description = "Validation error"),
        (status = 404, description = "Folder not found")
    ),
    tag = "files",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn create_file(
    user: AuthenticatedUser,
    State(service): State<Arc<FileRecordService>>,
    AppJson(dto): AppJson<CreateFileRecordDto>,
) -> Result<(StatusCode, Json<ApiResponse<FileRecordDto>>)> {
    dto.validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let (folder_id, new_file) = dto.into_parts();
    let file = service.create(user.user_id, folder_id, new_file).await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(Some(file), None, None)),
    ))
}

/// Get one of the caller's files
#[utoipa::path(
    get,
    path = "/api/files/{id}/",
    params(
        ("id" = Uuid, Path, description = "File ID")
    ),
    responses(
        (status = 200, description = "File retrieved successfully", body = ApiResponse<FileRecordDto>),
        (status = 404, description = "File not found")
    ),
    tag = "files",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn get_file(
    user: AuthenticatedUser,
    State(service): State<Arc<FileRecordService>>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<FileRecordDto>>> {
    let file = service.get(user.user_id, id).await?;
    Ok(Json(ApiResponse::success(Some(file), None, None)))
}

/// Replace a file's fields
#[utoipa::path(
    put,
    path = "/api/files/{id}/",
    params(
        ("id" = Uuid, Path, description = "File ID")
    ),
    request_body = ReplaceFileRecordDto,
    responses(
        (status = 200, description = "File updated successfully", body = ApiResponse<FileRecordDto>),
        (status = 400, description = "Validation error"),
        (status = 404, description = "File or target folder not found")
    ),
    tag = "files",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn replace_file(
    user: AuthenticatedUser,
    State(service): State<Arc<FileRecordService>>,
    Path(id): Path<Uuid>,
    AppJson(dto): AppJson<ReplaceFileRecordDto>,
) -> Result<Json<ApiResponse<FileRecordDto>>> {
    dto.validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let file = service.update(user.user_id, id, dto.into()).await?;
    Ok(Json(ApiResponse::success(Some(file), None, None)))
}

/// Update some of a file's fields
#[utoipa::path(
    patch,
    path = "/api/files/{id}/",
    params(
        ("id" = Uuid, Path, description = "File ID")
    ),
    request_body = UpdateFileRecordDto,
    responses(
        (status = 200, description = "File updated successfully", body = ApiResponse<FileRecordDto>),
        (status = 400, description = "Validation error"),
        (status = 404, description = "File or target folder not found")
    ),
    tag = "files",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn update_file(
    user: AuthenticatedUser,
    State(service): State<Arc<FileRecordService>>,
    Path(id): Path<Uuid>,
    AppJson(dto): AppJson<UpdateFileRecordDto>,
) -> Result<Json<ApiResponse<FileRecordDto>>> {
    dto.validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let file = service.update(user.user_id, id, dto).await?;
    Ok(Json(ApiResponse::success(Some(file), None, None)))
}

/// Delete one of the caller's files
#[utoipa::path(
    delete,
    path = "/api/files/{id}/",
    params(
        ("id" = Uuid, Path, description = "File ID")
    ),
    responses(
        (status = 204, description = "File deleted"),
        (status = 404, description = "File not found")
    ),
    tag = "files",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn delete_file(
    user: AuthenticatedUser,
    State(service): State<Arc<FileRecordService>>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode> {
    service.delete(user.user_id, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
