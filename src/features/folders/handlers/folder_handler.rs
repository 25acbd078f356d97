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
use crate::features::file_records::dtos::{FileRecordDto, NewFileRecordDto};
use crate::features::file_records::FileRecordService;
use crate::features::folders::dtos::{
    CreateFolderDto, FolderDto, FolderQueryParams, ReplaceFolderDto, UpdateFolderDto,
};
use crate::features::folders::services::FolderService;
use crate::shared::types::{ApiResponse, Meta};

/// List the caller's folders with their files
#[utoipa::path(
    get,
    path = "/api/folders/",
    params(FolderQueryParams),
    responses(
        (status = 200, description = "Folders retrieved successfully", body = ApiResponse<Vec<FolderDto>>),
        (status = 401, description = "Unauthorized")
    ),
    tag = "folders",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn list_folders(
    user: AuthenticatedUser,
    State(service): State<Arc<FolderService>>,
    Query(params): Query<FolderQueryParams>,
) -> Result<Json<ApiResponse<Vec<FolderDto>>>> {
    let folders = service.list(user.user_id, params.section_id).await?;
    let total = folders.len() as i64;
    Ok(Json(ApiResponse::success(
        Some(folders),
        None,
        Some(Meta { total }),
    )))
}

/// Create a folder in one of the caller's sections
#[utoipa::path(
    post,
    path = "/api/folders/",
    request_body = CreateFolderDto,
    responses(
        (status = 201, description = "Folder created successfully", body = ApiResponse<FolderDto>),
        (status = 400, description = "Validation error"),
        (status = 404, description = "Section not found")
    ),
    tag = "folders",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn create_folder(
    user: AuthenticatedUser,
    State(service): State<Arc<FolderService>>,
    AppJson(dto): AppJson<CreateFolderDto>,
) -> Result<(StatusCode, Json<ApiResponse<FolderDto>>)> {
    dto.validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let (section_id, new_folder) = dto.into_parts();
    let folder = service.create(user.user_id, section_id, new_folder).await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(Some(folder), None, None)),
    ))
}

/// Get one of the caller's folders
#[utoipa::path(
    get,
    path = "/api/folders/{id}/",
    params(
        ("id" = Uuid, Path, description = "Folder ID")
    ),
    responses(
        (status = 200, description = "Folder retrieved successfully", body = ApiResponse<FolderDto>),
        (status = 404, description = "Folder not found")
    ),
    tag = "folders",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn get_folder(
    user: AuthenticatedUser,
    State(service): State<Arc<FolderService>>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<FolderDto>>> {
    let folder = service.get(user.user_id, id).await?;
    Ok(Json(ApiResponse::success(Some(folder), None, None)))
}

/// Replace a folder's fields
#[utoipa::path(
    put,
    path = "/api/folders/{id}/",
    params(
        ("id" = Uuid, Path, description = "Folder ID")
    ),
    request_body = ReplaceFolderDto,
    responses(
        (status = 200, description = "Folder updated successfully", body = ApiResponse<FolderDto>),
        (status = 400, description = "Validation error"),
        (status = 404, description = "Folder or target section not found")
    ),
    tag = "folders",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn replace_folder(
    user: AuthenticatedUser,
    State(service): State<Arc<FolderService>>,
    Path(id): Path<Uuid>,
    AppJson(dto): AppJson<ReplaceFolderDto>,
) -> Result<Json<ApiResponse<FolderDto>>> {
    dto.validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let folder = service.update(user.user_id, id, dto.into()).await?;
    Ok(Json(ApiResponse::success(Some(folder), None, None)))
}

/// Update some of a folder's fields
#[utoipa::path(
    patch,
    path = "/api/folders/{id}/",
    params(
        ("id" = Uuid, Path, description = "Folder ID")
    ),
    request_body = UpdateFolderDto,
    responses(
        (status = 200, description = "Folder updated successfully", body = ApiResponse<FolderDto>),
        (status = 400, description = "Validation error"),
        (status = 404, description = "Folder or target section not found")
    ),
    tag = "folders",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn update_folder(
    user: AuthenticatedUser,
    State(service): State<Arc<FolderService>>,
    Path(id): Path<Uuid>,
    AppJson(dto): AppJson<UpdateFolderDto>,
) -> Result<Json<ApiResponse<FolderDto>>> {
    dto.validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let folder = service.update(user.user_id, id, dto).await?;
    Ok(Json(ApiResponse::success(Some(folder), None, None)))
}

/// Delete one of the caller's folders and its files
#[utoipa::path(
    delete,
    path = "/api/folders/{id}/",
    params(
        ("id" = Uuid, Path, description = "Folder ID")
    ),
    responses(
        (status = 204, description = "Folder deleted"),
        (status = 404, description = "Folder not found")
    ),
    tag = "folders",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn delete_folder(
    user: AuthenticatedUser,
    State(service): State<Arc<FolderService>>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode> {
    service.delete(user.user_id, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Add a file to one of the caller's folders
#[utoipa::path(
    post,
    path = "/api/folders/{id}/add_file/",
    params(
        ("id" = Uuid, Path, description = "Folder ID")
    ),
    request_body = NewFileRecordDto,
    responses(
        (status = 201, description = "File created successfully", body = ApiResponse<FileRecordDto>),
        (status = 400, description = "Validation error"),
        (status = 404, description = "Folder not found")
    ),
    tag = "folders",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn add_file(
    user: AuthenticatedUser,
    State(files): State<Arc<FileRecordService>>,
    Path(id): Path<Uuid>,
    AppJson(dto): AppJson<NewFileRecordDto>,
) -> Result<(StatusCode, Json<ApiResponse<FileRecordDto>>)> {
    dto.validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let file = files.create(user.user_id, id, dto).await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(Some(file), None, None)),
    ))
}
