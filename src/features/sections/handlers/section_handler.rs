use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use std::sync::Arc;
use uuid::Uuid;
use validator::Validate;

use crate::core::error::{AppError, Result};
use crate::core::extractor::AppJson;
use crate::features::auth::model::AuthenticatedUser;
use crate::features::folders::dtos::{FolderDto, NewFolderDto};
use crate::features::folders::FolderService;
use crate::features::sections::dtos::{
    NewSectionDto, SectionDto, SectionTreeDto, UpdateSectionDto,
};
use crate::features::sections::services::SectionService;
use crate::shared::types::{ApiResponse, Meta};

/// List the caller's sections with nested folders and files
#[utoipa::path(
    get,
    path = "/api/sections/",
    responses(
        (status = 200, description = "Sections retrieved successfully", body = ApiResponse<Vec<SectionDto>>),
        (status = 401, description = "Unauthorized")
    ),
    tag = "sections",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn list_sections(
    user: AuthenticatedUser,
    State(service): State<Arc<SectionService>>,
) -> Result<Json<ApiResponse<Vec<SectionDto>>>> {
    let sections = service.list(user.user_id).await?;
    let total = sections.len() as i64;
    Ok(Json(ApiResponse::success(
        Some(sections),
        None,
        Some(Meta { total }),
    )))
}

/// Create a section
#[utoipa::path(
    post,
    path = "/api/sections/",
    request_body = NewSectionDto,
    responses(
        (status = 201, description = "Section created successfully", body = ApiResponse<SectionDto>),
        (status = 400, description = "Validation error")
    ),
    tag = "sections",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn create_section(
    user: AuthenticatedUser,
    State(service): State<Arc<SectionService>>,
    AppJson(dto): AppJson<NewSectionDto>,
) -> Result<(StatusCode, Json<ApiResponse<SectionDto>>)> {
    dto.validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let section = service.create(user.user_id, dto).await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(Some(section), None, None)),
    ))
}

/// Full Section → Folder → File tree of the caller
#[utoipa::path(
    get,
    path = "/api/sections/tree/",
    responses(
        (status = 200, description = "Tree retrieved successfully", body = ApiResponse<Vec<SectionTreeDto>>),
        (status = 401, description = "Unauthorized")
    ),
    tag = "sections",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn get_tree(
    user: AuthenticatedUser,
    State(service): State<Arc<SectionService>>,
) -> Result<Json<ApiResponse<Vec<SectionTreeDto>>>> {
    let tree = service.tree(user.user_id).await?;
    Ok(Json(ApiResponse::success(Some(tree), None, None)))
}

/// Get one of the caller's sections
#[utoipa::path(
    get,
    path = "/api/sections/{id}/",
    params(
        ("id" = Uuid, Path, description = "Section ID")
    ),
    responses(
        (status = 200, description = "Section retrieved successfully", body = ApiResponse<SectionDto>),
        (status = 404, description = "Section not found")
    ),
    tag = "sections",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn get_section(
    user: AuthenticatedUser,
    State(service): State<Arc<SectionService>>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<SectionDto>>> {
    let section = service.get(user.user_id, id).await?;
    Ok(Json(ApiResponse::success(Some(section), None, None)))
}

/// Replace a section's fields
#[utoipa::path(
    put,
    path = "/api/sections/{id}/",
    params(
        ("id" = Uuid, Path, description = "Section ID")
    ),
    request_body = NewSectionDto,
    responses(
        (status = 200, description = "Section updated successfully", body = ApiResponse<SectionDto>),
        (status = 400, description = "Validation error"),
        (status = 404, description = "Section not found")
    ),
    tag = "sections",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn replace_section(
    user: AuthenticatedUser,
    State(service): State<Arc<SectionService>>,
    Path(id): Path<Uuid>,
    AppJson(dto): AppJson<NewSectionDto>,
) -> Result<Json<ApiResponse<SectionDto>>> {
    dto.validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let section = service.update(user.user_id, id, dto.into()).await?;
    Ok(Json(ApiResponse::success(Some(section), None, None)))
}

/// Update some of a section's fields
#[utoipa::path(
    patch,
    path = "/api/sections/{id}/",
    params(
        ("id" = Uuid, Path, description = "Section ID")
    ),
    request_body = UpdateSectionDto,
    responses(
        (status = 200, description = "Section updated successfully", body = ApiResponse<SectionDto>),
        (status = 400, description = "Validation error"),
        (status = 404, description = "Section not found")
    ),
    tag = "sections",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn update_section(
    user: AuthenticatedUser,
    State(service): State<Arc<SectionService>>,
    Path(id): Path<Uuid>,
    AppJson(dto): AppJson<UpdateSectionDto>,
) -> Result<Json<ApiResponse<SectionDto>>> {
    dto.validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let section = service.update(user.user_id, id, dto).await?;
    Ok(Json(ApiResponse::success(Some(section), None, None)))
}

/// Delete one of the caller's sections with its folders and files
#[utoipa::path(
    delete,
    path = "/api/sections/{id}/",
    params(
        ("id" = Uuid, Path, description = "Section ID")
    ),
    responses(
        (status = 204, description = "Section deleted"),
        (status = 404, description = "Section not found")
    ),
    tag = "sections",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn delete_section(
    user: AuthenticatedUser,
    State(service): State<Arc<SectionService>>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode> {
    service.delete(user.user_id, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Add a folder to one of the caller's sections
#[utoipa::path(
    post,
    path = "/api/sections/{id}/add_folder/",
    params(
        ("id" = Uuid, Path, description = "Section ID")
    ),
    request_body = NewFolderDto,
    responses(
        (status = 201, description = "Folder created successfully", body = ApiResponse<FolderDto>),
        (status = 400, description = "Validation error"),
        (status = 404, description = "Section not found")
    ),
    tag = "sections",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn add_folder(
    user: AuthenticatedUser,
    State(folders): State<Arc<FolderService>>,
    Path(id): Path<Uuid>,
    AppJson(dto): AppJson<NewFolderDto>,
) -> Result<(StatusCode, Json<ApiResponse<FolderDto>>)> {
    dto.validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let folder = folders.create(user.user_id, id, dto).await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(Some(folder), None, None)),
    ))
}
