use axum::{middleware::from_fn_with_state, Router};
use std::sync::Arc;
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};
use utoipa_swagger_ui::SwaggerUi;

use crate::core::config::SwaggerConfig;
use crate::core::middleware::basic_auth_middleware;

use crate::features::auth::{dtos as auth_dtos, handlers as auth_handlers};
use crate::features::file_records::{dtos as files_dtos, handlers as files_handlers};
use crate::features::folders::{dtos as folders_dtos, handlers as folders_handlers};
use crate::features::sections::{dtos as sections_dtos, handlers as sections_handlers};
use crate::features::tables::{dtos as tables_dtos, handlers as tables_handlers};
use crate::features::uploads::{dtos as uploads_dtos, handlers as uploads_handlers};
use crate::shared::types::{ApiResponse, Meta};

#[derive(OpenApi)]
#[openapi(
    paths(
        // Auth
        auth_handlers::get_user_info,
        auth_handlers::get_csrf_token,
        // Upload (public)
        uploads_handlers::upload_file,
        // Sections
        sections_handlers::list_sections,
        sections_handlers::create_section,
        sections_handlers::get_tree,
        sections_handlers::get_section,
        sections_handlers::replace_section,
        sections_handlers::update_section,
        sections_handlers::delete_section,
        sections_handlers::add_folder,
        // Folders
        folders_handlers::list_folders,
        folders_handlers::create_folder,
        folders_handlers::get_folder,
        folders_handlers::replace_folder,
        folders_handlers::update_folder,
        folders_handlers::delete_folder,
        folders_handlers::add_file,
        // Files
        files_handlers::list_files,
        files_handlers::create_file,
        files_handlers::get_file,
        files_handlers::replace_file,
        files_handlers::update_file,
        files_handlers::delete_file,
        // Admin
        sections_handlers::admin_list_sections,
        folders_handlers::admin_list_folders,
        files_handlers::admin_list_files,
        uploads_handlers::admin_list_uploads,
        uploads_handlers::admin_get_upload,
        uploads_handlers::admin_download_upload,
        uploads_handlers::admin_delete_upload,
        // Tables
        tables_handlers::list_tables,
        tables_handlers::get_table,
        tables_handlers::delete_table,
    ),
    components(
        schemas(
            // Shared
            Meta,
            // Auth
            auth_dtos::UserInfoDto,
            auth_dtos::AnonymousUserDto,
            auth_dtos::UserInfoResponse,
            // Uploads
            uploads_dtos::UploadFormDto,
            uploads_dtos::UploadResponseDto,
            uploads_dtos::UploadErrorDto,
            uploads_dtos::UploadedFileDto,
            ApiResponse<Vec<uploads_dtos::UploadedFileDto>>,
            ApiResponse<uploads_dtos::UploadedFileDto>,
            // Sections
            sections_dtos::SectionDto,
            sections_dtos::SectionTreeDto,
            sections_dtos::NewSectionDto,
            sections_dtos::UpdateSectionDto,
            sections_dtos::AdminSectionDto,
            ApiResponse<Vec<sections_dtos::SectionDto>>,
            ApiResponse<sections_dtos::SectionDto>,
            ApiResponse<Vec<sections_dtos::SectionTreeDto>>,
            ApiResponse<Vec<sections_dtos::AdminSectionDto>>,
            // Folders
            folders_dtos::FolderDto,
            folders_dtos::NewFolderDto,
            folders_dtos::CreateFolderDto,
            folders_dtos::ReplaceFolderDto,
            folders_dtos::UpdateFolderDto,
            folders_dtos::AdminFolderDto,
            ApiResponse<Vec<folders_dtos::FolderDto>>,
            ApiResponse<folders_dtos::FolderDto>,
            ApiResponse<Vec<folders_dtos::AdminFolderDto>>,
            // Files
            files_dtos::FileRecordDto,
            files_dtos::NewFileRecordDto,
            files_dtos::CreateFileRecordDto,
            files_dtos::ReplaceFileRecordDto,
            files_dtos::UpdateFileRecordDto,
            files_dtos::AdminFileRecordDto,
            ApiResponse<Vec<files_dtos::FileRecordDto>>,
            ApiResponse<files_dtos::FileRecordDto>,
            ApiResponse<Vec<files_dtos::AdminFileRecordDto>>,
            // Tables
            tables_dtos::TableSummaryDto,
            tables_dtos::TablePreviewDto,
            ApiResponse<Vec<tables_dtos::TableSummaryDto>>,
            ApiResponse<tables_dtos::TablePreviewDto>,
        )
    ),
    tags(
        (name = "auth", description = "Session and CSRF endpoints"),
        (name = "uploads", description = "Geodata file upload with CSV-to-table ingestion"),
        (name = "sections", description = "Top level of the caller's layer tree"),
        (name = "folders", description = "Folders inside a section"),
        (name = "files", description = "File records inside a folder"),
        (name = "admin", description = "Cross-user listings and upload management (staff only)"),
        (name = "tables", description = "Tables generated from CSV uploads (staff only)"),
    ),
    modifiers(&SecurityAddon),
    info(
        title = "Geolayers API",
        version = "0.1.0",
        description = "API documentation for the geodata layers backend",
    )
)]
pub struct ApiDoc;

/// Adds Bearer JWT security scheme to OpenAPI spec
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

/// Modifier to override OpenAPI info from config
pub struct SwaggerInfoModifier {
    pub title: String,
    pub version: String,
    pub description: String,
}

impl Modify for SwaggerInfoModifier {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        openapi.info.title = self.title.clone();
        openapi.info.version = self.version.clone();
        openapi.info.description = Some(self.description.clone());
    }
}

/// Swagger UI at `/swagger-ui`, behind basic auth when credentials are configured
pub fn swagger_router(config: &SwaggerConfig) -> Router {
    let mut doc = ApiDoc::openapi();
    SwaggerInfoModifier {
        title: config.title.clone(),
        version: config.version.clone(),
        description: config.description.clone(),
    }
    .modify(&mut doc);

    let router =
        Router::new().merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", doc));

    match config.credentials() {
        Some(credentials) => {
            tracing::info!("Swagger UI basic auth enabled");
            router.layer(from_fn_with_state(
                Arc::new(credentials),
                basic_auth_middleware,
            ))
        }
        None => {
            tracing::info!("Swagger UI basic auth disabled (no credentials configured)");
            router
        }
    }
}
