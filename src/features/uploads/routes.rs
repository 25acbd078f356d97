use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use std::sync::Arc;

use crate::features::uploads::{handlers, services::UploadService};

/// Public upload endpoint; the uploader is recorded when a valid token is sent
pub fn routes(service: Arc<UploadService>, max_body_size: usize) -> Router {
    Router::new()
        .route(
            "/api/upload/",
            post(handlers::upload_file)
                .fallback(handlers::upload_method_not_allowed)
                .layer(DefaultBodyLimit::max(max_body_size)),
        )
        .with_state(service)
}

/// Staff routes over every uploaded file
pub fn admin_routes(service: Arc<UploadService>) -> Router {
    Router::new()
        .route("/api/admin/uploads", get(handlers::admin_list_uploads))
        .route(
            "/api/admin/uploads/{id}",
            get(handlers::admin_get_upload).delete(handlers::admin_delete_upload),
        )
        .route(
            "/api/admin/uploads/{id}/download",
            get(handlers::admin_download_upload),
        )
        .with_state(service)
}
