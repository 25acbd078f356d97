use axum::{routing::get, Router};
use std::sync::Arc;

use crate::features::file_records::{handlers, services::FileRecordService};

/// Routes for the caller's files (authentication required)
pub fn routes(service: Arc<FileRecordService>) -> Router {
    Router::new()
        .route(
            "/api/files/",
            get(handlers::list_files).post(handlers::create_file),
        )
        .route(
            "/api/files/{id}/",
            get(handlers::get_file)
                .put(handlers::replace_file)
                .patch(handlers::update_file)
                .delete(handlers::delete_file),
        )
        .with_state(service)
}

/// Admin routes for files across all users (staff only)
pub fn admin_routes(service: Arc<FileRecordService>) -> Router {
    Router::new()
        .route("/api/admin/files", get(handlers::admin_list_files))
        .with_state(service)
}
