use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;

use crate::features::file_records::FileRecordService;
use crate::features::folders::{handlers, services::FolderService};

/// Routes for the caller's folders (authentication required)
pub fn routes(service: Arc<FolderService>, files: Arc<FileRecordService>) -> Router {
    let folder_routes = Router::new()
        .route(
            "/api/folders/",
            get(handlers::list_folders).post(handlers::create_folder),
        )
        .route(
            "/api/folders/{id}/",
            get(handlers::get_folder)
                .put(handlers::replace_folder)
                .patch(handlers::update_folder)
                .delete(handlers::delete_folder),
        )
        .with_state(service);

    let file_routes = Router::new()
        .route("/api/folders/{id}/add_file/", post(handlers::add_file))
        .with_state(files);

    folder_routes.merge(file_routes)
}

/// Admin routes for folders across all users (staff only)
pub fn admin_routes(service: Arc<FolderService>) -> Router {
    Router::new()
        .route("/api/admin/folders", get(handlers::admin_list_folders))
        .with_state(service)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::test_helpers::{create_test_user, lazy_pool, with_user};
    use axum::http::StatusCode;
    use axum_test::TestServer;
    use uuid::Uuid;

    fn router() -> Router {
        let files = Arc::new(FileRecordService::new(lazy_pool()));
        let folders = Arc::new(FolderService::new(lazy_pool(), Arc::clone(&files)));
        routes(folders, files)
    }

    #[tokio::test]
    async fn test_folders_require_authentication() {
        let server = TestServer::new(router()).unwrap();
        server
            .get("/api/folders/")
            .await
            .assert_status(StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_create_folder_validates_before_querying() {
        let app = with_user(router(), create_test_user(Uuid::new_v4()));
        let server = TestServer::new(app).unwrap();

        let response = server
            .post("/api/folders/")
            .json(&serde_json::json!({ "section_id": Uuid::new_v4(), "name": "" }))
            .await;
        response.assert_status(StatusCode::BAD_REQUEST);

        let response = server
            .post(&format!("/api/folders/{}/add_file/", Uuid::new_v4()))
            .json(&serde_json::json!({ "name": "roads" }))
            .await;
        response.assert_status(StatusCode::BAD_REQUEST);
    }
}
