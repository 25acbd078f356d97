use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;

use crate::features::folders::FolderService;
use crate::features::sections::{handlers, services::SectionService};

/// Routes for the caller's sections (authentication required)
pub fn routes(service: Arc<SectionService>, folders: Arc<FolderService>) -> Router {
    let section_routes = Router::new()
        .route(
            "/api/sections/",
            get(handlers::list_sections).post(handlers::create_section),
        )
        .route("/api/sections/tree/", get(handlers::get_tree))
        .route(
            "/api/sections/{id}/",
            get(handlers::get_section)
                .put(handlers::replace_section)
                .patch(handlers::update_section)
                .delete(handlers::delete_section),
        )
        .with_state(service);

    let folder_routes = Router::new()
        .route("/api/sections/{id}/add_folder/", post(handlers::add_folder))
        .with_state(folders);

    section_routes.merge(folder_routes)
}

/// Admin routes for sections across all users (staff only)
pub fn admin_routes(service: Arc<SectionService>) -> Router {
    Router::new()
        .route("/api/admin/sections", get(handlers::admin_list_sections))
        .with_state(service)
}
