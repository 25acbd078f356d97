use axum::{routing::get, Router};
use std::sync::Arc;

use crate::features::tables::{handlers, services::TableService};

/// Admin routes for the backing-table catalog (staff only)
pub fn admin_routes(service: Arc<TableService>) -> Router {
    Router::new()
        .route("/api/admin/tables", get(handlers::list_tables))
        .route(
            "/api/admin/tables/{name}",
            get(handlers::get_table).delete(handlers::delete_table),
        )
        .with_state(service)
}
