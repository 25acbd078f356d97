use axum::{
    extract::{Path, Query, State},
    Json,
};
use std::sync::Arc;

use crate::core::error::Result;
use crate::features::auth::guards::RequireStaff;
use crate::features::tables::dtos::{TablePreviewDto, TableQueryParams, TableSummaryDto};
use crate::features::tables::services::TableService;
use crate::shared::types::{ApiResponse, Meta};

/// List backing tables with their row counts (staff only)
#[utoipa::path(
    get,
    path = "/api/admin/tables",
    params(TableQueryParams),
    responses(
        (status = 200, description = "Tables retrieved successfully", body = ApiResponse<Vec<TableSummaryDto>>),
        (status = 403, description = "Forbidden - staff only")
    ),
    tag = "tables",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn list_tables(
    RequireStaff(_user): RequireStaff,
    State(service): State<Arc<TableService>>,
    Query(params): Query<TableQueryParams>,
) -> Result<Json<ApiResponse<Vec<TableSummaryDto>>>> {
    let tables = service.list_catalog(params.search.as_deref()).await?;
    let total = tables.len() as i64;

    Ok(Json(ApiResponse::success(
        Some(tables),
        None,
        Some(Meta { total }),
    )))
}

/// Preview a backing table: columns and up to 1000 rows (staff only)
#[utoipa::path(
    get,
    path = "/api/admin/tables/{name}",
    params(
        ("name" = String, Path, description = "Table name")
    ),
    responses(
        (status = 200, description = "Table preview", body = ApiResponse<TablePreviewDto>),
        (status = 403, description = "Forbidden - staff only or internal table"),
        (status = 404, description = "Table not found")
    ),
    tag = "tables",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn get_table(
    RequireStaff(_user): RequireStaff,
    State(service): State<Arc<TableService>>,
    Path(name): Path<String>,
) -> Result<Json<ApiResponse<TablePreviewDto>>> {
    let preview = service.preview(&name).await?;
    Ok(Json(ApiResponse::success(Some(preview), None, None)))
}

/// Drop a backing table (staff only)
#[utoipa::path(
    delete,
    path = "/api/admin/tables/{name}",
    params(
        ("name" = String, Path, description = "Table name")
    ),
    responses(
        (status = 200, description = "Table dropped"),
        (status = 403, description = "Forbidden - staff only or internal table"),
        (status = 404, description = "Table not found")
    ),
    tag = "tables",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn delete_table(
    RequireStaff(_user): RequireStaff,
    State(service): State<Arc<TableService>>,
    Path(name): Path<String>,
) -> Result<Json<ApiResponse<()>>> {
    service.drop_table(&name).await?;
    Ok(Json(ApiResponse::success(
        None,
        Some(format!("Table {} dropped", name)),
        None,
    )))
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use axum_test::TestServer;

    use crate::features::tables::routes;
    use crate::features::tables::services::TableService;
    use crate::shared::test_helpers::{create_staff_user, create_test_user, lazy_pool, with_user};
    use std::sync::Arc;
    use uuid::Uuid;

    fn router() -> axum::Router {
        routes::admin_routes(Arc::new(TableService::new(lazy_pool())))
    }

    #[tokio::test]
    async fn test_tables_require_authentication() {
        let server = TestServer::new(router()).unwrap();
        let response = server.get("/api/admin/tables").await;
        response.assert_status(StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_tables_require_staff() {
        let app = with_user(router(), create_test_user(Uuid::new_v4()));
        let server = TestServer::new(app).unwrap();

        let response = server.delete("/api/admin/tables/roads").await;
        response.assert_status(StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_internal_tables_are_refused_before_touching_the_database() {
        let app = with_user(router(), create_staff_user());
        let server = TestServer::new(app).unwrap();

        let response = server.delete("/api/admin/tables/core_users").await;
        response.assert_status(StatusCode::FORBIDDEN);
        let body = response.json::<serde_json::Value>();
        assert_eq!(body["success"], false);
    }
}
