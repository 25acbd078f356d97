use crate::core::error::Result;
use crate::core::extractor::MaybeUser;
use crate::features::auth::dtos::{AnonymousUserDto, UserInfoResponse};
use crate::features::auth::services::AccountService;
use crate::shared::constants::CSRF_COOKIE_NAME;
use axum::{
    extract::State,
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};
use std::sync::Arc;
use uuid::Uuid;

/// Get the signed-in user, or `{"isAuthenticated": false}` without a valid token
#[utoipa::path(
    get,
    path = "/api/auth/user/",
    responses(
        (status = 200, description = "Current user or anonymous marker", body = UserInfoResponse)
    ),
    tag = "auth",
    security(
        (),
        ("bearer_auth" = [])
    )
)]
pub async fn get_user_info(
    MaybeUser(user): MaybeUser,
    State(service): State<Arc<AccountService>>,
) -> Result<Json<UserInfoResponse>> {
    let Some(user) = user else {
        return Ok(Json(UserInfoResponse::Anonymous(AnonymousUserDto::default())));
    };

    let info = service.user_info(user.user_id).await?;
    Ok(Json(UserInfoResponse::Authenticated(info)))
}

/// Issue a CSRF cookie for browser clients
#[utoipa::path(
    get,
    path = "/api/csrf/",
    responses(
        (status = 200, description = "CSRF cookie set; empty body")
    ),
    tag = "auth"
)]
pub async fn get_csrf_token() -> impl IntoResponse {
    let token = Uuid::new_v4().simple().to_string();
    (
        StatusCode::OK,
        [(
            header::SET_COOKIE,
            format!("{}={}; Path=/; SameSite=Lax", CSRF_COOKIE_NAME, token),
        )],
    )
}
