use crate::core::middleware;
use crate::features::auth::handlers;
use crate::features::auth::services::AccountService;
use crate::features::auth::Authenticator;
use axum::{routing::get, Router};
use std::sync::Arc;

/// Session endpoints; a bearer token is optional here
pub fn public_routes(service: Arc<AccountService>, authenticator: Arc<Authenticator>) -> Router {
    Router::new()
        .route("/api/auth/user/", get(handlers::get_user_info))
        .route("/api/csrf/", get(handlers::get_csrf_token))
        .with_state(service)
        .route_layer(axum::middleware::from_fn_with_state(
            authenticator,
            middleware::optional_auth_middleware,
        ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::AuthConfig;
    use crate::features::auth::{JwksClient, JwtValidator};
    use crate::shared::constants::CSRF_COOKIE_NAME;
    use crate::shared::test_helpers::lazy_pool;
    use axum::http::{header, HeaderValue, StatusCode};
    use axum_test::TestServer;
    use std::time::Duration;

    fn server() -> TestServer {
        let config = AuthConfig {
            google_client_id: "test-client".to_string(),
            issuers: vec!["https://accounts.google.com".to_string()],
            jwks_url: "http://127.0.0.1:1/certs".to_string(),
            jwks_cache_ttl: Duration::from_secs(60),
            jwt_leeway: Duration::from_secs(0),
            admin_emails: vec![],
        };
        let jwks = Arc::new(JwksClient::new(&config.jwks_url, config.jwks_cache_ttl));
        let validator = Arc::new(JwtValidator::new(jwks, &config));
        let accounts = Arc::new(AccountService::new(lazy_pool(), vec![]));
        let authenticator = Arc::new(Authenticator::new(validator, Arc::clone(&accounts)));

        TestServer::new(public_routes(accounts, authenticator)).unwrap()
    }

    #[tokio::test]
    async fn test_user_info_without_token_is_anonymous() {
        let response = server().get("/api/auth/user/").await;
        response.assert_status(StatusCode::OK);
        assert_eq!(
            response.json::<serde_json::Value>(),
            serde_json::json!({ "isAuthenticated": false })
        );
    }

    #[tokio::test]
    async fn test_malformed_token_is_treated_as_anonymous() {
        let response = server()
            .get("/api/auth/user/")
            .add_header(
                header::AUTHORIZATION,
                HeaderValue::from_static("Bearer not-a-jwt"),
            )
            .await;
        response.assert_status(StatusCode::OK);
        assert_eq!(response.json::<serde_json::Value>()["isAuthenticated"], false);
    }

    #[tokio::test]
    async fn test_csrf_sets_cookie() {
        let response = server().get("/api/csrf/").await;
        response.assert_status(StatusCode::OK);

        let cookie = response.header(header::SET_COOKIE);
        let cookie = cookie.to_str().unwrap();
        assert!(cookie.starts_with(&format!("{}=", CSRF_COOKIE_NAME)));
        assert!(cookie.contains("Path=/"));
    }
}
