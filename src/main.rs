mod core;
mod features;
mod modules;
mod shared;

use crate::core::config::Config;
use crate::core::{database, middleware, openapi};
use crate::features::auth::services::AccountService;
use crate::features::auth::{self, routes as auth_routes, Authenticator};
use crate::features::file_records::{routes as files_routes, FileRecordService};
use crate::features::folders::{routes as folders_routes, FolderService};
use crate::features::sections::{routes as sections_routes, SectionService};
use crate::features::tables::{routes as tables_routes, TableService};
use crate::features::uploads::{routes as uploads_routes, UploadService};
use crate::modules::storage::MinIOClient;
use axum::{middleware::from_fn_with_state, Router};
use std::sync::Arc;
use tower_http::request_id::{PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::{DefaultOnRequest, DefaultOnResponse, TraceLayer};
use tracing::Level;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn main() -> anyhow::Result<()> {
    // Build Tokio runtime with configurable worker threads
    let worker_threads = std::env::var("TOKIO_WORKER_THREADS")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or_else(|| {
            std::thread::available_parallelism()
                .map(|p| p.get())
                .unwrap_or(4)
        });

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(worker_threads)
        .max_blocking_threads(worker_threads * 4)
        .enable_all()
        .build()?;

    runtime.block_on(async_main(worker_threads))
}

async fn async_main(worker_threads: usize) -> anyhow::Result<()> {
    // Load .env before the logger so RUST_LOG is picked up
    let _ = dotenvy::dotenv();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env().map_err(|e| anyhow::anyhow!(e))?;

    tracing::info!(
        "Starting geolayers: tokio_worker_threads={}, pid={}",
        worker_threads,
        std::process::id()
    );

    let pool = database::create_pool(&config.database).await?;
    tracing::info!(
        "Database connection pool created ({})",
        database::masked_url(&config.database.url)
    );

    tracing::info!("Running database migrations...");
    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .map_err(|e| anyhow::anyhow!("Migration failed: {}", e))?;
    tracing::info!("Database migrations completed successfully");

    // Google sign-in
    let jwks_client = Arc::new(auth::JwksClient::new(
        &config.auth.jwks_url,
        config.auth.jwks_cache_ttl,
    ));
    let jwt_validator = Arc::new(auth::JwtValidator::new(jwks_client, &config.auth));
    let account_service = Arc::new(AccountService::new(
        pool.clone(),
        config.auth.admin_emails.clone(),
    ));
    let authenticator = Arc::new(Authenticator::new(
        jwt_validator,
        Arc::clone(&account_service),
    ));
    tracing::info!(
        "Auth initialized (issuers={:?}, admin_emails={})",
        config.auth.issuers,
        config.auth.admin_emails.len()
    );

    let storage = Arc::new(
        MinIOClient::new(&config.storage)
            .map_err(|e| anyhow::anyhow!("Failed to initialize storage client: {}", e))?,
    );
    storage
        .ensure_bucket_exists()
        .await
        .map_err(|e| anyhow::anyhow!("Failed to ensure storage bucket exists: {}", e))?;
    tracing::info!("Storage client initialized for bucket: {}", storage.bucket_name());

    let file_service = Arc::new(FileRecordService::new(pool.clone()));
    let folder_service = Arc::new(FolderService::new(pool.clone(), Arc::clone(&file_service)));
    let section_service = Arc::new(SectionService::new(
        pool.clone(),
        Arc::clone(&folder_service),
    ));
    let table_service = Arc::new(TableService::new(pool.clone()));
    let upload_service = Arc::new(UploadService::new(pool.clone(), Arc::clone(&storage)));
    tracing::info!("Services initialized");

    let swagger = openapi::swagger_router(&config.swagger);

    // Protected routes (require a valid Google ID token)
    let protected_routes = Router::new()
        .merge(sections_routes::routes(
            Arc::clone(&section_service),
            Arc::clone(&folder_service),
        ))
        .merge(folders_routes::routes(
            Arc::clone(&folder_service),
            Arc::clone(&file_service),
        ))
        .merge(files_routes::routes(Arc::clone(&file_service)))
        .merge(sections_routes::admin_routes(section_service))
        .merge(folders_routes::admin_routes(folder_service))
        .merge(files_routes::admin_routes(file_service))
        .merge(uploads_routes::admin_routes(Arc::clone(&upload_service)))
        .merge(tables_routes::admin_routes(table_service))
        .route_layer(from_fn_with_state(
            Arc::clone(&authenticator),
            middleware::auth_middleware,
        ));

    async fn health_check() -> axum::http::StatusCode {
        axum::http::StatusCode::OK
    }
    let health_route = Router::new().route("/health", axum::routing::get(health_check));

    // Public routes; a bearer token is optional and only identifies the caller
    let upload_routes = uploads_routes::routes(upload_service, config.app.max_request_body_size)
        .route_layer(from_fn_with_state(
            Arc::clone(&authenticator),
            middleware::optional_auth_middleware,
        ));
    let public_routes = Router::new()
        .merge(auth_routes::public_routes(account_service, authenticator))
        .merge(upload_routes);

    let app = Router::new()
        .merge(swagger)
        .merge(protected_routes)
        .merge(public_routes)
        .merge(health_route)
        .layer(middleware::cors_layer(
            config.app.cors_allowed_origins.clone(),
        ))
        // Propagate X-Request-Id to response headers
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(middleware::MakeSpanWithRequestId)
                .on_request(DefaultOnRequest::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        // Generate X-Request-Id using UUID v7 (or use client-provided one)
        .layer(SetRequestIdLayer::x_request_id(middleware::MakeRequestUuid));

    let addr = config.app.server_address();
    let socket_addr: std::net::SocketAddr = addr
        .parse()
        .map_err(|e| anyhow::anyhow!("Invalid address {}: {}", addr, e))?;
    let listener = bind_listener(socket_addr)?;

    tracing::info!("Server listening on http://{}", addr);
    tracing::info!("Swagger UI available at http://{}/swagger-ui/", addr);

    axum::serve(listener, app).await?;

    Ok(())
}

/// TCP listener with address reuse, no-delay and keepalive configured through socket2
fn bind_listener(addr: std::net::SocketAddr) -> std::io::Result<tokio::net::TcpListener> {
    use socket2::{Domain, Protocol, Socket, TcpKeepalive, Type};
    use std::time::Duration;

    let socket = Socket::new(Domain::for_address(addr), Type::STREAM, Some(Protocol::TCP))?;
    socket.set_reuse_address(true)?;
    #[cfg(unix)]
    socket.set_reuse_port(true)?;
    socket.set_nodelay(true)?;

    let keepalive = TcpKeepalive::new().with_time(Duration::from_secs(60));
    #[cfg(target_os = "linux")]
    let keepalive = keepalive
        .with_interval(Duration::from_secs(10))
        .with_retries(3);
    socket.set_tcp_keepalive(&keepalive)?;

    socket.set_nonblocking(true)?;
    socket.bind(&addr.into())?;
    socket.listen(1024)?;

    tokio::net::TcpListener::from_std(socket.into())
}
