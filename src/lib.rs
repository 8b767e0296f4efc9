//! Corkboard: multi-tenant project boards behind a cookie-session API.
//!
//! The crate is organized as:
//!
//! - [`api`]: HTTP handlers and request/response models
//! - [`auth`]: sessions, passwords, anti-forgery tokens and role checks
//! - [`db`]: repositories and database models over SQLite
//! - [`config`]: YAML + environment configuration
//! - [`errors`]: the application error type and HTTP mapping
//!
//! # Startup
//!
//! ```ignore
//! let config = Config::load(&args)?;
//! let app = Application::new(config).await?;
//! app.serve(shutdown_signal()).await?;
//! ```

pub mod api;
pub mod auth;
pub mod config;
pub mod db;
pub mod errors;
pub mod openapi;
pub mod types;

#[cfg(test)]
mod test;
#[cfg(test)]
pub mod test_utils;

use anyhow::Context;
use axum::{
    Router,
    http::{HeaderName, HeaderValue, Method, header},
    middleware::from_fn_with_state,
    routing::{delete, get, patch, post},
};
use bon::Builder;
use sqlx::{
    SqlitePool,
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
};
use tokio::net::TcpListener;
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::{Level, info, instrument};
use utoipa::OpenApi;
use utoipa_scalar::{Scalar, Servable};

use crate::config::Config;

/// Shared state passed to every handler.
#[derive(Clone, Builder)]
pub struct AppState {
    pub db: SqlitePool,
    pub config: Config,
}

impl AppState {
    /// The HMAC key for anti-forgery cookies. Config validation guarantees
    /// it is present before the server starts.
    pub fn secret_key(&self) -> &[u8] {
        self.config.secret_key.as_deref().unwrap_or_default().as_bytes()
    }
}

/// Get the corkboard database migrator
pub fn migrator() -> sqlx::migrate::Migrator {
    sqlx::migrate!("./migrations")
}

/// Open the SQLite pool and bring the schema up to date.
#[instrument(skip_all, fields(path = %config.database.path))]
pub async fn setup_database(config: &Config) -> anyhow::Result<SqlitePool> {
    let ephemeral = config.database.path == ":memory:";
    let options = SqliteConnectOptions::new()
        .filename(&config.database.path)
        .create_if_missing(true)
        .foreign_keys(true);

    // An in-memory database exists per connection, so the pool must not
    // fan out.
    let max_connections = if ephemeral { 1 } else { config.database.max_connections };
    let pool = SqlitePoolOptions::new()
        .max_connections(max_connections)
        .connect_with(options)
        .await
        .context("failed to open database")?;

    migrator().run(&pool).await.context("failed to run migrations")?;
    if ephemeral {
        info!("database is in-memory: data will be lost on shutdown");
    }
    Ok(pool)
}

/// Create CORS layer from configuration
fn create_cors_layer(config: &Config) -> anyhow::Result<CorsLayer> {
    let mut origins = Vec::new();
    for origin in &config.cors.allowed_origins {
        origins.push(origin.parse::<HeaderValue>().context("invalid CORS origin")?);
    }

    let csrf_header = HeaderName::from_bytes(config.auth.csrf.header_name.as_bytes())
        .context("invalid auth.csrf.header_name")?;
    let mut cors = CorsLayer::new()
        .allow_origin(origins)
        .allow_credentials(config.cors.allow_credentials)
        .allow_methods([Method::GET, Method::POST, Method::PATCH, Method::DELETE])
        .allow_headers([header::CONTENT_TYPE, csrf_header]);

    if let Some(max_age) = config.cors.max_age {
        cors = cors.max_age(std::time::Duration::from_secs(max_age));
    }

    Ok(cors)
}

#[instrument(skip_all)]
pub fn build_router(state: &AppState) -> anyhow::Result<Router> {
    let auth_routes = Router::new()
        .route("/authentication/sign-up", post(api::handlers::auth::sign_up))
        .route("/authentication/sign-in", post(api::handlers::auth::sign_in))
        .route("/authentication/sign-out", post(api::handlers::auth::sign_out))
        .route("/authentication/me", get(api::handlers::auth::me))
        .route("/authentication/csrf", get(api::handlers::auth::csrf_token))
        .with_state(state.clone());

    let api_routes = Router::new()
        .route("/account", get(api::handlers::account::get_account))
        .route("/account", patch(api::handlers::account::update_account))
        .route("/account", delete(api::handlers::account::delete_account))
        .route("/organizations", get(api::handlers::organizations::list_organizations))
        .route("/organizations", post(api::handlers::organizations::create_organization))
        .route("/organizations/{id}", get(api::handlers::organizations::get_organization))
        .route("/organizations/{id}", patch(api::handlers::organizations::update_organization))
        .route("/organizations/{id}", delete(api::handlers::organizations::delete_organization))
        .route("/organizations/{id}/members", post(api::handlers::organizations::add_member))
        .route("/organizations/{id}/boards", get(api::handlers::boards::list_boards))
        .route("/organizations/{id}/boards", post(api::handlers::boards::create_board))
        .route("/boards/{id}", get(api::handlers::boards::get_board))
        .route("/boards/{id}", patch(api::handlers::boards::update_board))
        .route("/boards/{id}", delete(api::handlers::boards::delete_board))
        .route("/boards/{id}/lists", get(api::handlers::boards::list_lists))
        .route("/boards/{id}/lists", post(api::handlers::boards::create_list))
        .route("/lists/{id}", patch(api::handlers::boards::update_list))
        .route("/lists/{id}", delete(api::handlers::boards::delete_list))
        .route("/lists/{id}/cards", get(api::handlers::boards::list_cards))
        .route("/lists/{id}/cards", post(api::handlers::boards::create_card))
        .route("/cards/{id}", patch(api::handlers::boards::update_card))
        .route("/cards/{id}", delete(api::handlers::boards::delete_card))
        .with_state(state.clone());

    // Middleware runs outside-in: session annotation first, then the
    // anti-forgery gate for mutating requests.
    let router = Router::new()
        .route("/healthz", get(|| async { "OK" }))
        .merge(auth_routes)
        .merge(api_routes)
        .merge(Scalar::with_url("/docs", openapi::ApiDoc::openapi()))
        .layer(from_fn_with_state(state.clone(), auth::csrf::require_csrf))
        .layer(from_fn_with_state(state.clone(), auth::middleware::session_middleware))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_request(DefaultOnRequest::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(create_cors_layer(&state.config)?);

    Ok(router)
}

/// The assembled application: database, state and router.
pub struct Application {
    router: Router,
    config: Config,
    pool: SqlitePool,
}

impl Application {
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        let pool = setup_database(&config).await?;

        let state = AppState::builder().db(pool.clone()).config(config.clone()).build();
        let router = build_router(&state)?;

        Ok(Self { router, config, pool })
    }

    /// Start serving the application
    pub async fn serve<F>(self, shutdown: F) -> anyhow::Result<()>
    where
        F: std::future::Future<Output = ()> + Send + 'static,
    {
        let bind_addr = format!("{}:{}", self.config.host, self.config.port);
        let listener = TcpListener::bind(&bind_addr).await?;
        info!("corkboard listening on http://{bind_addr}");

        axum::serve(listener, self.router.into_make_service())
            .with_graceful_shutdown(shutdown)
            .await?;

        info!("Closing database connections...");
        self.pool.close().await;

        Ok(())
    }
}

