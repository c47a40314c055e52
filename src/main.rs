//! WiseHub Backend
//!
//! A production-grade REST backend for managing interactive training content
//! across organizations, with SQLite persistence and server-side
//! training-plan aggregation.

mod api;
mod auth;
mod config;
mod db;
mod errors;
mod models;
mod stats;

use std::sync::Arc;

use axum::{
    middleware,
    routing::{delete, get, post, put},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use config::Config;
use db::Repository;
use stats::OverviewCache;

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    pub repo: Arc<Repository>,
    pub overview_cache: Arc<OverviewCache>,
    pub config: Arc<Config>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load configuration
    let config = Config::from_env();

    // Initialize logging
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting WiseHub Backend");
    tracing::info!("Database path: {:?}", config.db_path);
    tracing::info!("Bind address: {}", config.bind_addr);

    // Warn if PSK is not configured
    if config.api_psk.is_none() {
        tracing::warn!("No API PSK configured (WISEHUB_API_PSK). Authentication is disabled!");
    }

    // Initialize database
    let pool = db::init_database(&config.db_path).await?;
    let repo = Arc::new(Repository::new(pool));

    // Create application state
    let state = AppState {
        repo,
        overview_cache: Arc::new(OverviewCache::new()),
        config: Arc::new(config.clone()),
    };

    // Build router
    let app = create_router(state);

    // Start server
    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    tracing::info!("Server listening on {}", config.bind_addr);

    axum::serve(listener, app).await?;

    Ok(())
}

/// Create the application router with all routes.
pub fn create_router(state: AppState) -> Router {
    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Clone PSK for the auth layer
    let psk = state.config.api_psk.clone();

    // API routes
    let api_routes = Router::new()
        // Revision
        .route("/revision", get(api::get_revision))
        // Organizations
        .route("/organizations", get(api::list_organizations))
        .route("/organizations", post(api::create_organization))
        .route("/organizations/{org_id}", get(api::get_organization))
        .route("/organizations/{org_id}", delete(api::delete_organization))
        // Members
        .route("/organizations/{org_id}/members", get(api::list_members))
        .route("/organizations/{org_id}/members", post(api::create_member))
        .route("/organizations/{org_id}/members/{id}", get(api::get_member))
        .route("/organizations/{org_id}/members/{id}", put(api::update_member))
        .route(
            "/organizations/{org_id}/members/{id}",
            delete(api::delete_member),
        )
        // Training tags
        .route("/organizations/{org_id}/tags", get(api::list_tags))
        .route("/organizations/{org_id}/tags", post(api::create_tag))
        .route("/organizations/{org_id}/tags/{id}", get(api::get_tag))
        .route("/organizations/{org_id}/tags/{id}", put(api::update_tag))
        .route("/organizations/{org_id}/tags/{id}", delete(api::delete_tag))
        // Builds
        .route("/organizations/{org_id}/builds", get(api::list_builds))
        .route("/organizations/{org_id}/builds", post(api::create_build))
        .route("/organizations/{org_id}/builds/{name}", get(api::get_build))
        .route("/organizations/{org_id}/builds/{name}", put(api::update_build))
        .route(
            "/organizations/{org_id}/builds/{name}",
            delete(api::delete_build),
        )
        // Member-tag assignments
        .route(
            "/organizations/{org_id}/member-tags",
            get(api::list_member_assignments),
        )
        .route(
            "/organizations/{org_id}/member-tags/assign",
            post(api::assign_member_tags),
        )
        .route(
            "/organizations/{org_id}/member-tags/remove",
            post(api::remove_member_tags),
        )
        // Build-tag assignments
        .route(
            "/organizations/{org_id}/build-tags",
            get(api::list_build_assignments),
        )
        .route(
            "/organizations/{org_id}/build-tags/assign",
            post(api::assign_build_tags),
        )
        .route(
            "/organizations/{org_id}/build-tags/remove",
            post(api::remove_build_tags),
        )
        // Completions
        .route(
            "/organizations/{org_id}/completions",
            get(api::list_completions),
        )
        .route(
            "/organizations/{org_id}/completions",
            post(api::record_completion),
        )
        // Training aggregation
        .route(
            "/organizations/{org_id}/training/overview",
            get(api::get_training_overview),
        )
        .route(
            "/organizations/{org_id}/training/dashboard",
            get(api::get_dashboard_metrics),
        )
        // Apply PSK auth middleware
        .layer(middleware::from_fn(move |req, next| {
            auth::psk_auth_layer(psk.clone(), req, next)
        }));

    // Health check (no auth required)
    let health_routes = Router::new().route("/health", get(health_check));

    Router::new()
        .nest("/api", api_routes)
        .merge(health_routes)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Health check endpoint.
async fn health_check() -> &'static str {
    "OK"
}
