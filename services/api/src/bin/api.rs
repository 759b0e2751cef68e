//! services/api/src/bin/api.rs

use api_lib::{
    adapters::db::DbAdapter,
    config::Config,
    error::ApiError,
    web::{api_router, state::AppState, ApiDoc},
};
use axum::http::{
    header::{ACCEPT, CONTENT_TYPE},
    HeaderName, HeaderValue, Method,
};
use axum::Router;
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use study_planner_core::{clock::SystemClock, memory::InMemoryDatabase, ports::DatabaseService};
use tower_http::cors::CorsLayer;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[tokio::main]
async fn main() -> Result<(), ApiError> {
    // --- 1. Load Configuration & Set Up Logging ---
    let config = Arc::new(Config::from_env()?);
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(config.log_level.to_string()))
        .with(tracing_subscriber::fmt::layer())
        .init();
    info!("Configuration loaded. Starting server...");

    // --- 2. Connect to the Record Store & Run Migrations ---
    let db: Arc<dyn DatabaseService> = if config.uses_memory_store() {
        warn!("Using the in-memory store; data is lost on shutdown.");
        Arc::new(InMemoryDatabase::new())
    } else {
        info!("Connecting to database...");
        let db_pool = PgPoolOptions::new()
            .max_connections(5)
            .connect(&config.database_url)
            .await?;
        let db_adapter = DbAdapter::new(db_pool);
        info!("Running database migrations...");
        db_adapter.run_migrations().await?;
        info!("Database migrations complete.");
        Arc::new(db_adapter)
    };

    if let Some(seed) = config.schedule_seed {
        info!("Schedule shuffles are seeded with {}", seed);
    }

    // --- 3. Build the Shared AppState ---
    let app_state = Arc::new(AppState::new(db, config.clone(), Arc::new(SystemClock)));

    let origin = config.cors_origin.parse::<HeaderValue>().map_err(|e| {
        ApiError::Internal(format!("Invalid CORS_ORIGIN '{}': {}", config.cors_origin, e))
    })?;
    let cors = CorsLayer::new()
        .allow_origin(origin)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([CONTENT_TYPE, ACCEPT, HeaderName::from_static("x-user-id")]);

    // --- 4. Create the Web Router ---
    // Merge the API router with the Swagger UI router for a complete application.
    let app = Router::new()
        .merge(api_router(app_state).layer(cors))
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()));

    // --- 5. Start the Server ---
    info!("Starting server on {}", config.bind_address);
    info!(
        "Swagger UI available at http://{}/swagger-ui",
        config.bind_address
    );
    let listener = tokio::net::TcpListener::bind(&config.bind_address).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
