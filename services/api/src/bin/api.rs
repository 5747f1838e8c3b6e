//! services/api/src/bin/api.rs

use api_lib::{
    adapters::{AuthSessionAdapter, GoogleBooksAdapter, HttpMirrorAdapter, SqliteStore},
    config::Config,
    error::ApiError,
    web::{
        add_book_handler,
        auth::{login_handler, logout_handler, signup_handler},
        list_books_handler, profile_handler,
        rest::ApiDoc,
        search_handler, state::AppState, watch_books_handler,
    },
};
use axum::{
    http::{
        header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE},
        HeaderValue, Method,
    },
    routing::{get, post},
    Router,
};
use booktrack_core::reading_list::ReadingListCoordinator;
use sqlx::sqlite::SqlitePoolOptions;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tracing::info;
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

    // --- 2. Connect to the Local Store & Run Migrations ---
    info!("Connecting to database...");
    let db_pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect(&config.database_url)
        .await?;
    let store = Arc::new(SqliteStore::new(db_pool.clone()));
    info!("Running database migrations...");
    store.run_migrations().await?;
    info!("Database migrations complete.");

    // --- 3. Initialize Service Adapters ---
    let http_client = reqwest::Client::new();

    let catalog = Arc::new(GoogleBooksAdapter::new(
        http_client.clone(),
        config.catalog_base_url.clone(),
    ));
    let mirror = Arc::new(HttpMirrorAdapter::new(
        http_client,
        config.sync_base_url.clone(),
        config.sync_auth_token.clone(),
    ));
    let session = Arc::new(AuthSessionAdapter::new(db_pool));

    let reading_list = Arc::new(ReadingListCoordinator::new(
        store,
        mirror,
        session.clone(),
    ));

    // --- 4. Build the Shared AppState ---
    let app_state = Arc::new(AppState {
        catalog,
        reading_list,
        session,
        config: config.clone(),
    });

    let cors = CorsLayer::new()
        .allow_origin("http://localhost:3000".parse::<HeaderValue>().unwrap())
        .allow_credentials(true)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE, Method::OPTIONS])
        .allow_headers([AUTHORIZATION, CONTENT_TYPE, ACCEPT]);

    // --- 5. Create the Web Router ---
    // Session state is ambient, so there is no per-request auth layer: a
    // write without a signed-in user is rejected by the coordinator itself.
    let api_router = Router::new()
        .route("/auth/signup", post(signup_handler))
        .route("/auth/login", post(login_handler))
        .route("/auth/logout", post(logout_handler))
        .route("/search", get(search_handler))
        .route("/books", post(add_book_handler).get(list_books_handler))
        .route("/books/watch", get(watch_books_handler))
        .route("/profile", get(profile_handler))
        .layer(cors)
        .with_state(app_state);

    // Merge the API router with the Swagger UI router for a complete application.
    let app = Router::new()
        .merge(api_router)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()));

    // --- 6. Start the Server ---
    info!("Starting server on {}", config.bind_address);
    info!(
        "Swagger UI available at http://{}/swagger-ui",
        config.bind_address
    );
    let listener = tokio::net::TcpListener::bind(&config.bind_address).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
