//! services/api/src/bin/api.rs

use api_lib::{
    adapters::{db::DbAdapter, interpreter_llm::OpenAiInterpreterAdapter},
    config::Config,
    error::ApiError,
    sweep::spawn_sweeper,
    web::{
        goals::{
            abandon_goal_handler, complete_goal_handler, create_goal_handler, get_goal_handler,
            list_goals_handler,
        },
        progress::{
            freeze_streak_handler, list_achievements_handler, list_streaks_handler, stats_handler,
        },
        rest::{
            create_dream_handler, create_journal_handler, create_mood_handler,
            create_sleep_handler, get_dream_handler, interpret_dream_handler,
            list_dreams_handler, ApiDoc,
        },
        state::AppState,
    },
};
use async_openai::{config::OpenAIConfig, Client};
use axum::http::{
    header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE},
    HeaderName, HeaderValue, Method,
};
use axum::{
    routing::{get, post},
    Router,
};
use dream_journal_core::JournalEngine;
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
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

    // --- 2. Connect to Database & Run Migrations ---
    info!("Connecting to database...");
    let db_pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&config.database_url)
        .await?;
    let db_adapter = Arc::new(DbAdapter::new(db_pool.clone()));
    info!("Running database migrations...");
    db_adapter.run_migrations().await?;
    info!("Database migrations complete.");

    // --- 3. Initialize the Interpreter Adapter & Engine ---
    let openai_config = OpenAIConfig::new().with_api_key(
        config
            .openai_api_key
            .as_ref()
            .ok_or_else(|| ApiError::Internal("OPENAI_API_KEY is required".to_string()))?,
    );
    let openai_client = Client::with_config(openai_config);
    let interpreter = Arc::new(OpenAiInterpreterAdapter::new(
        openai_client,
        config.interpretation_model.clone(),
    ));

    let engine = Arc::new(JournalEngine::new(
        db_adapter.clone(),
        db_adapter.clone(),
        interpreter,
    ));

    // --- 4. Build the Shared AppState ---
    let app_state = Arc::new(AppState {
        engine: engine.clone(),
        config: config.clone(),
    });

    // --- 5. Start the Maintenance Sweeper ---
    let shutdown = CancellationToken::new();
    let sweeper = spawn_sweeper(engine, config.sweep_interval_secs, shutdown.clone());

    let cors = CorsLayer::new()
        .allow_origin(
            config
                .allowed_origin
                .parse::<HeaderValue>()
                .map_err(|_| {
                    ApiError::Internal(format!(
                        "Invalid ALLOWED_ORIGIN specified in config: '{}'",
                        config.allowed_origin
                    ))
                })?,
        )
        .allow_credentials(true)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([
            AUTHORIZATION,
            CONTENT_TYPE,
            ACCEPT,
            HeaderName::from_static("x-user-id"),
        ]);

    // --- 6. Create the Web Router ---
    let api_router = Router::new()
        .route("/dreams", post(create_dream_handler).get(list_dreams_handler))
        .route("/dreams/{entry_id}", get(get_dream_handler))
        .route(
            "/dreams/{entry_id}/interpretation",
            post(interpret_dream_handler),
        )
        .route("/moods", post(create_mood_handler))
        .route("/sleep", post(create_sleep_handler))
        .route("/journal", post(create_journal_handler))
        .route("/goals", post(create_goal_handler).get(list_goals_handler))
        .route("/goals/{goal_id}", get(get_goal_handler))
        .route("/goals/{goal_id}/complete", post(complete_goal_handler))
        .route("/goals/{goal_id}/abandon", post(abandon_goal_handler))
        .route("/streaks", get(list_streaks_handler))
        .route("/streaks/{kind}/freeze", post(freeze_streak_handler))
        .route("/achievements", get(list_achievements_handler))
        .route("/stats", get(stats_handler))
        .layer(cors)
        .with_state(app_state);

    // Merge the API router with the Swagger UI router for a complete application.
    let app = Router::new()
        .merge(api_router)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()));

    // --- 7. Start the Server ---
    info!("Starting server on {}", config.bind_address);
    info!(
        "Swagger UI available at http://{}/swagger-ui",
        config.bind_address
    );
    let listener = tokio::net::TcpListener::bind(&config.bind_address).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(shutdown.clone()))
        .await?;

    // The server is down; stop the sweeper and let it finish any pass.
    shutdown.cancel();
    let _ = sweeper.await;
    info!("Shutdown complete.");
    Ok(())
}

/// Resolve when Ctrl-C arrives, cancelling the shared token so background
/// tasks wind down with the server.
async fn shutdown_signal(token: CancellationToken) {
    if tokio::signal::ctrl_c().await.is_ok() {
        info!("Shutdown signal received.");
    }
    token.cancel();
}
