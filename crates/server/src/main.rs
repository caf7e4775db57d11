//! liveq server entry point.

use std::sync::Arc;

use axum::{Json, Router, routing::get};
use liveq_api::{AppState, BroadcastHub, router as api_router, ws_handler};
use liveq_common::Config;
use liveq_core::{
    AttendeeService, BroadcasterService, EventService, PollService, QuestionService,
};
use liveq_db::repositories::{
    AttendeeRepository, EventRepository, PollRepository, QuestionRepository,
};
use tokio::signal;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Waits for a shutdown signal (SIGINT or SIGTERM).
///
/// On Unix systems, this listens for both SIGINT (Ctrl+C) and SIGTERM.
/// On Windows, this only listens for Ctrl+C.
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            info!("Received SIGINT, initiating graceful shutdown...");
        },
        () = terminate => {
            info!("Received SIGTERM, initiating graceful shutdown...");
        },
    }
}

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "liveq=debug,tower_http=debug".into()),
        )
        .init();

    info!("Starting liveq server...");

    // Load configuration
    let config = Config::load()?;

    // Connect to database and run migrations
    let db = liveq_db::init(&config).await?;
    info!("Connected to database");

    info!("Running database migrations...");
    liveq_db::migrate(&db).await?;
    info!("Migrations completed");

    let conn = Arc::new(db);

    // Repositories
    let event_repo = EventRepository::new(conn.clone());
    let attendee_repo = AttendeeRepository::new(conn.clone());
    let poll_repo = PollRepository::new(conn.clone());
    let question_repo = QuestionRepository::new(conn);

    // Broadcast hub, shared by the services and the WebSocket handler
    let hub = BroadcastHub::new(&config.broadcast);
    let broadcaster: BroadcasterService = Arc::new(hub.clone());

    // Services
    let event_service = EventService::new(event_repo);
    let attendee_service = AttendeeService::new(attendee_repo);

    let mut poll_service = PollService::new(poll_repo);
    poll_service.set_broadcaster(broadcaster.clone());

    let mut question_service = QuestionService::new(question_repo);
    question_service.set_broadcaster(broadcaster);

    let state = AppState {
        event_service,
        attendee_service,
        poll_service,
        question_service,
        hub,
    };

    // Build router
    let app = Router::new()
        .route("/health", get(health))
        .route("/ws/events/{slug}", get(ws_handler))
        .nest("/api/v1", api_router())
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state);

    // Start server with graceful shutdown
    let addr = format!("{}:{}", config.server.host, config.server.port);
    info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shutdown complete");
    Ok(())
}
