mod ai_backend;
mod ai_gateway;
mod api;
mod config;
mod database;
mod document_service;
mod errors;
mod logging;
mod models;
mod plan_service;
mod quiz_service;
mod response_parser;
mod roadmap;
mod video_service;

use anyhow::Result;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use crate::{
    ai_gateway::AiGateway,
    api::{AppState, create_router},
    config::Config,
    database::Database,
    document_service::DocumentService,
    plan_service::PlanService,
    quiz_service::QuizService,
    video_service::VideoService,
};

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    // Initialize logging with console and file output
    let _guard = setup_logging()?;

    let config = Config::from_env()?;
    config.validate()?;

    log_system_event!(startup, component = "server", "Starting studypath server");

    // Initialize database
    let db = Database::new(&config.database.url).await?;
    info!("Database initialized successfully");

    // Backend selection happens once here; the gateway carries the simulated
    // fallback for runtime degradation.
    let gateway = AiGateway::from_config(&config.ai);
    info!(backend = gateway.backend_name(), "AI gateway initialized");

    let state = AppState {
        documents: DocumentService::new(db.clone(), gateway.clone()),
        quizzes: QuizService::new(db.clone(), gateway.clone()),
        plans: PlanService::new(db.clone(), gateway.clone()),
        videos: VideoService::new(db, gateway),
    };

    let app = create_router(state).layer(ServiceBuilder::new().layer(CorsLayer::permissive()));

    let addr = format!("{}:{}", config.server.host, config.server.port);
    info!("Server starting on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

fn setup_logging() -> Result<WorkerGuard> {
    use std::fs;
    use tracing_subscriber::fmt;

    // Create logs directory if it doesn't exist
    fs::create_dir_all("logs").unwrap_or_else(|e| {
        eprintln!("Warning: Could not create logs directory: {}", e);
    });

    let default_log_level = "info,studypath=debug";
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_log_level));

    // Daily-rotated file output alongside the console
    let file_appender = tracing_appender::rolling::daily("logs", "studypath.log");
    let (non_blocking_file, guard) = tracing_appender::non_blocking(file_appender);

    let console_layer = fmt::layer()
        .with_target(true)
        .with_file(true)
        .with_line_number(true)
        .with_ansi(true);

    let file_layer = fmt::layer()
        .with_target(true)
        .with_file(true)
        .with_line_number(true)
        .with_ansi(false)
        .with_writer(non_blocking_file);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(console_layer)
        .with(file_layer)
        .init();

    info!("Logging initialized - writing to logs/studypath.log with daily rotation");

    Ok(guard)
}
