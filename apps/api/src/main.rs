mod auth;
mod career;
mod config;
mod db;
mod errors;
mod instructors;
mod llm_client;
mod models;
mod routes;
mod scoring;
mod scrapers;
mod state;
mod students;

use anyhow::Result;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::auth::google::GoogleTokenVerifier;
use crate::config::Config;
use crate::db::create_pool;
use crate::llm_client::GeminiClient;
use crate::routes::build_router;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("codesync_api={}", &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting CodeSync API v{}", env!("CARGO_PKG_VERSION"));

    // Initialize PostgreSQL
    let db = create_pool(&config.database_url).await?;

    // Shared outbound HTTP client for scrapers and token verification
    let http = reqwest::Client::builder()
        .timeout(Duration::from_secs(20))
        .build()?;

    // Initialize Gemini client with the rotating key pool
    let llm = GeminiClient::new(config.gemini_api_keys.clone());
    info!(
        "Gemini client initialized (model: {}, {} key(s))",
        llm_client::MODEL,
        config.gemini_api_keys.len()
    );

    // Google ID-token verifier (trait object so tests can stub it)
    let verifier = Arc::new(GoogleTokenVerifier::new(
        http.clone(),
        config.google_client_id.clone(),
    ));

    // Build app state
    let state = AppState {
        db,
        http,
        llm,
        config: config.clone(),
        verifier,
    };

    // Build router
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive()); // TODO: tighten CORS in production

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
