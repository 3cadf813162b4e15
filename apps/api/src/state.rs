use std::sync::Arc;

use sqlx::PgPool;

use crate::auth::google::IdTokenVerifier;
use crate::config::Config;
use crate::llm_client::GeminiClient;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    /// Shared outbound HTTP client used by every scraper.
    pub http: reqwest::Client,
    pub llm: GeminiClient,
    pub config: Config,
    /// Pluggable Google ID-token verifier. Tests swap in a stub so sign-in
    /// never touches the network.
    pub verifier: Arc<dyn IdTokenVerifier>,
}
