//! Google ID-token verification behind a trait so sign-in is testable without
//! the network. The real implementation asks Google's `tokeninfo` endpoint to
//! validate the token and checks the audience against our OAuth client id.

use async_trait::async_trait;
use serde::Deserialize;

use crate::errors::AppError;

const TOKENINFO_URL: &str = "https://oauth2.googleapis.com/tokeninfo";

/// The identity Google vouches for after a successful verification.
#[derive(Debug, Clone)]
pub struct GoogleIdentity {
    pub sub: String,
    pub email: String,
    pub name: String,
}

#[async_trait]
pub trait IdTokenVerifier: Send + Sync {
    async fn verify(&self, id_token: &str) -> Result<GoogleIdentity, AppError>;
}

#[derive(Debug, Deserialize)]
struct TokenInfo {
    aud: String,
    sub: String,
    email: Option<String>,
    name: Option<String>,
}

pub struct GoogleTokenVerifier {
    http: reqwest::Client,
    client_id: String,
}

impl GoogleTokenVerifier {
    pub fn new(http: reqwest::Client, client_id: String) -> Self {
        Self { http, client_id }
    }
}

#[async_trait]
impl IdTokenVerifier for GoogleTokenVerifier {
    async fn verify(&self, id_token: &str) -> Result<GoogleIdentity, AppError> {
        let response = self
            .http
            .get(TOKENINFO_URL)
            .query(&[("id_token", id_token)])
            .send()
            .await
            .map_err(|e| AppError::Upstream(format!("tokeninfo request failed: {e}")))?;

        // Google answers 400 for anything invalid or expired.
        if !response.status().is_success() {
            return Err(AppError::Unauthorized);
        }

        let info: TokenInfo = response
            .json()
            .await
            .map_err(|e| AppError::Upstream(format!("tokeninfo malformed: {e}")))?;

        if info.aud != self.client_id {
            tracing::warn!("ID token audience mismatch: {}", info.aud);
            return Err(AppError::Unauthorized);
        }

        let email = info.email.ok_or(AppError::Unauthorized)?;
        Ok(GoogleIdentity {
            sub: info.sub,
            name: info.name.unwrap_or_else(|| email.clone()),
            email,
        })
    }
}
