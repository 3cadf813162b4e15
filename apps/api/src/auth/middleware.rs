//! Bearer-token middleware. Applied as a `route_layer` over every route except
//! `/health` and the sign-in endpoint; handlers read the authenticated user
//! from request extensions.

use axum::{
    extract::{Request, State},
    http::header::AUTHORIZATION,
    middleware::Next,
    response::Response,
};
use uuid::Uuid;

use crate::auth::jwt;
use crate::errors::AppError;
use crate::models::user::ROLE_INSTRUCTOR;
use crate::state::AppState;

/// The validated caller, injected into request extensions.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub id: Uuid,
    pub email: String,
    pub role: String,
}

impl AuthUser {
    pub fn require_instructor(&self) -> Result<(), AppError> {
        if self.role == ROLE_INSTRUCTOR {
            Ok(())
        } else {
            Err(AppError::Forbidden)
        }
    }
}

pub async fn require_auth(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let token = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .ok_or(AppError::Unauthorized)?;

    let claims = jwt::verify(&state.config.jwt_secret, token).map_err(|e| {
        tracing::debug!("JWT rejected: {e}");
        AppError::Unauthorized
    })?;

    request.extensions_mut().insert(AuthUser {
        id: claims.sub,
        email: claims.email,
        role: claims.role,
    });

    Ok(next.run(request).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{middleware, routing::get, Extension, Json, Router};
    use std::sync::Arc;
    use tower::ServiceExt;

    use crate::auth::google::{GoogleIdentity, IdTokenVerifier};
    use crate::config::Config;
    use crate::llm_client::GeminiClient;

    struct StubVerifier;

    #[async_trait::async_trait]
    impl IdTokenVerifier for StubVerifier {
        async fn verify(&self, _id_token: &str) -> Result<GoogleIdentity, AppError> {
            Ok(GoogleIdentity {
                sub: "stub".to_string(),
                email: "stub@example.com".to_string(),
                name: "Stub".to_string(),
            })
        }
    }

    fn test_state() -> AppState {
        let config = Config {
            database_url: "postgres://localhost/codesync_test".to_string(),
            jwt_secret: "middleware-test-secret".to_string(),
            google_client_id: "client-id".to_string(),
            gemini_api_keys: vec!["key-a".to_string()],
            port: 0,
            rust_log: "info".to_string(),
        };
        AppState {
            // Lazy pool: never connects unless a query runs, and none do here.
            db: sqlx::postgres::PgPoolOptions::new()
                .connect_lazy(&config.database_url)
                .unwrap(),
            http: reqwest::Client::new(),
            llm: GeminiClient::new(config.gemini_api_keys.clone()),
            config,
            verifier: Arc::new(StubVerifier),
        }
    }

    async fn whoami(Extension(auth): Extension<AuthUser>) -> Json<String> {
        Json(auth.email)
    }

    fn test_router(state: AppState) -> Router {
        Router::new()
            .route("/probe", get(whoami))
            .route_layer(middleware::from_fn_with_state(state.clone(), require_auth))
            .with_state(state)
    }

    #[tokio::test]
    async fn missing_header_is_401() {
        let app = test_router(test_state());
        let response = app
            .oneshot(
                axum::http::Request::builder()
                    .uri("/probe")
                    .body(axum::body::Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), axum::http::StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn malformed_token_is_401() {
        let app = test_router(test_state());
        let response = app
            .oneshot(
                axum::http::Request::builder()
                    .uri("/probe")
                    .header(AUTHORIZATION, "Bearer garbage")
                    .body(axum::body::Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), axum::http::StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn valid_token_reaches_handler_with_identity() {
        let state = test_state();
        let token = jwt::issue(
            &state.config.jwt_secret,
            Uuid::new_v4(),
            "alice@example.com",
            "student",
        )
        .unwrap();

        let app = test_router(state);
        let response = app
            .oneshot(
                axum::http::Request::builder()
                    .uri("/probe")
                    .header(AUTHORIZATION, format!("Bearer {token}"))
                    .body(axum::body::Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), axum::http::StatusCode::OK);
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        assert_eq!(&body[..], br#""alice@example.com""#);
    }

    #[test]
    fn instructor_guard() {
        let instructor = AuthUser {
            id: Uuid::new_v4(),
            email: "prof@example.com".to_string(),
            role: "instructor".to_string(),
        };
        let student = AuthUser {
            id: Uuid::new_v4(),
            email: "kid@example.com".to_string(),
            role: "student".to_string(),
        };
        assert!(instructor.require_instructor().is_ok());
        assert!(matches!(
            student.require_instructor(),
            Err(AppError::Forbidden)
        ));
    }
}
