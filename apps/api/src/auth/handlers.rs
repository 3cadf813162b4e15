use axum::{extract::State, Extension, Json};
use serde::{Deserialize, Serialize};

use crate::auth::jwt;
use crate::auth::middleware::AuthUser;
use crate::errors::AppError;
use crate::models::user::User;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct GoogleSignInRequest {
    pub id_token: String,
}

#[derive(Debug, Serialize)]
pub struct SignInResponse {
    pub token: String,
    pub user: User,
    /// True on first sign-in, so the SPA can route straight into onboarding.
    pub is_new_user: bool,
}

/// POST /api/auth/google
///
/// Verifies a Google ID token, upserts the account (first sign-in also seeds
/// an empty student row), and returns a first-party JWT.
pub async fn handle_google_sign_in(
    State(state): State<AppState>,
    Json(request): Json<GoogleSignInRequest>,
) -> Result<Json<SignInResponse>, AppError> {
    if request.id_token.trim().is_empty() {
        return Err(AppError::Validation("id_token cannot be empty".to_string()));
    }

    let identity = state.verifier.verify(&request.id_token).await?;

    let existing: Option<User> = sqlx::query_as("SELECT * FROM users WHERE google_sub = $1")
        .bind(&identity.sub)
        .fetch_optional(&state.db)
        .await?;
    let is_new_user = existing.is_none();

    let user: User = sqlx::query_as(
        r#"
        INSERT INTO users (google_sub, email, name)
        VALUES ($1, $2, $3)
        ON CONFLICT (google_sub)
        DO UPDATE SET email = EXCLUDED.email, name = EXCLUDED.name
        RETURNING *
        "#,
    )
    .bind(&identity.sub)
    .bind(&identity.email)
    .bind(&identity.name)
    .fetch_one(&state.db)
    .await?;

    // Every account starts with a student row; instructors register later.
    sqlx::query("INSERT INTO students (id) VALUES ($1) ON CONFLICT (id) DO NOTHING")
        .bind(user.id)
        .execute(&state.db)
        .await?;

    if is_new_user {
        tracing::info!("New user signed up: {}", user.email);
    }

    let token = jwt::issue(&state.config.jwt_secret, user.id, &user.email, &user.role)
        .map_err(|e| AppError::Internal(anyhow::anyhow!("JWT signing failed: {e}")))?;

    Ok(Json(SignInResponse {
        token,
        user,
        is_new_user,
    }))
}

/// GET /api/auth/me
pub async fn handle_me(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
) -> Result<Json<User>, AppError> {
    let user: Option<User> = sqlx::query_as("SELECT * FROM users WHERE id = $1")
        .bind(auth.id)
        .fetch_optional(&state.db)
        .await?;
    user.map(Json)
        .ok_or_else(|| AppError::NotFound("account no longer exists".to_string()))
}
