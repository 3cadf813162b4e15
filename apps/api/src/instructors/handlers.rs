use axum::{extract::State, Extension, Json};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::auth::jwt;
use crate::auth::middleware::AuthUser;
use crate::errors::AppError;
use crate::models::instructor::InstructorRow;
use crate::models::user::{User, ROLE_INSTRUCTOR, ROLE_STUDENT};
use crate::scoring::is_expired;
use crate::state::AppState;
use crate::students::refresh::{refresh_all_students, BatchRefreshReport};

#[derive(Debug, Deserialize)]
pub struct RegisterInstructorRequest {
    pub department: String,
    pub title: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct RegisterInstructorResponse {
    pub instructor: InstructorRow,
    /// Fresh token carrying the instructor role, so the client does not have
    /// to sign in again for the role change to take effect.
    pub token: String,
}

#[derive(Debug, Serialize)]
pub struct InstructorProfileResponse {
    pub user: User,
    pub instructor: InstructorRow,
}

#[derive(Debug, FromRow)]
pub struct RosterRow {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub roll_no: Option<String>,
    pub branch: Option<String>,
    pub graduation_year: Option<i32>,
    pub onboarding_complete: bool,
    pub total_score: Option<f64>,
    pub computed_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize)]
pub struct RosterEntry {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub roll_no: Option<String>,
    pub branch: Option<String>,
    pub graduation_year: Option<i32>,
    pub onboarding_complete: bool,
    pub total_score: f64,
    pub score_stale: bool,
}

/// POST /api/instructor
///
/// Self-registration: records instructor details and flips the account role.
pub async fn handle_register(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Json(request): Json<RegisterInstructorRequest>,
) -> Result<Json<RegisterInstructorResponse>, AppError> {
    if request.department.trim().is_empty() {
        return Err(AppError::Validation(
            "department cannot be empty".to_string(),
        ));
    }

    let instructor: InstructorRow = sqlx::query_as(
        r#"
        INSERT INTO instructors (id, department, title)
        VALUES ($1, $2, $3)
        ON CONFLICT (id)
        DO UPDATE SET department = EXCLUDED.department, title = EXCLUDED.title
        RETURNING *
        "#,
    )
    .bind(auth.id)
    .bind(request.department.trim())
    .bind(request.title.as_deref())
    .fetch_one(&state.db)
    .await?;

    sqlx::query("UPDATE users SET role = $2 WHERE id = $1")
        .bind(auth.id)
        .bind(ROLE_INSTRUCTOR)
        .execute(&state.db)
        .await?;

    let token = jwt::issue(&state.config.jwt_secret, auth.id, &auth.email, ROLE_INSTRUCTOR)
        .map_err(|e| AppError::Internal(anyhow::anyhow!("JWT signing failed: {e}")))?;

    Ok(Json(RegisterInstructorResponse { instructor, token }))
}

/// GET /api/instructor/profile
pub async fn handle_profile(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
) -> Result<Json<InstructorProfileResponse>, AppError> {
    auth.require_instructor()?;

    let user: User = sqlx::query_as("SELECT * FROM users WHERE id = $1")
        .bind(auth.id)
        .fetch_optional(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound("account no longer exists".to_string()))?;

    let instructor: InstructorRow = sqlx::query_as("SELECT * FROM instructors WHERE id = $1")
        .bind(auth.id)
        .fetch_optional(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound("instructor record not found".to_string()))?;

    Ok(Json(InstructorProfileResponse { user, instructor }))
}

/// GET /api/instructor/students
///
/// Full roster with cached totals; `score_stale` flags students whose cache
/// is missing or past its TTL.
pub async fn handle_list_students(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
) -> Result<Json<Vec<RosterEntry>>, AppError> {
    auth.require_instructor()?;

    let rows: Vec<RosterRow> = sqlx::query_as(
        r#"
        SELECT u.id, u.name, u.email,
               st.roll_no, st.branch, st.graduation_year, st.onboarding_complete,
               sc.total_score, sc.computed_at
        FROM students st
        JOIN users u ON u.id = st.id
        LEFT JOIN student_scores sc ON sc.student_id = st.id
        WHERE u.role = $1
        ORDER BY u.name
        "#,
    )
    .bind(ROLE_STUDENT)
    .fetch_all(&state.db)
    .await?;

    let now = Utc::now();
    let roster = rows
        .into_iter()
        .map(|row| RosterEntry {
            score_stale: row.computed_at.map(|t| is_expired(t, now)).unwrap_or(true),
            id: row.id,
            name: row.name,
            email: row.email,
            roll_no: row.roll_no,
            branch: row.branch,
            graduation_year: row.graduation_year,
            onboarding_complete: row.onboarding_complete,
            total_score: row.total_score.unwrap_or(0.0),
        })
        .collect();

    Ok(Json(roster))
}

/// POST /api/instructor/refresh-batch
pub async fn handle_refresh_batch(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
) -> Result<Json<BatchRefreshReport>, AppError> {
    auth.require_instructor()?;
    let report = refresh_all_students(&state).await?;
    Ok(Json(report))
}
