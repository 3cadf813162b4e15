use std::collections::BTreeMap;

use axum::{extract::State, Extension, Json};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::auth::middleware::AuthUser;
use crate::errors::AppError;
use crate::models::platform::{HandleMap, Platform};
use crate::models::score::StudentScoreRow;
use crate::models::student::{handles_to_clear, CpProfileRow, StudentRow};
use crate::models::user::User;
use crate::scoring::{is_expired, ScoreBreakdown};
use crate::state::AppState;
use crate::students::leaderboard::{rank_students, LeaderboardEntry, LeaderboardRow};
use crate::students::refresh::{recompute_and_cache, refresh_student};

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct StudentProfileResponse {
    pub user: User,
    pub student: StudentRow,
    pub profiles: Vec<CpProfileRow>,
    pub scores: Option<StudentScoreRow>,
}

#[derive(Debug, Deserialize)]
pub struct OnboardingRequest {
    pub roll_no: String,
    pub branch: String,
    pub graduation_year: i32,
    #[serde(default)]
    pub cp_handles: HandleMap,
}

#[derive(Debug, Deserialize)]
pub struct UpdateHandlesRequest {
    pub cp_handles: HandleMap,
}

#[derive(Debug, Serialize)]
pub struct ScoresResponse {
    pub platform_scores: BTreeMap<Platform, f64>,
    pub total_score: f64,
    pub computed_at: DateTime<Utc>,
    /// True when this request triggered a recomputation (cache absent or past
    /// its TTL).
    pub recomputed: bool,
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// GET /api/student/profile
pub async fn handle_profile(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
) -> Result<Json<StudentProfileResponse>, AppError> {
    let user: User = sqlx::query_as("SELECT * FROM users WHERE id = $1")
        .bind(auth.id)
        .fetch_optional(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound("account no longer exists".to_string()))?;

    let student: StudentRow = fetch_student(&state, &auth).await?;

    let profiles: Vec<CpProfileRow> =
        sqlx::query_as("SELECT * FROM cp_profiles WHERE student_id = $1 ORDER BY platform")
            .bind(auth.id)
            .fetch_all(&state.db)
            .await?;

    let scores: Option<StudentScoreRow> =
        sqlx::query_as("SELECT * FROM student_scores WHERE student_id = $1")
            .bind(auth.id)
            .fetch_optional(&state.db)
            .await?;

    Ok(Json(StudentProfileResponse {
        user,
        student,
        profiles,
        scores,
    }))
}

/// PUT /api/student/onboarding
///
/// Records academic details and the initial handle map, then marks
/// onboarding complete.
pub async fn handle_onboarding(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Json(request): Json<OnboardingRequest>,
) -> Result<Json<StudentRow>, AppError> {
    if request.roll_no.trim().is_empty() {
        return Err(AppError::Validation("roll_no cannot be empty".to_string()));
    }
    if request.branch.trim().is_empty() {
        return Err(AppError::Validation("branch cannot be empty".to_string()));
    }

    let handles = serde_json::to_value(&request.cp_handles)
        .map_err(|e| AppError::Internal(anyhow::anyhow!("handle serialization failed: {e}")))?;

    let student: StudentRow = sqlx::query_as(
        r#"
        UPDATE students
        SET roll_no = $2, branch = $3, graduation_year = $4,
            cp_handles = $5, onboarding_complete = TRUE, updated_at = now()
        WHERE id = $1
        RETURNING *
        "#,
    )
    .bind(auth.id)
    .bind(request.roll_no.trim())
    .bind(request.branch.trim())
    .bind(request.graduation_year)
    .bind(&handles)
    .fetch_optional(&state.db)
    .await?
    .ok_or_else(|| AppError::NotFound("student record not found".to_string()))?;

    Ok(Json(student))
}

/// PUT /api/student/handles
///
/// Replaces the handle map wholesale. Snapshots for cleared or changed
/// handles are deleted immediately; new handles are picked up on the next
/// refresh. The cached score stays stale until then.
pub async fn handle_update_handles(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Json(request): Json<UpdateHandlesRequest>,
) -> Result<Json<StudentRow>, AppError> {
    let current = fetch_student(&state, &auth).await?;
    let old = current.handles();

    for platform in handles_to_clear(&old, &request.cp_handles) {
        sqlx::query("DELETE FROM cp_profiles WHERE student_id = $1 AND platform = $2")
            .bind(auth.id)
            .bind(platform.as_str())
            .execute(&state.db)
            .await?;
        tracing::info!("cleared {platform} snapshot for student {}", auth.id);
    }

    let handles = serde_json::to_value(&request.cp_handles)
        .map_err(|e| AppError::Internal(anyhow::anyhow!("handle serialization failed: {e}")))?;

    let student: StudentRow = sqlx::query_as(
        "UPDATE students SET cp_handles = $2, updated_at = now() WHERE id = $1 RETURNING *",
    )
    .bind(auth.id)
    .bind(&handles)
    .fetch_optional(&state.db)
    .await?
    .ok_or_else(|| AppError::NotFound("student record not found".to_string()))?;

    Ok(Json(student))
}

/// POST /api/student/refresh
pub async fn handle_refresh(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
) -> Result<Json<ScoreBreakdown>, AppError> {
    let breakdown = refresh_student(&state, auth.id).await?;
    Ok(Json(breakdown))
}

/// GET /api/student/scores
///
/// Serves the cached aggregate; recomputes from stored snapshots first when
/// the cache is absent or past its 7-day TTL.
pub async fn handle_scores(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
) -> Result<Json<ScoresResponse>, AppError> {
    let cached: Option<StudentScoreRow> =
        sqlx::query_as("SELECT * FROM student_scores WHERE student_id = $1")
            .bind(auth.id)
            .fetch_optional(&state.db)
            .await?;

    let now = Utc::now();
    match cached {
        Some(row) if !is_expired(row.computed_at, now) => {
            let platform_scores: BTreeMap<Platform, f64> =
                serde_json::from_value(row.platform_scores).unwrap_or_default();
            Ok(Json(ScoresResponse {
                platform_scores,
                total_score: row.total_score,
                computed_at: row.computed_at,
                recomputed: false,
            }))
        }
        _ => {
            let ScoreBreakdown {
                platform_scores,
                total_score,
            } = recompute_and_cache(&state.db, auth.id).await?;
            Ok(Json(ScoresResponse {
                platform_scores,
                total_score,
                computed_at: now,
                recomputed: true,
            }))
        }
    }
}

/// GET /api/student/leaderboard
pub async fn handle_leaderboard(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
) -> Result<Json<Vec<LeaderboardEntry>>, AppError> {
    let rows: Vec<LeaderboardRow> = sqlx::query_as(
        r#"
        SELECT s.student_id, u.name, s.total_score, s.computed_at
        FROM student_scores s
        JOIN users u ON u.id = s.student_id
        "#,
    )
    .fetch_all(&state.db)
    .await?;

    Ok(Json(rank_students(rows, auth.id, Utc::now())))
}

async fn fetch_student(state: &AppState, auth: &AuthUser) -> Result<StudentRow, AppError> {
    let student: Option<StudentRow> = sqlx::query_as("SELECT * FROM students WHERE id = $1")
        .bind(auth.id)
        .fetch_optional(&state.db)
        .await?;
    student.ok_or_else(|| AppError::NotFound("student record not found".to_string()))
}
