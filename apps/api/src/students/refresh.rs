//! Stats refresh pipeline: fan out scrapes for one student, overwrite the
//! snapshots that succeeded, keep the ones that failed, recompute the cached
//! score from whatever is on disk afterwards.
//!
//! There is no rollback across platforms — a failed LeetCode scrape has no
//! bearing on a Codeforces snapshot written moments earlier.

use futures::future::join_all;
use futures::stream::{self, StreamExt};
use serde::Serialize;
use sqlx::PgPool;
use tracing::{info, warn};
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::platform::Platform;
use crate::models::student::{CpProfileRow, StudentRow};
use crate::scrapers::scrape_platform;
use crate::scoring::{compute_scores, ScoreBreakdown};
use crate::state::AppState;

/// Outbound scrapes for one student run at most this many at a time.
pub const MAX_CONCURRENT_SCRAPES: usize = 6;
/// Batch recomputation processes students in chunks of this size.
pub const BATCH_CHUNK_SIZE: usize = 10;

/// Scrapes every linked platform for one student and recomputes the cached
/// score. Individual scrape failures are logged and the previous snapshot
/// kept; only database errors abort the refresh.
pub async fn refresh_student(state: &AppState, student_id: Uuid) -> Result<ScoreBreakdown, AppError> {
    let student: Option<StudentRow> = sqlx::query_as("SELECT * FROM students WHERE id = $1")
        .bind(student_id)
        .fetch_optional(&state.db)
        .await?;
    let student = student
        .ok_or_else(|| AppError::NotFound(format!("student {student_id} not found")))?;

    let handles = student.handles();

    let results = stream::iter(handles)
        .map(|(platform, handle)| {
            let http = state.http.clone();
            async move {
                let outcome = scrape_platform(&http, platform, &handle).await;
                (platform, handle, outcome)
            }
        })
        .buffer_unordered(MAX_CONCURRENT_SCRAPES)
        .collect::<Vec<_>>()
        .await;

    let mut scraped = 0;
    for (platform, handle, outcome) in results {
        match outcome {
            Ok(stats) => {
                upsert_profile(&state.db, student_id, platform, &handle, &stats).await?;
                scraped += 1;
            }
            Err(e) => {
                warn!("scrape {platform}/{handle} failed, keeping previous snapshot: {e}");
            }
        }
    }
    info!("refreshed {scraped} platform snapshot(s) for student {student_id}");

    recompute_and_cache(&state.db, student_id).await
}

async fn upsert_profile(
    db: &PgPool,
    student_id: Uuid,
    platform: Platform,
    handle: &str,
    stats: &serde_json::Value,
) -> Result<(), AppError> {
    sqlx::query(
        r#"
        INSERT INTO cp_profiles (student_id, platform, handle, stats, scraped_at)
        VALUES ($1, $2, $3, $4, now())
        ON CONFLICT (student_id, platform)
        DO UPDATE SET handle = EXCLUDED.handle, stats = EXCLUDED.stats, scraped_at = now()
        "#,
    )
    .bind(student_id)
    .bind(platform.as_str())
    .bind(handle)
    .bind(stats)
    .execute(db)
    .await?;
    Ok(())
}

/// Recomputes the aggregate score from the stored snapshots and overwrites
/// the cache row. Used by the refresh path and by expired-score reads.
pub async fn recompute_and_cache(db: &PgPool, student_id: Uuid) -> Result<ScoreBreakdown, AppError> {
    let profiles: Vec<CpProfileRow> =
        sqlx::query_as("SELECT * FROM cp_profiles WHERE student_id = $1")
            .bind(student_id)
            .fetch_all(db)
            .await?;

    let pairs = profiles
        .iter()
        .filter_map(|row| Platform::parse(&row.platform).map(|p| (p, &row.stats)));
    let breakdown = compute_scores(pairs);

    sqlx::query(
        r#"
        INSERT INTO student_scores (student_id, platform_scores, total_score, computed_at)
        VALUES ($1, $2, $3, now())
        ON CONFLICT (student_id)
        DO UPDATE SET platform_scores = EXCLUDED.platform_scores,
                      total_score = EXCLUDED.total_score,
                      computed_at = now()
        "#,
    )
    .bind(student_id)
    .bind(serde_json::to_value(&breakdown.platform_scores).unwrap_or_default())
    .bind(breakdown.total_score)
    .execute(db)
    .await?;

    Ok(breakdown)
}

#[derive(Debug, Default, Serialize)]
pub struct BatchRefreshReport {
    pub total_students: usize,
    pub refreshed: usize,
    pub failed: usize,
}

/// Recomputes every student, `BATCH_CHUNK_SIZE` at a time. A failure only
/// skips that student; the batch carries on.
pub async fn refresh_all_students(state: &AppState) -> Result<BatchRefreshReport, AppError> {
    let ids: Vec<Uuid> = sqlx::query_scalar("SELECT id FROM students ORDER BY created_at")
        .fetch_all(&state.db)
        .await?;

    let mut report = BatchRefreshReport {
        total_students: ids.len(),
        ..Default::default()
    };

    for chunk in ids.chunks(BATCH_CHUNK_SIZE) {
        let outcomes = join_all(chunk.iter().map(|id| refresh_student(state, *id))).await;
        for (id, outcome) in chunk.iter().zip(outcomes) {
            match outcome {
                Ok(_) => report.refreshed += 1,
                Err(e) => {
                    warn!("batch refresh failed for student {id}: {e}");
                    report.failed += 1;
                }
            }
        }
    }

    info!(
        "batch refresh done: {}/{} refreshed, {} failed",
        report.refreshed, report.total_students, report.failed
    );
    Ok(report)
}
