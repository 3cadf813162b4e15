//! Leaderboard ranking. The handler fetches rows; everything interesting is
//! in `rank_students`, which is pure so ordering and TTL filtering stay
//! testable without a database.

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;
use uuid::Uuid;

use crate::scoring::is_expired;

#[derive(Debug, Clone, FromRow)]
pub struct LeaderboardRow {
    pub student_id: Uuid,
    pub name: String,
    pub total_score: f64,
    pub computed_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct LeaderboardEntry {
    pub rank: u32,
    pub student_id: Uuid,
    pub name: String,
    pub total_score: f64,
    pub is_me: bool,
}

/// Orders by total descending, drops expired scores, assigns 1-based ranks,
/// and flags the requesting student's row.
pub fn rank_students(
    mut rows: Vec<LeaderboardRow>,
    me: Uuid,
    now: DateTime<Utc>,
) -> Vec<LeaderboardEntry> {
    rows.retain(|row| !is_expired(row.computed_at, now));
    rows.sort_by(|a, b| {
        b.total_score
            .partial_cmp(&a.total_score)
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    rows.into_iter()
        .enumerate()
        .map(|(i, row)| LeaderboardEntry {
            rank: i as u32 + 1,
            is_me: row.student_id == me,
            student_id: row.student_id,
            name: row.name,
            total_score: row.total_score,
        })
        .collect()
}
