use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::FromRow;
use uuid::Uuid;

/// Cached aggregate score row. Derived data with a 7-day TTL; recomputed on
/// demand or on expiry, never authoritative.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct StudentScoreRow {
    pub student_id: Uuid,
    pub platform_scores: Value,
    pub total_score: f64,
    pub computed_at: DateTime<Utc>,
}
