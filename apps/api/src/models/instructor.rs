use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct InstructorRow {
    pub id: Uuid,
    pub department: String,
    pub title: Option<String>,
    pub created_at: DateTime<Utc>,
}
