use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::FromRow;
use uuid::Uuid;

use crate::models::platform::{HandleMap, Platform};

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct StudentRow {
    pub id: Uuid,
    pub roll_no: Option<String>,
    pub branch: Option<String>,
    pub graduation_year: Option<i32>,
    pub cp_handles: Value,
    pub onboarding_complete: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl StudentRow {
    /// Typed view of the JSONB handle map. Unknown platform keys are dropped.
    pub fn handles(&self) -> HandleMap {
        parse_handles(&self.cp_handles)
    }
}

pub fn parse_handles(value: &Value) -> HandleMap {
    let mut map = HandleMap::new();
    if let Some(obj) = value.as_object() {
        for (key, v) in obj {
            if let (Some(platform), Some(handle)) = (Platform::parse(key), v.as_str()) {
                if !handle.trim().is_empty() {
                    map.insert(platform, handle.trim().to_string());
                }
            }
        }
    }
    map
}

/// Last-scraped snapshot of one platform's public stats for one student.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct CpProfileRow {
    pub student_id: Uuid,
    pub platform: String,
    pub handle: String,
    pub stats: Value,
    pub scraped_at: DateTime<Utc>,
}

/// Platforms whose profile rows must be dropped when the handle map changes
/// from `old` to `new`: anything previously linked that is now missing or
/// points at a different username.
pub fn handles_to_clear(old: &HandleMap, new: &HandleMap) -> Vec<Platform> {
    old.iter()
        .filter(|(platform, handle)| new.get(platform) != Some(handle))
        .map(|(platform, _)| *platform)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parse_handles_drops_unknown_platforms_and_blanks() {
        let value = json!({
            "leetcode": "alice",
            "topcoder": "alice",
            "github": "  ",
            "atcoder": " alice_ac "
        });
        let map = parse_handles(&value);
        assert_eq!(map.len(), 2);
        assert_eq!(map.get(&Platform::LeetCode).map(String::as_str), Some("alice"));
        assert_eq!(map.get(&Platform::AtCoder).map(String::as_str), Some("alice_ac"));
    }

    #[test]
    fn cleared_handle_yields_exactly_that_platform() {
        let old: HandleMap = [
            (Platform::LeetCode, "alice".to_string()),
            (Platform::GitHub, "alice-gh".to_string()),
        ]
        .into_iter()
        .collect();
        let new: HandleMap = [(Platform::GitHub, "alice-gh".to_string())].into_iter().collect();

        assert_eq!(handles_to_clear(&old, &new), vec![Platform::LeetCode]);
    }

    #[test]
    fn changed_handle_clears_stale_snapshot() {
        let old: HandleMap = [(Platform::Codeforces, "alice".to_string())].into_iter().collect();
        let new: HandleMap = [(Platform::Codeforces, "bob".to_string())].into_iter().collect();

        assert_eq!(handles_to_clear(&old, &new), vec![Platform::Codeforces]);
    }

    #[test]
    fn unchanged_handles_clear_nothing() {
        let map: HandleMap = [
            (Platform::LeetCode, "alice".to_string()),
            (Platform::AtCoder, "alice_ac".to_string()),
        ]
        .into_iter()
        .collect();

        assert!(handles_to_clear(&map, &map).is_empty());
    }
}
