//! Codeforces scraper — two calls against the official JSON API:
//! `user.info` for rating/rank and `user.rating` for contest history.

use serde::Deserialize;
use serde_json::Value;

use super::{ScrapeError, USER_AGENT};
use crate::models::platform::{CodeforcesStats, Platform};

const API_BASE: &str = "https://codeforces.com/api";

#[derive(Debug, Deserialize)]
struct ApiEnvelope {
    status: String,
    comment: Option<String>,
    result: Option<Value>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(default, rename_all = "camelCase")]
struct UserInfo {
    rating: Option<u32>,
    max_rating: Option<u32>,
    rank: Option<String>,
}

pub async fn scrape(http: &reqwest::Client, handle: &str) -> Result<CodeforcesStats, ScrapeError> {
    let info_raw = get(http, &format!("{API_BASE}/user.info?handles={handle}")).await?;
    let rating_raw = get(http, &format!("{API_BASE}/user.rating?handle={handle}")).await?;

    let mut stats = parse_user_info(&info_raw, handle)?;
    stats.contests = parse_contest_count(&rating_raw, handle)?;
    Ok(stats)
}

async fn get(http: &reqwest::Client, url: &str) -> Result<Value, ScrapeError> {
    let response = http.get(url).header("user-agent", USER_AGENT).send().await?;
    // The API reports handle errors as status FAILED inside a 400 body, so
    // read the body regardless of HTTP status.
    Ok(response.json().await?)
}

pub fn parse_user_info(raw: &Value, handle: &str) -> Result<CodeforcesStats, ScrapeError> {
    let result = unwrap_envelope(raw, handle)?;
    let users: Vec<UserInfo> = serde_json::from_value(result)
        .map_err(|e| ScrapeError::parse(Platform::Codeforces, e.to_string()))?;
    let user = users.into_iter().next().ok_or_else(|| ScrapeError::UnknownHandle {
        platform: Platform::Codeforces,
        handle: handle.to_string(),
    })?;

    Ok(CodeforcesStats {
        // Accounts with no rated contest carry no rating field: unrated.
        rating: user.rating.unwrap_or(0),
        max_rating: user.max_rating.unwrap_or(0),
        rank: user.rank.unwrap_or_else(|| "unrated".to_string()),
        contests: 0,
    })
}

pub fn parse_contest_count(raw: &Value, handle: &str) -> Result<u32, ScrapeError> {
    let result = unwrap_envelope(raw, handle)?;
    let entries = result
        .as_array()
        .ok_or_else(|| ScrapeError::parse(Platform::Codeforces, "user.rating result not an array"))?;
    Ok(entries.len() as u32)
}

fn unwrap_envelope(raw: &Value, handle: &str) -> Result<Value, ScrapeError> {
    let envelope: ApiEnvelope = serde_json::from_value(raw.clone())
        .map_err(|e| ScrapeError::parse(Platform::Codeforces, e.to_string()))?;

    if envelope.status != "OK" {
        let comment = envelope.comment.unwrap_or_default();
        if comment.contains("not found") {
            return Err(ScrapeError::UnknownHandle {
                platform: Platform::Codeforces,
                handle: handle.to_string(),
            });
        }
        return Err(ScrapeError::parse(
            Platform::Codeforces,
            format!("API status {}: {comment}", envelope.status),
        ));
    }

    envelope
        .result
        .ok_or_else(|| ScrapeError::parse(Platform::Codeforces, "OK envelope without result"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_rated_user() {
        let raw = json!({
            "status": "OK",
            "result": [{
                "handle": "alice",
                "rating": 1432,
                "maxRating": 1518,
                "rank": "specialist",
                "maxRank": "specialist"
            }]
        });
        let stats = parse_user_info(&raw, "alice").unwrap();
        assert_eq!(stats.rating, 1432);
        assert_eq!(stats.max_rating, 1518);
        assert_eq!(stats.rank, "specialist");
    }

    #[test]
    fn unrated_user_defaults_to_zero() {
        let raw = json!({
            "status": "OK",
            "result": [{ "handle": "newbie_account" }]
        });
        let stats = parse_user_info(&raw, "newbie_account").unwrap();
        assert_eq!(stats.rating, 0);
        assert_eq!(stats.rank, "unrated");
    }

    #[test]
    fn failed_status_with_not_found_is_unknown_handle() {
        let raw = json!({
            "status": "FAILED",
            "comment": "handles: User with handle ghost not found"
        });
        assert!(matches!(
            parse_user_info(&raw, "ghost"),
            Err(ScrapeError::UnknownHandle { .. })
        ));
    }

    #[test]
    fn contest_count_is_history_length() {
        let raw = json!({
            "status": "OK",
            "result": [
                { "contestId": 1, "newRating": 1400 },
                { "contestId": 2, "newRating": 1450 },
                { "contestId": 3, "newRating": 1432 }
            ]
        });
        assert_eq!(parse_contest_count(&raw, "alice").unwrap(), 3);
    }

    #[test]
    fn empty_history_means_zero_contests() {
        let raw = json!({ "status": "OK", "result": [] });
        assert_eq!(parse_contest_count(&raw, "alice").unwrap(), 0);
    }
}
