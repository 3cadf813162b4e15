//! AtCoder scraper — contest history from atcoder.jp's history JSON plus the
//! accepted-problem count from the kenkoooo AtCoder Problems API.

use serde::Deserialize;
use serde_json::Value;

use super::{ScrapeError, USER_AGENT};
use crate::models::platform::{AtCoderStats, Platform};

const HISTORY_URL: &str = "https://atcoder.jp/users";
const AC_COUNT_URL: &str = "https://kenkoooo.com/atcoder/atcoder-api/v3/user/ac_rank";

#[derive(Debug, Deserialize, Default)]
#[serde(default, rename_all = "PascalCase")]
struct HistoryEntry {
    is_rated: bool,
    new_rating: u32,
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct AcRank {
    count: u32,
}

pub async fn scrape(http: &reqwest::Client, username: &str) -> Result<AtCoderStats, ScrapeError> {
    let history_raw = get(http, &format!("{HISTORY_URL}/{username}/history/json"), username).await?;
    let ac_raw = get(http, &format!("{AC_COUNT_URL}?user={username}"), username).await?;

    let mut stats = parse_history(&history_raw)?;
    stats.accepted = parse_ac_count(&ac_raw)?;
    Ok(stats)
}

async fn get(http: &reqwest::Client, url: &str, username: &str) -> Result<Value, ScrapeError> {
    let response = http.get(url).header("user-agent", USER_AGENT).send().await?;

    let status = response.status();
    if status.as_u16() == 404 {
        return Err(ScrapeError::UnknownHandle {
            platform: Platform::AtCoder,
            handle: username.to_string(),
        });
    }
    if !status.is_success() {
        return Err(ScrapeError::Status {
            platform: Platform::AtCoder,
            status: status.as_u16(),
        });
    }
    Ok(response.json().await?)
}

/// An empty history is a real account that has never competed: unrated, zero
/// contests.
pub fn parse_history(raw: &Value) -> Result<AtCoderStats, ScrapeError> {
    let entries: Vec<HistoryEntry> = serde_json::from_value(raw.clone())
        .map_err(|e| ScrapeError::parse(Platform::AtCoder, e.to_string()))?;

    let rated: Vec<&HistoryEntry> = entries.iter().filter(|e| e.is_rated).collect();
    let rating = rated.last().map(|e| e.new_rating).unwrap_or(0);
    let highest_rating = rated.iter().map(|e| e.new_rating).max().unwrap_or(0);

    Ok(AtCoderStats {
        rating,
        highest_rating,
        contests: rated.len() as u32,
        accepted: 0,
    })
}

pub fn parse_ac_count(raw: &Value) -> Result<u32, ScrapeError> {
    let rank: AcRank = serde_json::from_value(raw.clone())
        .map_err(|e| ScrapeError::parse(Platform::AtCoder, e.to_string()))?;
    Ok(rank.count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_rated_history() {
        let raw = json!([
            { "IsRated": true, "NewRating": 410, "ContestName": "ABC 301" },
            { "IsRated": false, "NewRating": 0, "ContestName": "ARC unrated run" },
            { "IsRated": true, "NewRating": 523, "ContestName": "ABC 305" },
            { "IsRated": true, "NewRating": 488, "ContestName": "ABC 309" }
        ]);
        let stats = parse_history(&raw).unwrap();
        assert_eq!(stats.rating, 488);
        assert_eq!(stats.highest_rating, 523);
        assert_eq!(stats.contests, 3);
    }

    #[test]
    fn empty_history_is_unrated() {
        let raw = json!([]);
        let stats = parse_history(&raw).unwrap();
        assert_eq!(stats.rating, 0);
        assert_eq!(stats.highest_rating, 0);
        assert_eq!(stats.contests, 0);
    }

    #[test]
    fn parses_ac_count() {
        let raw = json!({ "count": 231, "rank": 14021 });
        assert_eq!(parse_ac_count(&raw).unwrap(), 231);
    }

    #[test]
    fn html_error_page_is_parse_error() {
        let raw = json!("<html>maintenance</html>");
        assert!(matches!(parse_history(&raw), Err(ScrapeError::Parse { .. })));
    }
}
