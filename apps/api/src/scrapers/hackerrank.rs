//! HackerRank scraper — two calls against the undocumented REST endpoints the
//! profile SPA itself uses: hacker profile for follower count, badges for the
//! starred badge list.

use serde::Deserialize;
use serde_json::Value;

use super::{ScrapeError, USER_AGENT};
use crate::models::platform::{HackerRankBadge, HackerRankStats, Platform};

const PROFILE_URL: &str = "https://www.hackerrank.com/rest/contests/master/hackers";
const BADGES_URL: &str = "https://www.hackerrank.com/rest/hackers";

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct ProfileEnvelope {
    model: Option<ProfileModel>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct ProfileModel {
    followers_count: Option<u32>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct BadgesEnvelope {
    models: Vec<BadgeModel>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct BadgeModel {
    badge_name: Option<String>,
    stars: Option<u32>,
}

pub async fn scrape(http: &reqwest::Client, username: &str) -> Result<HackerRankStats, ScrapeError> {
    let profile_raw = get(http, &format!("{PROFILE_URL}/{username}/profile"), username).await?;
    let badges_raw = get(http, &format!("{BADGES_URL}/{username}/badges"), username).await?;

    let mut stats = parse_badges(&badges_raw)?;
    stats.followers = parse_followers(&profile_raw)?;
    Ok(stats)
}

async fn get(http: &reqwest::Client, url: &str, username: &str) -> Result<Value, ScrapeError> {
    let response = http.get(url).header("user-agent", USER_AGENT).send().await?;

    let status = response.status();
    if status.as_u16() == 404 {
        return Err(ScrapeError::UnknownHandle {
            platform: Platform::HackerRank,
            handle: username.to_string(),
        });
    }
    if !status.is_success() {
        return Err(ScrapeError::Status {
            platform: Platform::HackerRank,
            status: status.as_u16(),
        });
    }
    Ok(response.json().await?)
}

pub fn parse_followers(raw: &Value) -> Result<u32, ScrapeError> {
    let envelope: ProfileEnvelope = serde_json::from_value(raw.clone())
        .map_err(|e| ScrapeError::parse(Platform::HackerRank, e.to_string()))?;
    Ok(envelope
        .model
        .and_then(|m| m.followers_count)
        .unwrap_or(0))
}

pub fn parse_badges(raw: &Value) -> Result<HackerRankStats, ScrapeError> {
    let envelope: BadgesEnvelope = serde_json::from_value(raw.clone())
        .map_err(|e| ScrapeError::parse(Platform::HackerRank, e.to_string()))?;

    let badges = envelope
        .models
        .into_iter()
        .filter_map(|b| {
            b.badge_name.map(|name| HackerRankBadge {
                name,
                stars: b.stars.unwrap_or(0),
            })
        })
        .collect();

    Ok(HackerRankStats {
        badges,
        followers: 0,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_badges_with_stars() {
        let raw = json!({
            "models": [
                { "badge_name": "Problem Solving", "stars": 5, "badge_type": "skill" },
                { "badge_name": "Python", "stars": 3 },
                { "stars": 2 }
            ]
        });
        let stats = parse_badges(&raw).unwrap();
        // Entries without a name are dropped.
        assert_eq!(stats.badges.len(), 2);
        assert_eq!(stats.badges[0].name, "Problem Solving");
        assert_eq!(stats.badges[0].stars, 5);
    }

    #[test]
    fn parses_follower_count() {
        let raw = json!({ "model": { "username": "alice", "followers_count": 42 } });
        assert_eq!(parse_followers(&raw).unwrap(), 42);
    }

    #[test]
    fn empty_profile_defaults_to_zero_followers() {
        let raw = json!({ "model": {} });
        assert_eq!(parse_followers(&raw).unwrap(), 0);
    }

    #[test]
    fn no_badges_is_a_valid_snapshot() {
        let raw = json!({ "models": [] });
        let stats = parse_badges(&raw).unwrap();
        assert!(stats.badges.is_empty());
    }
}
