//! LeetCode scraper — one GraphQL call covering solved counts by difficulty,
//! global ranking, and contest history.

use serde::Deserialize;
use serde_json::{json, Value};

use super::{ScrapeError, USER_AGENT};
use crate::models::platform::{LeetCodeStats, Platform};

const GRAPHQL_URL: &str = "https://leetcode.com/graphql";

const PROFILE_QUERY: &str = r#"
query userProfile($username: String!) {
  matchedUser(username: $username) {
    profile { ranking }
    submitStatsGlobal {
      acSubmissionNum { difficulty count }
    }
  }
  userContestRanking(username: $username) {
    rating
    attendedContestsCount
  }
}
"#;

#[derive(Debug, Deserialize)]
struct GraphQlResponse {
    data: Option<ProfileData>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(default, rename_all = "camelCase")]
struct ProfileData {
    matched_user: Option<MatchedUser>,
    user_contest_ranking: Option<ContestRanking>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(default, rename_all = "camelCase")]
struct MatchedUser {
    profile: Option<Profile>,
    submit_stats_global: Option<SubmitStats>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct Profile {
    ranking: Option<u32>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(default, rename_all = "camelCase")]
struct SubmitStats {
    ac_submission_num: Vec<AcCount>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct AcCount {
    difficulty: String,
    count: u32,
}

#[derive(Debug, Deserialize, Default)]
#[serde(default, rename_all = "camelCase")]
struct ContestRanking {
    rating: Option<f64>,
    attended_contests_count: Option<u32>,
}

pub async fn scrape(http: &reqwest::Client, username: &str) -> Result<LeetCodeStats, ScrapeError> {
    let body = json!({
        "query": PROFILE_QUERY,
        "variables": { "username": username },
    });

    let response = http
        .post(GRAPHQL_URL)
        .header("user-agent", USER_AGENT)
        .json(&body)
        .send()
        .await?;

    let status = response.status();
    if !status.is_success() {
        return Err(ScrapeError::Status {
            platform: Platform::LeetCode,
            status: status.as_u16(),
        });
    }

    let raw: Value = response.json().await?;
    parse_profile(&raw, username)
}

/// Maps the GraphQL response into a snapshot. A null `matchedUser` means the
/// handle does not exist; a null `userContestRanking` just means the user has
/// never attended a contest.
pub fn parse_profile(raw: &Value, username: &str) -> Result<LeetCodeStats, ScrapeError> {
    let parsed: GraphQlResponse = serde_json::from_value(raw.clone())
        .map_err(|e| ScrapeError::parse(Platform::LeetCode, e.to_string()))?;

    let data = parsed
        .data
        .ok_or_else(|| ScrapeError::parse(Platform::LeetCode, "missing data envelope"))?;

    let user = data.matched_user.ok_or_else(|| ScrapeError::UnknownHandle {
        platform: Platform::LeetCode,
        handle: username.to_string(),
    })?;

    let mut stats = LeetCodeStats::default();
    if let Some(submit_stats) = user.submit_stats_global {
        for entry in submit_stats.ac_submission_num {
            match entry.difficulty.as_str() {
                "All" => stats.total_solved = entry.count,
                "Easy" => stats.easy_solved = entry.count,
                "Medium" => stats.medium_solved = entry.count,
                "Hard" => stats.hard_solved = entry.count,
                _ => {}
            }
        }
    }
    stats.ranking = user.profile.and_then(|p| p.ranking).unwrap_or(0);

    if let Some(contest) = data.user_contest_ranking {
        stats.contest_rating = contest.rating.unwrap_or(0.0);
        stats.contests_attended = contest.attended_contests_count.unwrap_or(0);
    }

    Ok(stats)
}
