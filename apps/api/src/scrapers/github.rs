//! GitHub scraper — user profile plus the first 100 repos (one page, fixed
//! count; stars and forks are summed over whatever that page returns).

use serde::Deserialize;
use serde_json::Value;

use super::{ScrapeError, USER_AGENT};
use crate::models::platform::{GitHubStats, Platform};

const API_BASE: &str = "https://api.github.com";

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct UserResponse {
    public_repos: Option<u32>,
    followers: Option<u32>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct RepoResponse {
    stargazers_count: Option<u32>,
    forks_count: Option<u32>,
}

pub async fn scrape(http: &reqwest::Client, username: &str) -> Result<GitHubStats, ScrapeError> {
    let user_raw = get(http, &format!("{API_BASE}/users/{username}"), username).await?;
    let repos_raw = get(
        http,
        &format!("{API_BASE}/users/{username}/repos?per_page=100&sort=updated"),
        username,
    )
    .await?;

    let mut stats = parse_user(&user_raw)?;
    let (stars, forks) = parse_repos(&repos_raw)?;
    stats.total_stars = stars;
    stats.total_forks = forks;
    Ok(stats)
}

async fn get(http: &reqwest::Client, url: &str, username: &str) -> Result<Value, ScrapeError> {
    let response = http
        .get(url)
        .header("user-agent", USER_AGENT)
        .header("accept", "application/vnd.github+json")
        .send()
        .await?;

    let status = response.status();
    if status.as_u16() == 404 {
        return Err(ScrapeError::UnknownHandle {
            platform: Platform::GitHub,
            handle: username.to_string(),
        });
    }
    if !status.is_success() {
        // 403 here is almost always the unauthenticated rate limit.
        return Err(ScrapeError::Status {
            platform: Platform::GitHub,
            status: status.as_u16(),
        });
    }
    Ok(response.json().await?)
}

pub fn parse_user(raw: &Value) -> Result<GitHubStats, ScrapeError> {
    let user: UserResponse = serde_json::from_value(raw.clone())
        .map_err(|e| ScrapeError::parse(Platform::GitHub, e.to_string()))?;
    Ok(GitHubStats {
        public_repos: user.public_repos.unwrap_or(0),
        followers: user.followers.unwrap_or(0),
        total_stars: 0,
        total_forks: 0,
    })
}

pub fn parse_repos(raw: &Value) -> Result<(u32, u32), ScrapeError> {
    let repos: Vec<RepoResponse> = serde_json::from_value(raw.clone())
        .map_err(|e| ScrapeError::parse(Platform::GitHub, e.to_string()))?;
    let stars = repos.iter().filter_map(|r| r.stargazers_count).sum();
    let forks = repos.iter().filter_map(|r| r.forks_count).sum();
    Ok((stars, forks))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_user_profile() {
        let raw = json!({
            "login": "alice",
            "public_repos": 24,
            "followers": 17,
            "following": 3
        });
        let stats = parse_user(&raw).unwrap();
        assert_eq!(stats.public_repos, 24);
        assert_eq!(stats.followers, 17);
    }

    #[test]
    fn sums_stars_and_forks_across_repos() {
        let raw = json!([
            { "name": "a", "stargazers_count": 10, "forks_count": 2 },
            { "name": "b", "stargazers_count": 5, "forks_count": 0 },
            { "name": "c", "stargazers_count": 0, "forks_count": 1 }
        ]);
        assert_eq!(parse_repos(&raw).unwrap(), (15, 3));
    }

    #[test]
    fn empty_repo_list_sums_to_zero() {
        let raw = json!([]);
        assert_eq!(parse_repos(&raw).unwrap(), (0, 0));
    }

    #[test]
    fn non_array_repos_is_parse_error() {
        let raw = json!({ "message": "API rate limit exceeded" });
        assert!(matches!(parse_repos(&raw), Err(ScrapeError::Parse { .. })));
    }
}
