//! Platform scrapers. One module per platform, each issuing 1–3 outbound
//! requests against a public API or profile page and mapping the result into
//! the typed snapshot stored in `cp_profiles.stats`.
//!
//! Failure mode: any network or parse error returns `Err` and the caller
//! keeps the previous snapshot. No retries, no backoff.
//!
//! Fetching and parsing are separate functions so every parser is testable
//! offline against captured fixtures.

pub mod atcoder;
pub mod codechef;
pub mod codeforces;
pub mod github;
pub mod hackerrank;
pub mod leetcode;

use serde_json::Value;
use thiserror::Error;

use crate::models::platform::Platform;

/// Sent on every outbound request; GitHub and HackerRank reject UA-less calls.
pub const USER_AGENT: &str = concat!("codesync-api/", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Error)]
pub enum ScrapeError {
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("{platform}: unknown handle '{handle}'")]
    UnknownHandle { platform: Platform, handle: String },

    #[error("{platform}: unexpected upstream status {status}")]
    Status { platform: Platform, status: u16 },

    #[error("{platform}: parse error: {detail}")]
    Parse { platform: Platform, detail: String },
}

impl ScrapeError {
    pub fn parse(platform: Platform, detail: impl Into<String>) -> Self {
        ScrapeError::Parse {
            platform,
            detail: detail.into(),
        }
    }
}

/// Scrapes one platform and returns the snapshot as the JSON document stored
/// in `cp_profiles.stats`.
pub async fn scrape_platform(
    http: &reqwest::Client,
    platform: Platform,
    handle: &str,
) -> Result<Value, ScrapeError> {
    let stats = match platform {
        Platform::LeetCode => serde_json::to_value(leetcode::scrape(http, handle).await?),
        Platform::Codeforces => serde_json::to_value(codeforces::scrape(http, handle).await?),
        Platform::CodeChef => serde_json::to_value(codechef::scrape(http, handle).await?),
        Platform::HackerRank => serde_json::to_value(hackerrank::scrape(http, handle).await?),
        Platform::GitHub => serde_json::to_value(github::scrape(http, handle).await?),
        Platform::AtCoder => serde_json::to_value(atcoder::scrape(http, handle).await?),
    };
    stats.map_err(|e| ScrapeError::parse(platform, e.to_string()))
}
