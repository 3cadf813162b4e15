//! Platform identifiers and the per-platform stats snapshots stored in
//! `cp_profiles.stats`. Each snapshot is written wholesale on refresh and
//! read back for scoring; the shapes here are the contract between the
//! scrapers and the scoring module.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// The six platforms a student can link.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    LeetCode,
    Codeforces,
    CodeChef,
    HackerRank,
    GitHub,
    AtCoder,
}

impl Platform {
    pub const ALL: [Platform; 6] = [
        Platform::LeetCode,
        Platform::Codeforces,
        Platform::CodeChef,
        Platform::HackerRank,
        Platform::GitHub,
        Platform::AtCoder,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Platform::LeetCode => "leetcode",
            Platform::Codeforces => "codeforces",
            Platform::CodeChef => "codechef",
            Platform::HackerRank => "hackerrank",
            Platform::GitHub => "github",
            Platform::AtCoder => "atcoder",
        }
    }

    pub fn parse(s: &str) -> Option<Platform> {
        match s {
            "leetcode" => Some(Platform::LeetCode),
            "codeforces" => Some(Platform::Codeforces),
            "codechef" => Some(Platform::CodeChef),
            "hackerrank" => Some(Platform::HackerRank),
            "github" => Some(Platform::GitHub),
            "atcoder" => Some(Platform::AtCoder),
            _ => None,
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Map of platform → username, as stored in `students.cp_handles`.
pub type HandleMap = BTreeMap<Platform, String>;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LeetCodeStats {
    pub easy_solved: u32,
    pub medium_solved: u32,
    pub hard_solved: u32,
    pub total_solved: u32,
    pub ranking: u32,
    pub contest_rating: f64,
    pub contests_attended: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CodeforcesStats {
    pub rating: u32,
    pub max_rating: u32,
    pub rank: String,
    pub contests: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CodeChefStats {
    pub rating: u32,
    pub highest_rating: u32,
    pub stars: u32,
    pub fully_solved: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HackerRankBadge {
    pub name: String,
    pub stars: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HackerRankStats {
    pub badges: Vec<HackerRankBadge>,
    pub followers: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GitHubStats {
    pub public_repos: u32,
    pub followers: u32,
    pub total_stars: u32,
    pub total_forks: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AtCoderStats {
    pub rating: u32,
    pub highest_rating: u32,
    pub contests: u32,
    pub accepted: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn platform_serde_uses_lowercase_names() {
        let json = serde_json::to_string(&Platform::LeetCode).unwrap();
        assert_eq!(json, r#""leetcode""#);
        let p: Platform = serde_json::from_str(r#""atcoder""#).unwrap();
        assert_eq!(p, Platform::AtCoder);
    }

    #[test]
    fn platform_parse_round_trips_all() {
        for p in Platform::ALL {
            assert_eq!(Platform::parse(p.as_str()), Some(p));
        }
        assert_eq!(Platform::parse("topcoder"), None);
    }

    #[test]
    fn handle_map_deserializes_from_json_object() {
        let map: HandleMap =
            serde_json::from_str(r#"{"leetcode": "alice", "github": "alice-gh"}"#).unwrap();
        assert_eq!(map.get(&Platform::LeetCode).map(String::as_str), Some("alice"));
        assert_eq!(map.get(&Platform::GitHub).map(String::as_str), Some("alice-gh"));
    }
}
