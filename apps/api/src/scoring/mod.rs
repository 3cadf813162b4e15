//! CodeSync scoring — maps per-platform stats snapshots to a numeric skill
//! per platform and an aggregate total.
//!
//! This module is the single implementation of the score formulas; both the
//! per-student refresh path and the instructor batch path call it. All
//! functions are pure and deterministic for fixed inputs.

use std::collections::BTreeMap;

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use serde_json::Value;

use crate::models::platform::{
    AtCoderStats, CodeChefStats, CodeforcesStats, GitHubStats, HackerRankStats, LeetCodeStats,
    Platform,
};

/// Cached scores older than this are recomputed on the next read.
pub const SCORE_TTL_DAYS: i64 = 7;

/// Aggregate score for one student: per-platform skills plus their sum.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ScoreBreakdown {
    pub platform_scores: BTreeMap<Platform, f64>,
    pub total_score: f64,
}

/// Computes the full breakdown from whatever snapshots exist. Platforms
/// without a snapshot contribute 0. Snapshots that no longer deserialize
/// (upstream drift since the last scrape) also contribute 0.
pub fn compute_scores<'a, I>(profiles: I) -> ScoreBreakdown
where
    I: IntoIterator<Item = (Platform, &'a Value)>,
{
    let mut platform_scores = BTreeMap::new();
    let mut total = 0.0_f64;

    for (platform, stats) in profiles {
        let skill = platform_skill(platform, stats);
        total += skill;
        platform_scores.insert(platform, skill);
    }

    ScoreBreakdown {
        platform_scores,
        total_score: round2(total),
    }
}

/// Skill for a single platform from its raw stats snapshot.
pub fn platform_skill(platform: Platform, stats: &Value) -> f64 {
    let skill = match platform {
        Platform::LeetCode => serde_json::from_value::<LeetCodeStats>(stats.clone())
            .map(|s| leetcode_skill(&s))
            .unwrap_or(0.0),
        Platform::Codeforces => serde_json::from_value::<CodeforcesStats>(stats.clone())
            .map(|s| codeforces_skill(&s))
            .unwrap_or(0.0),
        Platform::CodeChef => serde_json::from_value::<CodeChefStats>(stats.clone())
            .map(|s| codechef_skill(&s))
            .unwrap_or(0.0),
        Platform::HackerRank => serde_json::from_value::<HackerRankStats>(stats.clone())
            .map(|s| hackerrank_skill(&s))
            .unwrap_or(0.0),
        Platform::GitHub => serde_json::from_value::<GitHubStats>(stats.clone())
            .map(|s| github_skill(&s))
            .unwrap_or(0.0),
        Platform::AtCoder => serde_json::from_value::<AtCoderStats>(stats.clone())
            .map(|s| atcoder_skill(&s))
            .unwrap_or(0.0),
    };
    round2(skill)
}

// Hand-picked linear coefficients over raw counts and ratings. Difficulty
// tiers weigh 1/3/5; ratings are scaled so a ~2000-rated account lands in
// the same order of magnitude as a few hundred solves.

fn leetcode_skill(s: &LeetCodeStats) -> f64 {
    f64::from(s.easy_solved)
        + f64::from(s.medium_solved) * 3.0
        + f64::from(s.hard_solved) * 5.0
        + s.contest_rating * 0.05
        + f64::from(s.contests_attended) * 2.0
}

fn codeforces_skill(s: &CodeforcesStats) -> f64 {
    f64::from(s.rating) * 0.5 + f64::from(s.max_rating) * 0.1 + f64::from(s.contests) * 2.0
}

fn codechef_skill(s: &CodeChefStats) -> f64 {
    f64::from(s.rating) * 0.4 + f64::from(s.stars) * 25.0 + f64::from(s.fully_solved) * 2.0
}

fn hackerrank_skill(s: &HackerRankStats) -> f64 {
    let badge_stars: u32 = s.badges.iter().map(|b| b.stars).sum();
    f64::from(badge_stars) * 12.0 + f64::from(s.followers) * 0.5
}

fn github_skill(s: &GitHubStats) -> f64 {
    f64::from(s.public_repos) * 4.0
        + f64::from(s.total_stars) * 3.0
        + f64::from(s.followers) * 2.0
        + f64::from(s.total_forks)
}

fn atcoder_skill(s: &AtCoderStats) -> f64 {
    f64::from(s.rating) * 0.5 + f64::from(s.accepted) * 1.5 + f64::from(s.contests) * 2.0
}

/// True when a cached score has outlived the 7-day TTL.
pub fn is_expired(computed_at: DateTime<Utc>, now: DateTime<Utc>) -> bool {
    now - computed_at > Duration::days(SCORE_TTL_DAYS)
}

pub fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn leetcode_snapshot() -> Value {
        json!({
            "easy_solved": 50,
            "medium_solved": 30,
            "hard_solved": 10,
            "total_solved": 90,
            "ranking": 150000,
            "contest_rating": 1600.0,
            "contests_attended": 5
        })
    }

    #[test]
    fn leetcode_formula_is_deterministic() {
        // 50 + 30*3 + 10*5 + 1600*0.05 + 5*2 = 50 + 90 + 50 + 80 + 10 = 280
        let skill = platform_skill(Platform::LeetCode, &leetcode_snapshot());
        assert_eq!(skill, 280.0);
        assert_eq!(skill, platform_skill(Platform::LeetCode, &leetcode_snapshot()));
    }

    #[test]
    fn codeforces_formula() {
        let stats = json!({"rating": 1400, "max_rating": 1500, "rank": "specialist", "contests": 20});
        // 1400*0.5 + 1500*0.1 + 20*2 = 700 + 150 + 40
        assert_eq!(platform_skill(Platform::Codeforces, &stats), 890.0);
    }

    #[test]
    fn hackerrank_sums_badge_stars() {
        let stats = json!({
            "badges": [{"name": "Problem Solving", "stars": 5}, {"name": "Python", "stars": 3}],
            "followers": 10
        });
        // (5+3)*12 + 10*0.5 = 96 + 5
        assert_eq!(platform_skill(Platform::HackerRank, &stats), 101.0);
    }

    #[test]
    fn total_is_sum_of_parts() {
        let cf = json!({"rating": 1000, "max_rating": 1000, "rank": "pupil", "contests": 0});
        let gh = json!({"public_repos": 10, "followers": 5, "total_stars": 2, "total_forks": 1});
        let profiles = vec![(Platform::Codeforces, &cf), (Platform::GitHub, &gh)];

        let breakdown = compute_scores(profiles);
        assert_eq!(breakdown.platform_scores.len(), 2);
        let sum: f64 = breakdown.platform_scores.values().sum();
        assert_eq!(breakdown.total_score, round2(sum));
    }

    #[test]
    fn missing_platforms_contribute_zero() {
        let profiles: Vec<(Platform, &Value)> = Vec::new();
        let breakdown = compute_scores(profiles);
        assert_eq!(breakdown.total_score, 0.0);
        assert!(breakdown.platform_scores.is_empty());
    }

    #[test]
    fn malformed_snapshot_scores_zero_not_error() {
        let drifted = json!({"unexpected": "shape"});
        // serde fills missing fields via Default, so a fully alien shape still
        // deserializes to zeroed stats; an array does not.
        let arr = json!([1, 2, 3]);
        assert_eq!(platform_skill(Platform::AtCoder, &arr), 0.0);
        assert_eq!(platform_skill(Platform::GitHub, &drifted), 0.0);
    }

    #[test]
    fn scores_round_to_two_decimals() {
        let stats = json!({"badges": [], "followers": 1});
        assert_eq!(platform_skill(Platform::HackerRank, &stats), 0.5);

        let cf = json!({"rating": 1, "max_rating": 1, "rank": "newbie", "contests": 0});
        // 0.5 + 0.1 = 0.6
        assert_eq!(platform_skill(Platform::Codeforces, &cf), 0.6);
    }

    #[test]
    fn ttl_boundary() {
        let now = Utc::now();
        assert!(!is_expired(now - Duration::days(6), now));
        assert!(is_expired(now - Duration::days(8), now));
    }
}
