//! CodeChef scraper — regex extraction over the public profile page. CodeChef
//! has no public stats API, so this matches live markup and is the most
//! drift-prone scraper in the set. A failed rating match is a parse error,
//! never a zeroed snapshot.

use regex::Regex;

use super::{ScrapeError, USER_AGENT};
use crate::models::platform::{CodeChefStats, Platform};

const PROFILE_URL: &str = "https://www.codechef.com/users";

pub async fn scrape(http: &reqwest::Client, username: &str) -> Result<CodeChefStats, ScrapeError> {
    let response = http
        .get(format!("{PROFILE_URL}/{username}"))
        .header("user-agent", USER_AGENT)
        .send()
        .await?;

    let status = response.status();
    if status.as_u16() == 404 {
        return Err(ScrapeError::UnknownHandle {
            platform: Platform::CodeChef,
            handle: username.to_string(),
        });
    }
    if !status.is_success() {
        return Err(ScrapeError::Status {
            platform: Platform::CodeChef,
            status: status.as_u16(),
        });
    }

    let html = response.text().await?;
    parse_profile(&html, username)
}

pub fn parse_profile(html: &str, username: &str) -> Result<CodeChefStats, ScrapeError> {
    // Unknown handles bounce to the homepage with a 200, so check the body.
    if html.contains("The username specified is unavailable")
        || html.contains("could not be found")
    {
        return Err(ScrapeError::UnknownHandle {
            platform: Platform::CodeChef,
            handle: username.to_string(),
        });
    }

    // <div class="rating-number">1834</div> — the page's one stable anchor.
    let rating = capture_u32(html, r#"class="rating-number">\s*(\d+)"#).ok_or_else(|| {
        ScrapeError::parse(Platform::CodeChef, "rating-number marker not found")
    })?;

    // <div class="rating-star"><span>★</span>...</div> star glyph count,
    // falling back to the "4★" shorthand next to the username.
    let stars = count_matches(html, r#"<span[^>]*>★</span>"#)
        .or_else(|| capture_u32(html, r#"(\d)★"#))
        .unwrap_or(0);

    let highest_rating =
        capture_u32(html, r#"Highest Rating\s*(\d+)"#).unwrap_or(rating);

    let fully_solved = capture_u32(html, r#"Total Problems Solved:\s*(\d+)"#)
        .or_else(|| capture_u32(html, r#"Fully Solved\s*\((\d+)\)"#))
        .unwrap_or(0);

    Ok(CodeChefStats {
        rating,
        highest_rating,
        stars,
        fully_solved,
    })
}

fn capture_u32(html: &str, pattern: &str) -> Option<u32> {
    let re = Regex::new(pattern).ok()?;
    re.captures(html)?.get(1)?.as_str().parse().ok()
}

fn count_matches(html: &str, pattern: &str) -> Option<u32> {
    let re = Regex::new(pattern).ok()?;
    let count = re.find_iter(html).count() as u32;
    (count > 0).then_some(count)
}

#[cfg(test)]
mod tests {
    use super::*;

    // Trimmed capture of a live profile page, markup structure intact.
    const FIXTURE: &str = r#"
        <div class="user-details-container">
            <header><h1 class="h2-style">alice</h1></header>
            <div class="rating-star"><span>★</span><span>★</span><span>★</span></div>
        </div>
        <div class="rating-header text-center">
            <div class="rating-number">1834</div>
            <small>(Highest Rating 1902)</small>
        </div>
        <section class="rating-data-section problems-solved">
            <h3 class="m-t-20">Total Problems Solved: 412</h3>
        </section>
    "#;

    #[test]
    fn parses_profile_markup() {
        let stats = parse_profile(FIXTURE, "alice").unwrap();
        assert_eq!(stats.rating, 1834);
        assert_eq!(stats.highest_rating, 1902);
        assert_eq!(stats.stars, 3);
        assert_eq!(stats.fully_solved, 412);
    }

    #[test]
    fn missing_rating_marker_is_parse_error_not_zeroes() {
        let drifted = r#"<div class="totally-new-layout">1834</div>"#;
        assert!(matches!(
            parse_profile(drifted, "alice"),
            Err(ScrapeError::Parse { .. })
        ));
    }

    #[test]
    fn unknown_user_page_detected_from_body() {
        let body = "<p>The username specified is unavailable</p>";
        assert!(matches!(
            parse_profile(body, "ghost"),
            Err(ScrapeError::UnknownHandle { .. })
        ));
    }

    #[test]
    fn highest_rating_falls_back_to_current() {
        let html = r#"<div class="rating-number">1500</div>"#;
        let stats = parse_profile(html, "alice").unwrap();
        assert_eq!(stats.highest_rating, 1500);
        assert_eq!(stats.stars, 0);
        assert_eq!(stats.fully_solved, 0);
    }
}
