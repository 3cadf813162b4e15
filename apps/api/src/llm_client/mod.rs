//! Gemini client — the single point of entry for all LLM calls in CodeSync.
//! No other module may call the Gemini API directly.
//!
//! The client rotates round-robin over a pool of API keys. Per-key state is
//! in-memory only: a restart clears every cooldown and block. Quota
//! exhaustion (429) blocks a key for the process lifetime;
//! an overloaded upstream (503) puts the key in a short cooldown and the call
//! retries with linear backoff.

use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use reqwest::Client;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

pub mod prompts;

const GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta/models";
/// The model used for all LLM calls in CodeSync.
/// Intentionally hardcoded to prevent accidental drift.
pub const MODEL: &str = "gemini-1.5-flash";
const MAX_ATTEMPTS: u32 = 3;
const OVERLOAD_COOLDOWN: Duration = Duration::from_secs(60);

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("All API keys blocked or cooling down")]
    KeysExhausted,

    #[error("Upstream overloaded after {attempts} attempts")]
    Overloaded { attempts: u32 },

    #[error("LLM returned empty content")]
    EmptyContent,
}

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    contents: Vec<Content<'a>>,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    parts: Vec<Part<'a>>,
}

#[derive(Debug, Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    candidates: Option<Vec<Candidate>>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    parts: Option<Vec<CandidatePart>>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GeminiError {
    error: GeminiErrorBody,
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct GeminiErrorBody {
    message: String,
    status: String,
}

/// Per-key rotation state. `blocked_forever` keys are never retried;
/// `cooldown_until` keys come back once the instant passes.
struct KeyState {
    key: String,
    blocked_forever: bool,
    cooldown_until: Option<Instant>,
}

struct KeyRing {
    keys: Vec<KeyState>,
    cursor: usize,
}

impl KeyRing {
    fn new(keys: Vec<String>) -> Self {
        Self {
            keys: keys
                .into_iter()
                .map(|key| KeyState {
                    key,
                    blocked_forever: false,
                    cooldown_until: None,
                })
                .collect(),
            cursor: 0,
        }
    }

    /// Round-robin pick of the next usable key, skipping blocked keys and
    /// keys still in cooldown. Returns the key's index for later marking.
    fn next_available(&mut self, now: Instant) -> Option<(usize, String)> {
        let n = self.keys.len();
        for offset in 0..n {
            let idx = (self.cursor + offset) % n;
            let state = &self.keys[idx];
            if state.blocked_forever {
                continue;
            }
            if let Some(until) = state.cooldown_until {
                if until > now {
                    continue;
                }
            }
            self.cursor = (idx + 1) % n;
            return Some((idx, state.key.clone()));
        }
        None
    }

    fn block_forever(&mut self, idx: usize) {
        self.keys[idx].blocked_forever = true;
    }

    fn cool_down(&mut self, idx: usize, now: Instant) {
        self.keys[idx].cooldown_until = Some(now + OVERLOAD_COOLDOWN);
    }
}

/// The single Gemini client shared by all services.
#[derive(Clone)]
pub struct GeminiClient {
    client: Client,
    ring: Arc<Mutex<KeyRing>>,
}

impl GeminiClient {
    pub fn new(keys: Vec<String>) -> Self {
        Self {
            client: Client::builder()
                .timeout(Duration::from_secs(120))
                .build()
                .expect("Failed to build HTTP client"),
            ring: Arc::new(Mutex::new(KeyRing::new(keys))),
        }
    }

    /// Generates text for a prompt. Rotates keys on quota errors; retries up
    /// to 3 attempts with linear backoff (1s, 2s) when the upstream reports
    /// itself overloaded.
    pub async fn generate(&self, prompt: &str) -> Result<String, LlmError> {
        for attempt in 1..=MAX_ATTEMPTS {
            if attempt > 1 {
                // Linear backoff between overload retries.
                let delay = Duration::from_secs(u64::from(attempt - 1));
                warn!(
                    "Gemini overloaded, retrying (attempt {attempt}) after {}s",
                    delay.as_secs()
                );
                tokio::time::sleep(delay).await;
            }

            loop {
                let (idx, key) = self
                    .ring
                    .lock()
                    .expect("key ring lock poisoned")
                    .next_available(Instant::now())
                    .ok_or(LlmError::KeysExhausted)?;

                match self.call_with_key(prompt, &key).await {
                    Ok(text) => return Ok(text),
                    Err(CallOutcome::QuotaExhausted { message }) => {
                        // This key is spent for the billing period; drop it
                        // and move straight to the next one.
                        warn!("Gemini key #{idx} quota exhausted: {message}");
                        self.ring
                            .lock()
                            .expect("key ring lock poisoned")
                            .block_forever(idx);
                        continue;
                    }
                    Err(CallOutcome::Overloaded { message }) => {
                        warn!("Gemini key #{idx} overloaded: {message}");
                        self.ring
                            .lock()
                            .expect("key ring lock poisoned")
                            .cool_down(idx, Instant::now());
                        break; // consume an attempt, back off, try again
                    }
                    Err(CallOutcome::Fatal(e)) => return Err(e),
                }
            }
        }

        Err(LlmError::Overloaded {
            attempts: MAX_ATTEMPTS,
        })
    }

    /// Calls the LLM and deserializes the response text as JSON.
    /// The prompt must instruct the model to return valid JSON.
    pub async fn generate_json<T: DeserializeOwned>(&self, prompt: &str) -> Result<T, LlmError> {
        let text = self.generate(prompt).await?;
        let text = strip_json_fences(&text);
        serde_json::from_str(text).map_err(LlmError::Parse)
    }

    async fn call_with_key(&self, prompt: &str, key: &str) -> Result<String, CallOutcome> {
        let body = GenerateRequest {
            contents: vec![Content {
                parts: vec![Part { text: prompt }],
            }],
        };

        let response = self
            .client
            .post(format!("{GEMINI_API_BASE}/{MODEL}:generateContent"))
            .query(&[("key", key)])
            .json(&body)
            .send()
            .await
            .map_err(|e| CallOutcome::Fatal(LlmError::Http(e)))?;

        let status = response.status().as_u16();

        if !(200..300).contains(&status) {
            let raw = response.text().await.unwrap_or_default();
            let parsed = serde_json::from_str::<GeminiError>(&raw)
                .map(|e| e.error)
                .unwrap_or_default();
            let message = if parsed.message.is_empty() {
                raw
            } else {
                parsed.message
            };

            if status == 429 || parsed.status == "RESOURCE_EXHAUSTED" {
                return Err(CallOutcome::QuotaExhausted { message });
            }
            if status == 503 || parsed.status == "UNAVAILABLE" || message.contains("overloaded") {
                return Err(CallOutcome::Overloaded { message });
            }
            return Err(CallOutcome::Fatal(LlmError::Api { status, message }));
        }

        let parsed: GenerateResponse = response
            .json()
            .await
            .map_err(|e| CallOutcome::Fatal(LlmError::Http(e)))?;

        let text = parsed
            .candidates
            .and_then(|mut c| c.drain(..).next())
            .and_then(|c| c.content)
            .and_then(|c| c.parts)
            .and_then(|mut p| p.drain(..).next())
            .and_then(|p| p.text)
            .ok_or(CallOutcome::Fatal(LlmError::EmptyContent))?;

        debug!("Gemini call succeeded ({} chars)", text.len());
        Ok(text)
    }
}

/// Internal classification of a single-key call, driving rotation vs retry.
enum CallOutcome {
    QuotaExhausted { message: String },
    Overloaded { message: String },
    Fatal(LlmError),
}

/// Strips ```json ... ``` or ``` ... ``` code fences from LLM output.
fn strip_json_fences(text: &str) -> &str {
    let text = text.trim();
    if let Some(stripped) = text.strip_prefix("```json") {
        stripped
            .trim_start()
            .strip_suffix("```")
            .map(|s| s.trim())
            .unwrap_or(stripped.trim_start())
    } else if let Some(stripped) = text.strip_prefix("```") {
        stripped
            .trim_start()
            .strip_suffix("```")
            .map(|s| s.trim())
            .unwrap_or(stripped.trim_start())
    } else {
        text
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_json_fences_with_json_tag() {
        let input = "```json\n{\"key\": \"value\"}\n```";
        assert_eq!(strip_json_fences(input), "{\"key\": \"value\"}");
    }

    #[test]
    fn test_strip_json_fences_without_tag() {
        let input = "```\n{\"key\": \"value\"}\n```";
        assert_eq!(strip_json_fences(input), "{\"key\": \"value\"}");
    }

    #[test]
    fn test_strip_json_fences_no_fences() {
        let input = "{\"key\": \"value\"}";
        assert_eq!(strip_json_fences(input), "{\"key\": \"value\"}");
    }

    #[test]
    fn ring_rotates_round_robin() {
        let mut ring = KeyRing::new(vec!["a".into(), "b".into(), "c".into()]);
        let now = Instant::now();
        assert_eq!(ring.next_available(now).unwrap().1, "a");
        assert_eq!(ring.next_available(now).unwrap().1, "b");
        assert_eq!(ring.next_available(now).unwrap().1, "c");
        assert_eq!(ring.next_available(now).unwrap().1, "a");
    }

    #[test]
    fn ring_skips_blocked_keys_forever() {
        let mut ring = KeyRing::new(vec!["a".into(), "b".into()]);
        let now = Instant::now();
        let (idx, _) = ring.next_available(now).unwrap();
        ring.block_forever(idx);
        assert_eq!(ring.next_available(now).unwrap().1, "b");
        assert_eq!(ring.next_available(now).unwrap().1, "b");
    }

    #[test]
    fn ring_skips_cooling_keys_until_deadline() {
        let mut ring = KeyRing::new(vec!["a".into(), "b".into()]);
        let now = Instant::now();
        let (idx, key) = ring.next_available(now).unwrap();
        assert_eq!(key, "a");
        ring.cool_down(idx, now);

        // While cooling, only b is served.
        assert_eq!(ring.next_available(now).unwrap().1, "b");
        assert_eq!(ring.next_available(now).unwrap().1, "b");

        // After the cooldown window, a is back in rotation.
        let later = now + OVERLOAD_COOLDOWN + Duration::from_secs(1);
        assert_eq!(ring.next_available(later).unwrap().1, "a");
    }

    #[test]
    fn ring_reports_exhaustion() {
        let mut ring = KeyRing::new(vec!["a".into()]);
        let now = Instant::now();
        let (idx, _) = ring.next_available(now).unwrap();
        ring.block_forever(idx);
        assert!(ring.next_available(now).is_none());
    }
}
