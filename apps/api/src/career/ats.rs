//! ATS analysis core: PDF text extraction, prompt assembly, and the report
//! shape returned by Gemini.

use std::io::Write;

use serde::{Deserialize, Serialize};

use crate::career::prompts::{ATS_ANALYZE_PROMPT, JD_CLAUSE, JD_SECTION_HEADER};
use crate::errors::AppError;
use crate::llm_client::prompts::JSON_ONLY_INSTRUCTION;

/// Résumés longer than this are truncated before prompting; anything past
/// ~15k characters is boilerplate that only burns tokens.
pub const MAX_RESUME_CHARS: usize = 15_000;
pub const MAX_JD_CHARS: usize = 8_000;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AtsReport {
    pub ats_score: u32,
    pub strengths: Vec<String>,
    pub weaknesses: Vec<String>,
    pub keyword_suggestions: Vec<String>,
    pub verdict: String,
}

impl AtsReport {
    /// Models occasionally return scores like 105; clamp rather than reject.
    pub fn clamped(mut self) -> Self {
        self.ats_score = self.ats_score.min(100);
        self
    }
}

/// Extracts plain text from an uploaded PDF. The extractor works on files,
/// so the upload passes through a tempfile that drops afterwards.
pub fn extract_pdf_text(data: &[u8]) -> Result<String, AppError> {
    let mut file = tempfile::NamedTempFile::new()
        .map_err(|e| AppError::Internal(anyhow::anyhow!("tempfile failed: {e}")))?;
    file.write_all(data)
        .map_err(|e| AppError::Internal(anyhow::anyhow!("tempfile write failed: {e}")))?;

    let text = pdf_extract::extract_text(file.path())
        .map_err(|e| AppError::Validation(format!("could not extract text from PDF: {e}")))?;

    if text.trim().is_empty() {
        return Err(AppError::Validation(
            "PDF contains no extractable text".to_string(),
        ));
    }
    Ok(text)
}

pub fn build_ats_prompt(resume_text: &str, job_description: Option<&str>) -> String {
    let resume_text = truncate_chars(resume_text.trim(), MAX_RESUME_CHARS);

    let (jd_clause, jd_section) = match job_description.map(str::trim).filter(|jd| !jd.is_empty()) {
        Some(jd) => (
            JD_CLAUSE,
            format!("{JD_SECTION_HEADER}{}", truncate_chars(jd, MAX_JD_CHARS)),
        ),
        None => ("", String::new()),
    };

    ATS_ANALYZE_PROMPT
        .replace("{jd_clause}", jd_clause)
        .replace("{json_only}", JSON_ONLY_INSTRUCTION)
        .replace("{resume_text}", resume_text)
        .replace("{jd_section}", &jd_section)
}

fn truncate_chars(s: &str, max: usize) -> &str {
    match s.char_indices().nth(max) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}
