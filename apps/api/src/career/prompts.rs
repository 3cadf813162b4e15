//! Prompt templates for the ATS résumé analyzer.

pub const ATS_ANALYZE_PROMPT: &str = r#"You are an expert ATS (Applicant Tracking System) and technical recruiter.
Analyze the résumé below{jd_clause} and score how well it would survive automated screening.

Return a JSON object with exactly these fields:
{
  "ats_score": <integer 0-100>,
  "strengths": [<up to 5 short strings>],
  "weaknesses": [<up to 5 short strings>],
  "keyword_suggestions": [<up to 10 missing or weak keywords>],
  "verdict": <one-sentence overall assessment>
}

{json_only}

RESUME:
{resume_text}
{jd_section}"#;

pub const JD_CLAUSE: &str = " against the job description that follows it";

pub const JD_SECTION_HEADER: &str = "\nJOB DESCRIPTION:\n";
