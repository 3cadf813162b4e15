use axum::extract::{Multipart, State};
use axum::Json;
use bytes::Bytes;
use serde::Serialize;

use crate::career::ats::{build_ats_prompt, extract_pdf_text, AtsReport};
use crate::errors::AppError;
use crate::llm_client::LlmError;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct AtsScoreResponse {
    pub report: AtsReport,
}

/// POST /api/career/ats-score
///
/// Multipart form: either a `resume` PDF file or a `resume_text` field, plus
/// an optional `job_description`. The résumé is analyzed in-request and
/// discarded; nothing is persisted.
pub async fn handle_ats_score(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<AtsScoreResponse>, AppError> {
    let mut resume_text: Option<String> = None;
    let mut job_description: Option<String> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("invalid multipart body: {e}")))?
    {
        let name = field.name().map(str::to_string);
        match name.as_deref() {
            Some("resume") => {
                let data: Bytes = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::Validation(format!("failed to read upload: {e}")))?;
                resume_text = Some(extract_pdf_text(&data)?);
            }
            Some("resume_text") => {
                resume_text = Some(field.text().await.map_err(|e| {
                    AppError::Validation(format!("failed to read resume_text: {e}"))
                })?);
            }
            Some("job_description") => {
                job_description = Some(field.text().await.map_err(|e| {
                    AppError::Validation(format!("failed to read job_description: {e}"))
                })?);
            }
            _ => {}
        }
    }

    let resume_text = resume_text
        .filter(|t| !t.trim().is_empty())
        .ok_or_else(|| AppError::Validation("resume or resume_text is required".to_string()))?;

    let prompt = build_ats_prompt(&resume_text, job_description.as_deref());

    let report: AtsReport = state.llm.generate_json(&prompt).await.map_err(|e| match e {
        LlmError::KeysExhausted | LlmError::Overloaded { .. } => AppError::LlmUnavailable,
        other => AppError::Llm(other.to_string()),
    })?;

    Ok(Json(AtsScoreResponse {
        report: report.clamped(),
    }))
}
