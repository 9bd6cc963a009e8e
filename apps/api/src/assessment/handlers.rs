use std::io::Write;
use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use axum::{
    extract::{Multipart, Query, State},
    response::{IntoResponse, Response},
    Json,
};
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;
use tracing::{debug, info};

use crate::assessment::report::{assemble, TRAIT_GLOSSARY};
use crate::classifier::PredictionRequest;
use crate::errors::AppError;
use crate::resume::document::DocumentFormat;
use crate::resume::ResumeFacts;
use crate::state::AppState;

/// Multipart part carrying the resume file.
const RESUME_FIELD: &str = "resume";

#[derive(Deserialize)]
pub struct ReportQuery {
    /// `text` returns the rendered result sheet instead of JSON.
    pub format: Option<String>,
}

#[derive(Serialize)]
pub struct PersonalityResponse {
    pub personality: String,
}

#[derive(Serialize)]
pub struct TraitDescription {
    pub name: &'static str,
    pub description: &'static str,
}

struct Upload {
    file_name: String,
    data: Bytes,
}

#[derive(Default)]
struct ApplicantForm {
    applicant_name: String,
    request: PredictionRequest,
    resume: Option<Upload>,
}

/// POST /api/v1/predict
/// Multipart form with the seven model inputs, the applicant name and an
/// optional `resume` file. Always answers 200 with whatever each pipeline produced.
pub async fn handle_predict(
    State(state): State<AppState>,
    Query(params): Query<ReportQuery>,
    multipart: Multipart,
) -> Result<Response, AppError> {
    let form = read_form(multipart).await?;
    let spooled = form.resume.as_ref().map(spool_upload).transpose()?;

    let model = Arc::clone(&state.model);
    let extractor = state.extractor.clone();
    let report = tokio::task::spawn_blocking(move || {
        let path = spooled.as_ref().map(NamedTempFile::path);
        assemble(
            &model,
            &extractor,
            &form.request,
            &form.applicant_name,
            path,
        )
    })
    .await
    .context("prediction task failed")?;

    info!(
        personality = %report.personality,
        resume_parsed = report.resume.is_some(),
        "Prediction served"
    );

    if params.format.as_deref() == Some("text") {
        Ok(report.render_text().into_response())
    } else {
        Ok(Json(report).into_response())
    }
}

/// POST /api/v1/resume/parse
/// Extraction only. Unlike the predict route, failures surface as HTTP errors.
pub async fn handle_parse_resume(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Json<ResumeFacts>, AppError> {
    let form = read_form(multipart).await?;
    let upload = form
        .resume
        .ok_or_else(|| AppError::Validation(format!("missing '{RESUME_FIELD}' file part")))?;

    // Reject before touching the disk.
    DocumentFormat::from_path(Path::new(&upload.file_name))?;
    let file = spool_upload(&upload)?;

    let extractor = state.extractor.clone();
    let facts = tokio::task::spawn_blocking(move || extractor.parse(file.path()))
        .await
        .context("resume parsing task failed")??;

    info!(
        backend = state.extractor.backend(),
        skills = facts.skills.len(),
        companies = facts.companies.len(),
        "Resume parsed"
    );
    Ok(Json(facts))
}

/// POST /api/v1/personality
/// JSON variant of the classifier. Bad input yields "Unknown", never an error.
pub async fn handle_personality(
    State(state): State<AppState>,
    Json(req): Json<PredictionRequest>,
) -> Json<PersonalityResponse> {
    let personality = state.model.predict_or_unknown(&req.features());
    Json(PersonalityResponse { personality })
}

/// GET /api/v1/traits
pub async fn handle_traits() -> Json<Vec<TraitDescription>> {
    Json(
        TRAIT_GLOSSARY
            .iter()
            .map(|&(name, description)| TraitDescription { name, description })
            .collect(),
    )
}

async fn read_form(mut multipart: Multipart) -> Result<ApplicantForm, AppError> {
    let mut form = ApplicantForm::default();

    while let Some(field) = multipart.next_field().await? {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            RESUME_FIELD => {
                let file_name = field.file_name().unwrap_or_default().to_string();
                let data = field.bytes().await?;
                // Browsers send an empty part when no file was chosen.
                if file_name.is_empty() && data.is_empty() {
                    continue;
                }
                form.resume = Some(Upload { file_name, data });
            }
            "applicant_name" => form.applicant_name = field.text().await?,
            other => {
                let value = field.text().await?;
                if !form.request.set_field(other, value) {
                    debug!(field = other, "Ignoring unknown form field");
                }
            }
        }
    }

    Ok(form)
}

/// Writes the upload to a temp file that keeps the client's extension, so
/// format dispatch sees the same name the user picked.
fn spool_upload(upload: &Upload) -> Result<NamedTempFile, AppError> {
    let suffix = Path::new(&upload.file_name)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| format!(".{e}"))
        .unwrap_or_default();

    let mut file = tempfile::Builder::new()
        .prefix("resume-")
        .suffix(&suffix)
        .tempfile()
        .context("failed to create temp file for upload")?;
    file.write_all(&upload.data)
        .context("failed to write upload to temp file")?;
    file.flush().context("failed to flush upload")?;

    debug!(file = %upload.file_name, bytes = upload.data.len(), "Spooled upload");
    Ok(file)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spool_keeps_client_extension() {
        let upload = Upload {
            file_name: "Jane CV.DOCX".to_string(),
            data: Bytes::from_static(b"payload"),
        };
        let file = spool_upload(&upload).unwrap();
        assert!(file.path().to_string_lossy().ends_with(".DOCX"));
        assert_eq!(std::fs::read(file.path()).unwrap(), b"payload");
    }

    #[test]
    fn test_spool_without_extension_is_rejected_by_format() {
        let upload = Upload {
            file_name: "resume".to_string(),
            data: Bytes::from_static(b"x"),
        };
        let file = spool_upload(&upload).unwrap();
        assert!(DocumentFormat::from_path(file.path()).is_err());
    }
}
