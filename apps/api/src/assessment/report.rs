//! Result assembly: merges the classifier and extractor outcomes for one
//! applicant. The two pipelines fail independently; a broken resume never
//! hides the prediction and vice versa.

use std::path::Path;

use serde::Serialize;
use tracing::error;

use crate::classifier::{PredictionRequest, TrainedModel};
use crate::resume::{title_case, ResumeExtractor, ResumeFacts};

/// Big Five glossary shown alongside every result.
pub const TRAIT_GLOSSARY: &[(&str, &str)] = &[
    ("Openness", "Curious, imaginative, open to new experiences."),
    ("Conscientiousness", "Organized, reliable, thorough."),
    ("Extraversion", "Outgoing, energetic, social."),
    ("Agreeableness", "Friendly, compassionate, cooperative."),
    ("Neuroticism", "Emotional instability, prone to stress."),
];

#[derive(Debug, Clone, Serialize)]
pub struct PredictionReport {
    pub applicant_name: String,
    /// Predicted label, or "Unknown".
    pub personality: String,
    /// `None` when no resume was supplied or it could not be parsed.
    pub resume: Option<ResumeFacts>,
    pub resume_error: Option<String>,
}

/// Runs both pipelines for one applicant. Blocking: document reading and
/// entity recognition happen inline.
pub fn assemble(
    model: &TrainedModel,
    extractor: &ResumeExtractor,
    request: &PredictionRequest,
    applicant_name: &str,
    resume_path: Option<&Path>,
) -> PredictionReport {
    let personality = model.predict_or_unknown(&request.features());

    let (resume, resume_error) = match resume_path {
        None => (None, Some("No resume uploaded".to_string())),
        Some(path) => match extractor.parse(path) {
            Ok(facts) => (Some(facts), None),
            Err(e) => {
                error!("Resume parsing failed: {e}");
                (None, Some(format!("Resume parsing failed: {e}")))
            }
        },
    };

    PredictionReport {
        applicant_name: applicant_name.trim().to_string(),
        personality,
        resume,
        resume_error,
    }
}

impl PredictionReport {
    /// Plain-text result sheet: header, prediction, resume details, glossary.
    pub fn render_text(&self) -> String {
        let mut lines = vec![
            "Personality Prediction Result".to_string(),
            String::new(),
            format!("Candidate Name: {}", title_case(&self.applicant_name)),
            format!("Predicted Personality: {}", title_case(&self.personality)),
            String::new(),
            "Parsed Resume Details:".to_string(),
        ];

        if let Some(facts) = &self.resume {
            let scalar = |label: &str, value: &str| format!("    {label}: {}", title_case(value));
            let list = |label: &str, values: &[String]| format!("    {label}: {}", values.join(", "));
            lines.push(scalar("Name", &facts.name));
            lines.push(scalar("Email", &facts.email));
            lines.push(scalar("Phone", &facts.phone));
            lines.push(list("Skills", &facts.skills));
            lines.push(list("Degrees", &facts.degrees));
            lines.push(list("Designations", &facts.designations));
            lines.push(list("Companies", &facts.companies));
        }
        if let Some(err) = &self.resume_error {
            lines.push(format!("    {err}"));
        }

        lines.push(String::new());
        lines.push("Personality Traits Meaning:".to_string());
        lines.push("---------------------------".to_string());
        for (name, meaning) in TRAIT_GLOSSARY {
            lines.push(format!("{name}: {meaning}"));
        }

        lines.join("\n") + "\n"
    }
}
