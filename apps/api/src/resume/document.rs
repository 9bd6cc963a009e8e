//! Document format dispatch. The set of readable formats is closed; each
//! variant owns its text extraction routine.

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::path::Path;

use docx_rs::{DocumentChild, Paragraph, ParagraphChild, RunChild};
use tracing::debug;

use crate::errors::ResumeError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentFormat {
    Pdf,
    Docx,
}

impl DocumentFormat {
    /// Picks a format from the file extension, case-insensitively.
    pub fn from_path(path: &Path) -> Result<Self, ResumeError> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_lowercase)
            .unwrap_or_default();

        match ext.as_str() {
            "pdf" => Ok(DocumentFormat::Pdf),
            "docx" => Ok(DocumentFormat::Docx),
            "" => Err(ResumeError::UnsupportedFormat("(no extension)".to_string())),
            other => Err(ResumeError::UnsupportedFormat(format!(".{other}"))),
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            DocumentFormat::Pdf => "PDF",
            DocumentFormat::Docx => "DOCX",
        }
    }

    pub fn extract_text(self, path: &Path) -> Result<String, ResumeError> {
        let text = match self {
            DocumentFormat::Pdf => extract_pdf(path),
            DocumentFormat::Docx => extract_docx(path),
        }
        .map_err(|message| ResumeError::Extraction {
            format: self.label(),
            message,
        })?;

        debug!(format = self.label(), chars = text.len(), "Extracted document text");
        Ok(text)
    }
}

fn extract_pdf(path: &Path) -> Result<String, String> {
    // The PDF reader panics on some malformed inputs instead of erroring.
    match catch_unwind(AssertUnwindSafe(|| pdf_extract::extract_text(path))) {
        Ok(result) => result.map_err(|e| e.to_string()),
        Err(_) => Err("PDF reader aborted on malformed input".to_string()),
    }
}

/// Top-level paragraphs joined by newlines. Table contents are not included.
fn extract_docx(path: &Path) -> Result<String, String> {
    let bytes = std::fs::read(path).map_err(|e| e.to_string())?;
    let docx = docx_rs::read_docx(&bytes).map_err(|e| e.to_string())?;

    let paragraphs: Vec<String> = docx
        .document
        .children
        .iter()
        .filter_map(|child| match child {
            DocumentChild::Paragraph(p) => Some(paragraph_text(p)),
            _ => None,
        })
        .collect();

    Ok(paragraphs.join("\n"))
}

fn paragraph_text(paragraph: &Paragraph) -> String {
    let mut text = String::new();
    for child in &paragraph.children {
        if let ParagraphChild::Run(run) = child {
            for piece in &run.children {
                match piece {
                    RunChild::Text(t) => text.push_str(&t.text),
                    RunChild::Tab(_) => text.push('\t'),
                    RunChild::Break(_) => text.push('\n'),
                    _ => {}
                }
            }
        }
    }
    text
}
