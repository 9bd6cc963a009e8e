// Resume extraction: document text (PDF / DOCX) → regexes + entity recognition → ResumeFacts.
// Recognition goes through the EntityRecognizer trait; the extractor never
// assumes a particular backend.

pub mod document;
pub mod entities;
pub mod extractor;
#[cfg(feature = "spacy")]
pub mod spacy;

use std::sync::Arc;

#[cfg(not(feature = "spacy"))]
use tracing::info;
#[cfg(feature = "spacy")]
use tracing::warn;

use crate::resume::entities::{EntityRecognizer, HeuristicRecognizer};

pub use extractor::{title_case, ResumeExtractor, ResumeFacts};

/// spaCy when the `spacy` feature is on and `model_name` loads, heuristics otherwise.
#[cfg(feature = "spacy")]
pub fn build_recognizer(model_name: &str) -> Arc<dyn EntityRecognizer> {
    let recognizer = spacy::SpacyRecognizer::new(model_name);
    match recognizer.warm_up() {
        Ok(()) => Arc::new(recognizer),
        Err(e) => {
            warn!("{e}; using heuristic entity recognition");
            Arc::new(HeuristicRecognizer)
        }
    }
}

#[cfg(not(feature = "spacy"))]
pub fn build_recognizer(model_name: &str) -> Arc<dyn EntityRecognizer> {
    info!(
        model = model_name,
        "Built without the `spacy` feature; using heuristic entity recognition"
    );
    Arc::new(HeuristicRecognizer)
}
