//! spaCy-backed entity recognition through an embedded Python interpreter.
//!
//! The pipeline is loaded lazily on first use and shared by every clone.
//! Needs `spacy` and the configured model in the interpreter's environment:
//! ```bash
//! pip install spacy && python -m spacy download en_core_web_sm
//! ```
//! `PYTHON_HOME` points the interpreter at a virtualenv's site-packages.

use std::sync::{Arc, Mutex};

use pyo3::prelude::*;
use tracing::{info, warn};

use crate::resume::entities::{Entity, EntityLabel, EntityRecognizer, HeuristicRecognizer};

macro_rules! py_err {
    ($operation:expr, $e:expr) => {
        format!("Failed to {}: {}", $operation, $e)
    };
}

/// One entity as spaCy reports it. `start_char` counts characters, not bytes.
struct RawEntity {
    text: String,
    label: String,
    start_char: usize,
}

#[derive(Clone)]
pub struct SpacyRecognizer {
    model_name: String,
    nlp: Arc<Mutex<Option<Py<PyAny>>>>,
}

impl SpacyRecognizer {
    pub fn new(model_name: impl Into<String>) -> Self {
        Self {
            model_name: model_name.into(),
            nlp: Arc::new(Mutex::new(None)),
        }
    }

    /// Loads the pipeline now so a missing model shows up at startup.
    pub fn warm_up(&self) -> Result<(), String> {
        self.get_or_load_nlp().map(|_| ())
    }

    fn run(&self, text: &str) -> Result<Vec<RawEntity>, String> {
        let nlp = self.get_or_load_nlp()?;

        Python::with_gil(|py| {
            let doc = nlp
                .bind(py)
                .call1((text,))
                .map_err(|e| py_err!("process text", e))?;
            let ents = doc.getattr("ents").map_err(|e| py_err!("get ents", e))?;

            let mut out = Vec::new();
            for ent in ents.iter().map_err(|e| py_err!("iterate ents", e))? {
                let ent = ent.map_err(|e| py_err!("read entity", e))?;
                out.push(RawEntity {
                    text: ent
                        .getattr("text")
                        .and_then(|v| v.extract::<String>())
                        .map_err(|e| py_err!("extract entity text", e))?,
                    label: ent
                        .getattr("label_")
                        .and_then(|v| v.extract::<String>())
                        .map_err(|e| py_err!("extract entity label", e))?,
                    start_char: ent
                        .getattr("start_char")
                        .and_then(|v| v.extract::<usize>())
                        .map_err(|e| py_err!("extract entity offset", e))?,
                });
            }
            Ok(out)
        })
    }

    fn get_or_load_nlp(&self) -> Result<Py<PyAny>, String> {
        let mut guard = self
            .nlp
            .lock()
            .map_err(|_| "spaCy pipeline lock poisoned".to_string())?;

        if let Some(ref nlp) = *guard {
            return Python::with_gil(|py| Ok(nlp.clone_ref(py)));
        }

        Python::with_gil(|py| {
            if let Ok(python_home) = std::env::var("PYTHON_HOME") {
                configure_python_path(py, &python_home)?;
            }

            let spacy = py.import_bound("spacy").map_err(|e| {
                format!("Failed to import spacy: {e}. Install it with: pip install spacy")
            })?;
            let nlp = spacy
                .call_method1("load", (&self.model_name,))
                .map_err(|e| {
                    format!(
                        "Failed to load spaCy model '{}': {e}. Download it with: python -m spacy download {}",
                        self.model_name, self.model_name
                    )
                })?;

            info!(model = %self.model_name, "spaCy pipeline loaded");
            let nlp: Py<PyAny> = nlp.unbind();
            *guard = Some(nlp.clone_ref(py));
            Ok(nlp)
        })
    }
}

impl EntityRecognizer for SpacyRecognizer {
    /// Falls back to the heuristic recognizer when the interpreter fails, so
    /// extraction keeps working without a model.
    fn recognize(&self, text: &str) -> Vec<Entity> {
        match self.run(text) {
            Ok(raw) => to_entities(text, raw),
            Err(e) => {
                warn!("spaCy recognition failed, using heuristics: {e}");
                HeuristicRecognizer.recognize(text)
            }
        }
    }

    fn backend(&self) -> &'static str {
        "spacy"
    }
}

/// Keeps PERSON and ORG and converts character offsets to byte offsets.
fn to_entities(text: &str, raw: Vec<RawEntity>) -> Vec<Entity> {
    raw.into_iter()
        .filter_map(|ent| {
            let label = match ent.label.as_str() {
                "PERSON" => EntityLabel::Person,
                "ORG" => EntityLabel::Org,
                _ => return None,
            };
            let start = text
                .char_indices()
                .nth(ent.start_char)
                .map_or(text.len(), |(byte, _)| byte);
            Some(Entity {
                text: ent.text,
                label,
                start,
            })
        })
        .collect()
}

/// Prepends `<home>/lib/pythonX.Y/site-packages` to `sys.path`.
fn configure_python_path(py: Python<'_>, python_home: &str) -> Result<(), String> {
    let sys = py.import_bound("sys").map_err(|e| py_err!("import sys", e))?;
    let version = sys
        .getattr("version_info")
        .map_err(|e| py_err!("get version_info", e))?;
    let major: i32 = version
        .getattr("major")
        .and_then(|v| v.extract())
        .map_err(|e| py_err!("get major version", e))?;
    let minor: i32 = version
        .getattr("minor")
        .and_then(|v| v.extract())
        .map_err(|e| py_err!("get minor version", e))?;

    let site_packages = format!("{python_home}/lib/python{major}.{minor}/site-packages");
    sys.getattr("path")
        .and_then(|path| path.call_method1("insert", (0, site_packages)))
        .map_err(|e| py_err!("insert into sys.path", e))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(text: &str, label: &str, start_char: usize) -> RawEntity {
        RawEntity {
            text: text.to_string(),
            label: label.to_string(),
            start_char,
        }
    }

    #[test]
    fn test_only_person_and_org_are_kept() {
        let text = "Jane Doe joined Acme Corp in Paris";
        let entities = to_entities(
            text,
            vec![
                raw("Jane Doe", "PERSON", 0),
                raw("Acme Corp", "ORG", 16),
                raw("Paris", "GPE", 29),
            ],
        );
        assert_eq!(entities.len(), 2);
        assert_eq!(entities[0].label, EntityLabel::Person);
        assert_eq!(entities[1].label, EntityLabel::Org);
        assert_eq!(entities[1].start, 16);
    }

    #[test]
    fn test_char_offsets_become_byte_offsets() {
        let text = "Zoë Ávila, José Núñez";
        let entities = to_entities(text, vec![raw("José Núñez", "PERSON", 11)]);
        assert_eq!(entities[0].start, text.find("José").unwrap());
    }

    #[test]
    fn test_backend_name_and_lazy_load() {
        let recognizer = SpacyRecognizer::new("en_core_web_sm");
        assert_eq!(recognizer.backend(), "spacy");
        assert!(recognizer.nlp.lock().unwrap().is_none());
    }
}
