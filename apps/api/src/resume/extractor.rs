use std::collections::BTreeSet;
use std::path::Path;
use std::sync::{Arc, LazyLock};

use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::errors::ResumeError;
use crate::resume::document::DocumentFormat;
use crate::resume::entities::{Entity, EntityLabel, EntityRecognizer, HeuristicRecognizer};

/// Placeholder for scalar fields the extractor could not find.
pub const NOT_FOUND: &str = "Not found";

/// A PERSON entity only counts as the candidate's name if it starts this close
/// to the top of the document.
pub const NAME_WINDOW_CHARS: usize = 300;

pub const SKILL_KEYWORDS: &[&str] = &[
    "python",
    "java",
    "sql",
    "c++",
    "machine learning",
    "excel",
    "communication",
    "leadership",
    "management",
    "teamwork",
];

pub const DEGREE_KEYWORDS: &[&str] = &[
    "bachelor", "master", "phd", "b.sc", "m.sc", "b.tech", "m.tech", "mba", "associate",
];

pub const DESIGNATION_KEYWORDS: &[&str] = &[
    "engineer",
    "developer",
    "manager",
    "analyst",
    "consultant",
    "intern",
    "director",
    "officer",
    "specialist",
];

static EMAIL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Z|a-z]{2,}\b").expect("email regex")
});

static PHONE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(\+?\d{1,3}[-.\s]?)?(\(?\d{3}\)?[-.\s]?)?\d{3}[-.\s]?\d{4}").expect("phone regex")
});

/// Structured facts mined from one resume. Field order is the display order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResumeFacts {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub skills: Vec<String>,
    pub degrees: Vec<String>,
    pub designations: Vec<String>,
    /// Deduplicated and sorted.
    pub companies: Vec<String>,
}

/// Heuristic resume parser: document text → regexes + entity recognition.
///
/// Cheap to clone; the recognizer is shared.
#[derive(Clone)]
pub struct ResumeExtractor {
    recognizer: Arc<dyn EntityRecognizer>,
}

impl Default for ResumeExtractor {
    fn default() -> Self {
        Self::new(Arc::new(HeuristicRecognizer))
    }
}

impl ResumeExtractor {
    pub fn new(recognizer: Arc<dyn EntityRecognizer>) -> Self {
        Self { recognizer }
    }

    pub fn backend(&self) -> &'static str {
        self.recognizer.backend()
    }

    /// Reads the document at `path` and extracts its facts.
    pub fn parse(&self, path: &Path) -> Result<ResumeFacts, ResumeError> {
        let format = DocumentFormat::from_path(path)?;
        let text = format.extract_text(path)?;
        Ok(self.extract(&text))
    }

    /// Extracts facts from already-decoded text.
    pub fn extract(&self, text: &str) -> ResumeFacts {
        // Keywords match against case-folded text; regexes and entities need
        // the source casing.
        let text_lower = text.to_lowercase();
        let entities = self.recognizer.recognize(text);

        let facts = ResumeFacts {
            name: extract_name(text, &entities),
            email: extract_email(text),
            phone: extract_phone(text),
            skills: match_keywords(&text_lower, SKILL_KEYWORDS, title_case),
            degrees: match_keywords(&text_lower, DEGREE_KEYWORDS, str::to_uppercase),
            designations: match_keywords(&text_lower, DESIGNATION_KEYWORDS, title_case),
            companies: entities
                .iter()
                .filter(|e| e.label == EntityLabel::Org)
                .map(|e| e.text.clone())
                .collect::<BTreeSet<_>>()
                .into_iter()
                .collect(),
        };

        debug!(
            backend = self.backend(),
            entities = entities.len(),
            skills = facts.skills.len(),
            companies = facts.companies.len(),
            "Extracted resume facts"
        );
        facts
    }
}

fn extract_email(text: &str) -> String {
    EMAIL_RE
        .find(text)
        .map(|m| m.as_str().to_string())
        .unwrap_or_else(|| NOT_FOUND.to_string())
}

/// Concatenates the optional country-code and area-code groups of the first
/// match. The trailing seven digits are not captured and so never appear.
fn extract_phone(text: &str) -> String {
    PHONE_RE
        .captures(text)
        .map(|caps| {
            let group = |i| caps.get(i).map_or("", |m| m.as_str());
            format!("{}{}", group(1), group(2))
        })
        .unwrap_or_else(|| NOT_FOUND.to_string())
}

/// First PERSON entity near the top, else the first line of the trimmed text.
fn extract_name(text: &str, entities: &[Entity]) -> String {
    let near_top = entities.iter().find(|e| {
        e.label == EntityLabel::Person
            && text
                .get(..e.start)
                .is_some_and(|prefix| prefix.chars().count() < NAME_WINDOW_CHARS)
    });
    if let Some(person) = near_top {
        return person.text.clone();
    }

    let first_line = text.trim().split('\n').next().unwrap_or_default().trim();
    if first_line.is_empty() {
        NOT_FOUND.to_string()
    } else {
        first_line.to_string()
    }
}

/// Naive substring matching in vocabulary order.
fn match_keywords(text_lower: &str, vocabulary: &[&str], render: fn(&str) -> String) -> Vec<String> {
    vocabulary
        .iter()
        .filter(|keyword| text_lower.contains(*keyword))
        .map(|keyword| render(keyword))
        .collect()
}

/// Upper-cases every letter that follows a non-letter and lower-cases the
/// rest, so `machine learning` → `Machine Learning` and `c++` → `C++`.
pub fn title_case(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut previous_cased = false;
    for c in s.chars() {
        if previous_cased {
            out.extend(c.to_lowercase());
        } else {
            out.extend(c.to_uppercase());
        }
        previous_cased = c.is_lowercase() || c.is_uppercase();
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    /// Returns a fixed set of entities regardless of input.
    struct FixedRecognizer(Vec<Entity>);

    impl EntityRecognizer for FixedRecognizer {
        fn recognize(&self, _text: &str) -> Vec<Entity> {
            self.0.clone()
        }

        fn backend(&self) -> &'static str {
            "fixed"
        }
    }

    fn person(text: &str, start: usize) -> Entity {
        Entity {
            text: text.to_string(),
            label: EntityLabel::Person,
            start,
        }
    }

    fn org(text: &str) -> Entity {
        Entity {
            text: text.to_string(),
            label: EntityLabel::Org,
            start: 0,
        }
    }

    const SAMPLE_RESUME: &str = "\
Jane Doe
Contact: jane.doe@example.com | +1 (555) 123-4567
Senior Software Engineer at Acme Corp
Previously Data Analyst at Globex Corporation and intern at Acme Corp
Skills: Python, SQL, Teamwork, Machine Learning
Education: B.Tech in CS, MBA
";

    #[test]
    fn test_extracts_email() {
        let facts = ResumeExtractor::default().extract("Contact: jane.doe@example.com");
        assert_eq!(facts.email, "jane.doe@example.com");
    }

    #[test]
    fn test_missing_email_and_phone_are_not_found() {
        let facts = ResumeExtractor::default().extract("no contact details here");
        assert_eq!(facts.email, NOT_FOUND);
        assert_eq!(facts.phone, NOT_FOUND);
    }

    #[test]
    fn test_phone_concatenates_capture_groups() {
        let facts = ResumeExtractor::default().extract("Call +1 (555) 123-4567 today");
        assert_eq!(facts.phone, "+1 (555) ");
    }

    #[test]
    fn test_phone_without_prefix_groups_is_empty() {
        // Leftmost match is "1234567": neither optional group participates.
        assert_eq!(extract_phone("ext 1234567"), "");
    }

    #[test]
    fn test_skills_are_title_cased() {
        let facts = ResumeExtractor::default().extract("Skills: Python, SQL, Teamwork");
        for skill in ["Python", "Sql", "Teamwork"] {
            assert!(facts.skills.contains(&skill.to_string()), "{skill} missing");
        }
    }

    #[test]
    fn test_skill_substring_matching_is_naive() {
        let facts = ResumeExtractor::default().extract("Fluent in JavaScript");
        assert_eq!(facts.skills, vec!["Java"]);
    }

    #[test]
    fn test_degrees_are_upper_cased_case_insensitively() {
        let facts = ResumeExtractor::default().extract("B.Tech in CS");
        assert!(facts.degrees.contains(&"B.TECH".to_string()));
    }

    #[test]
    fn test_designations_follow_vocabulary_order() {
        let facts = ResumeExtractor::default().extract("Intern, later Engineer and Manager");
        assert_eq!(facts.designations, vec!["Engineer", "Manager", "Intern"]);
    }

    #[test]
    fn test_name_from_person_entity_near_top() {
        let extractor = ResumeExtractor::new(Arc::new(FixedRecognizer(vec![person("Jane Doe", 12)])));
        let facts = extractor.extract("CURRICULUM\n\nJane Doe\n");
        assert_eq!(facts.name, "Jane Doe");
    }

    #[test]
    fn test_person_beyond_window_falls_back_to_first_line() {
        let mut text = String::from("  \n  RESUME OF CANDIDATE  \n");
        text.push_str(&"x".repeat(400));
        let start = text.len();
        text.push_str(" Jane Doe");
        let extractor = ResumeExtractor::new(Arc::new(FixedRecognizer(vec![person("Jane Doe", start + 1)])));

        assert_eq!(extractor.extract(&text).name, "RESUME OF CANDIDATE");
    }

    /// `prefix` followed by "Jane Doe", with a recognizer reporting the
    /// person right after the prefix.
    fn name_after(prefix: &str) -> String {
        let text = format!("{prefix}Jane Doe");
        let extractor = ResumeExtractor::new(Arc::new(FixedRecognizer(vec![person(
            "Jane Doe",
            prefix.len(),
        )])));
        extractor.extract(&text).name
    }

    #[test]
    fn test_person_starting_at_char_299_is_accepted() {
        let prefix = format!("HEADER\n{}", "x".repeat(292));
        assert_eq!(prefix.chars().count(), 299);
        assert_eq!(name_after(&prefix), "Jane Doe");
    }

    #[test]
    fn test_person_starting_at_char_300_is_rejected() {
        let prefix = format!("HEADER\n{}", "x".repeat(293));
        assert_eq!(prefix.chars().count(), 300);
        assert_eq!(name_after(&prefix), "HEADER");
    }

    #[test]
    fn test_window_counts_chars_not_bytes() {
        let prefix = format!("Zoë\n{}", "é".repeat(295));
        assert_eq!(prefix.chars().count(), 299);
        assert!(prefix.len() > NAME_WINDOW_CHARS);
        assert_eq!(name_after(&prefix), "Jane Doe");

        let prefix = format!("Zoë\n{}", "é".repeat(296));
        assert_eq!(name_after(&prefix), "Zoë");
    }

    #[test]
    fn test_all_caps_name_survives_product_names() {
        let facts = ResumeExtractor::default()
            .extract("JANE DOE\nSoftware Engineer, Google Cloud Platform\n");
        assert_eq!(facts.name, "JANE DOE");
        assert_eq!(facts.companies, vec!["Google Cloud Platform"]);
    }

    #[test]
    fn test_no_person_falls_back_to_first_non_empty_line() {
        let text = "\n\n   PROFILE OVERVIEW   \nexperienced data analyst with python and sql\n";
        let facts = ResumeExtractor::default().extract(text);
        assert_eq!(facts.name, "PROFILE OVERVIEW");
    }

    #[test]
    fn test_empty_text_name_is_not_found() {
        let facts = ResumeExtractor::new(Arc::new(FixedRecognizer(vec![]))).extract("   ");
        assert_eq!(facts.name, NOT_FOUND);
        assert!(facts.skills.is_empty());
        assert!(facts.companies.is_empty());
    }

    #[test]
    fn test_companies_are_deduplicated_org_entities() {
        let extractor = ResumeExtractor::new(Arc::new(FixedRecognizer(vec![
            org("Globex"),
            person("Jane Doe", 0),
            org("Acme Corp"),
            org("Globex"),
        ])));
        let facts = extractor.extract("Jane Doe");
        assert_eq!(facts.companies, vec!["Acme Corp", "Globex"]);
    }

    #[test]
    fn test_full_sample_resume() {
        let facts = ResumeExtractor::default().extract(SAMPLE_RESUME);
        assert_eq!(facts.name, "Jane Doe");
        assert_eq!(facts.email, "jane.doe@example.com");
        assert_eq!(facts.skills, vec!["Python", "Sql", "Machine Learning", "Teamwork"]);
        assert_eq!(facts.degrees, vec!["B.TECH", "MBA"]);
        assert_eq!(facts.designations, vec!["Engineer", "Analyst", "Intern"]);
        assert_eq!(facts.companies, vec!["Acme Corp", "Globex Corporation"]);
    }

    #[test]
    fn test_parse_rejects_unsupported_extension() {
        let err = ResumeExtractor::default()
            .parse(Path::new("resume.txt"))
            .unwrap_err();
        assert!(matches!(err, ResumeError::UnsupportedFormat(_)));
    }

    #[test]
    fn test_parse_is_idempotent() {
        use docx_rs::{Docx, Paragraph, Run};

        let mut file = tempfile::Builder::new().suffix(".docx").tempfile().unwrap();
        let mut docx = Docx::new();
        for line in SAMPLE_RESUME.lines() {
            docx = docx.add_paragraph(Paragraph::new().add_run(Run::new().add_text(line)));
        }
        docx.build().pack(file.as_file_mut()).unwrap();
        file.flush().unwrap();

        let extractor = ResumeExtractor::default();
        let first = extractor.parse(file.path()).unwrap();
        let second = extractor.parse(file.path()).unwrap();
        assert_eq!(first, second);
        assert_eq!(first.email, "jane.doe@example.com");
    }

    #[test]
    fn test_title_case() {
        assert_eq!(title_case("machine learning"), "Machine Learning");
        assert_eq!(title_case("c++"), "C++");
        assert_eq!(title_case("sql"), "Sql");
        assert_eq!(title_case("o'neil"), "O'Neil");
        assert_eq!(title_case("JANE doe"), "Jane Doe");
    }
}
