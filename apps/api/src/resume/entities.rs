//! Named-entity recognition: a pluggable recognizer for PERSON and
//! ORG spans in resume text.
//!
//! Builds with the `spacy` feature use `SpacyRecognizer`; everything else, and
//! any run where the model fails to load, uses `HeuristicRecognizer` (pure Rust,
//! deterministic, no model download). `ResumeExtractor` holds an
//! `Arc<dyn EntityRecognizer>`, so extraction code never sees which one.

use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum EntityLabel {
    Person,
    Org,
}

/// A recognised span. `start` is a byte offset into the input text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entity {
    pub text: String,
    pub label: EntityLabel,
    pub start: usize,
}

/// Implement this to swap recognition backends without touching the extractor.
pub trait EntityRecognizer: Send + Sync {
    /// Entities in order of appearance. Must be deterministic for identical input.
    fn recognize(&self, text: &str) -> Vec<Entity>;

    fn backend(&self) -> &'static str;
}

// ────────────────────────────────────────────────────────────────────────────
// HeuristicRecognizer
// ────────────────────────────────────────────────────────────────────────────

/// Capitalization-driven recognizer.
///
/// Algorithm:
/// 1. Tokenize into words with byte offsets.
/// 2. Group runs of capitalized words separated only by spaces or tabs on the
///    same line. Lowercase connectors (`of`, `and`, `for`, `the`) join two
///    capitalized words; `J. Smith` style initials are kept together.
/// 3. A run joined by `and` whose two sides each hold two or more words is
///    split in two (`Microsoft Azure and Amazon Web Services`).
/// 4. A run is ORG if it ends in a company suffix (`Corp`, `Ltd`, ...) or
///    contains an institution or well-known employer word (`University`,
///    `Google`, ...), or if it follows the word "at" and is not made of resume
///    stop words.
/// 5. Otherwise, after dropping leading honorifics and job titles, a run of
///    2 to 3 name-shaped words with no stop words is PERSON.
#[derive(Debug, Clone, Copy, Default)]
pub struct HeuristicRecognizer;

static WORD_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[\p{L}\p{N}][\p{L}\p{N}&'’\-]*").expect("word regex")
});

const CONNECTORS: &[&str] = &["of", "and", "for", "the"];

const HONORIFICS: &[&str] = &["mr", "mrs", "ms", "miss", "dr", "prof", "sir"];

/// Words that make a span an organization when they close it (`Acme Corp`).
const ORG_SUFFIXES: &[&str] = &[
    "inc",
    "incorporated",
    "llc",
    "llp",
    "ltd",
    "limited",
    "corp",
    "corporation",
    "company",
    "co",
    "plc",
    "gmbh",
    "group",
    "technologies",
    "solutions",
    "systems",
    "labs",
    "laboratories",
    "services",
    "consulting",
    "consultancy",
    "partners",
    "holdings",
    "industries",
    "enterprises",
    "agency",
];

/// Words that make a span an organization anywhere in it (`Bank of America`).
const ORG_HEADS: &[&str] = &[
    "university",
    "college",
    "institute",
    "school",
    "academy",
    "bank",
    "foundation",
    "hospital",
    "ministry",
    "department",
    // employers common enough on resumes to recognise by name
    "google",
    "microsoft",
    "amazon",
    "apple",
    "meta",
    "facebook",
    "netflix",
    "oracle",
    "ibm",
    "intel",
    "adobe",
    "salesforce",
    "accenture",
    "deloitte",
    "infosys",
    "wipro",
    "tcs",
];

/// Leading words dropped before a name (`Director Raj Kumar`).
const TITLE_WORDS: &[&str] = &[
    "senior", "junior", "lead", "chief", "head", "principal", "staff", "associate",
    "assistant", "executive", "engineer", "developer", "manager", "analyst", "consultant",
    "intern", "director", "officer", "specialist", "architect", "administrator", "scientist",
    "designer", "coordinator", "president", "vice", "trainee", "supervisor", "professor",
];

/// Capitalized words that head resume sections, name skills or titles, or
/// start sentences. None of them can be part of a person's name here.
const NON_NAME_WORDS: &[&str] = &[
    // document furniture
    "resume", "curriculum", "vitae", "cv", "profile", "summary", "objective", "experience",
    "education", "skills", "skill", "projects", "project", "contact", "email", "phone",
    "mobile", "address", "references", "certifications", "certification", "languages",
    "interests", "hobbies", "achievements", "awards", "work", "professional", "personal",
    "technical", "career", "history", "details", "information", "employment", "qualifications",
    "responsibilities", "key", "core", "competencies", "declaration", "page", "linkedin",
    "github", "website", "portfolio", "name", "date", "birth", "nationality",
    // titles and seniority
    "senior", "junior", "lead", "chief", "head", "principal", "staff", "associate",
    "assistant", "executive", "engineer", "developer", "manager", "analyst", "consultant",
    "intern", "director", "officer", "specialist", "architect", "administrator", "scientist",
    "designer", "coordinator", "president", "vice", "trainee", "team", "leader",
    // fields and skills
    "software", "data", "machine", "learning", "computer", "science", "engineering",
    "cloud", "platform", "web", "azure", "services", "overview",
    "technology", "business", "marketing", "finance", "sales", "operations",
    "python", "java", "javascript", "sql", "excel", "communication", "leadership",
    "management", "teamwork", "bachelor", "master", "doctor", "arts", "commerce",
    "sc", "tech", "com", "eng", "phil", "phd", "mba", "bsc", "msc", "btech", "mtech",
    // calendar
    "january", "february", "march", "april", "may", "june", "july", "august", "september",
    "october", "november", "december", "jan", "feb", "mar", "apr", "jun", "jul", "aug",
    "sep", "sept", "oct", "nov", "dec", "present", "current", "monday", "friday",
    // sentence starters and places
    "the", "an", "my", "we", "our", "this", "that", "in", "on", "at", "for",
    "with", "by", "from", "to", "dear", "new", "san", "los", "united", "states", "kingdom",
    "north", "south", "east", "west", "street", "road", "city",
];

#[derive(Debug, Clone, Copy)]
struct Token<'a> {
    text: &'a str,
    start: usize,
    end: usize,
}

impl EntityRecognizer for HeuristicRecognizer {
    fn recognize(&self, text: &str) -> Vec<Entity> {
        let tokens: Vec<Token> = WORD_RE
            .find_iter(text)
            .map(|m| Token {
                text: m.as_str(),
                start: m.start(),
                end: m.end(),
            })
            .collect();

        let joined = |a: &Token, b: &Token| is_inline_gap(&text[a.end..b.start], a.text);

        let mut entities = Vec::new();
        let mut i = 0;
        while i < tokens.len() {
            if !is_capitalized(tokens[i].text) {
                i += 1;
                continue;
            }

            let mut last = i;
            let mut j = i + 1;
            while j < tokens.len() && joined(&tokens[j - 1], &tokens[j]) {
                if is_capitalized(tokens[j].text) {
                    last = j;
                    j += 1;
                } else if is_connector(tokens[j].text)
                    && j + 1 < tokens.len()
                    && joined(&tokens[j], &tokens[j + 1])
                    && is_capitalized(tokens[j + 1].text)
                {
                    last = j + 1;
                    j += 2;
                } else {
                    break;
                }
            }

            let after_at = i > 0
                && tokens[i - 1].text.eq_ignore_ascii_case("at")
                && joined(&tokens[i - 1], &tokens[i]);

            for (n, part) in split_on_and(&tokens[i..=last]).into_iter().enumerate() {
                if let Some(entity) = classify(text, part, after_at && n == 0) {
                    entities.push(entity);
                }
            }
            i = last + 1;
        }
        entities
    }

    fn backend(&self) -> &'static str {
        "heuristic"
    }
}

fn classify(text: &str, span: &[Token], after_at: bool) -> Option<Entity> {
    let lowered: Vec<String> = span.iter().map(|t| t.text.to_lowercase()).collect();
    let all_stop_words = lowered
        .iter()
        .all(|w| NON_NAME_WORDS.contains(&w.as_str()) || CONNECTORS.contains(&w.as_str()));

    let has_org_keyword = lowered.len() >= 2
        && (lowered
            .last()
            .is_some_and(|w| ORG_SUFFIXES.contains(&w.as_str()))
            || lowered.iter().any(|w| ORG_HEADS.contains(&w.as_str())));
    if has_org_keyword || (after_at && !all_stop_words) {
        return Some(entity(text, span, EntityLabel::Org));
    }

    let prefix = lowered
        .iter()
        .take_while(|w| HONORIFICS.contains(&w.as_str()) || TITLE_WORDS.contains(&w.as_str()))
        .count();
    let name = &span[prefix..];
    let is_person = (2..=3).contains(&name.len())
        && name.iter().all(|t| {
            is_name_shaped(t.text) && !NON_NAME_WORDS.contains(&t.text.to_lowercase().as_str())
        });

    is_person.then(|| entity(text, name, EntityLabel::Person))
}

/// Splits at a lowercase `and` when both sides have at least two words, so two
/// adjacent names are not read as one. `Procter and Gamble` stays whole.
fn split_on_and<'s, 'a>(span: &'s [Token<'a>]) -> Vec<&'s [Token<'a>]> {
    let split_at = (2..span.len().saturating_sub(2))
        .find(|&k| span[k].text == "and");
    match split_at {
        Some(k) => {
            let mut parts = split_on_and(&span[..k]);
            parts.extend(split_on_and(&span[k + 1..]));
            parts
        }
        None => vec![span],
    }
}

fn entity(text: &str, span: &[Token], label: EntityLabel) -> Entity {
    let start = span[0].start;
    let end = span[span.len() - 1].end;
    Entity {
        text: text[start..end].to_string(),
        label,
        start,
    }
}

/// Spaces or tabs only, `" & "`, or `". "` directly after a single-letter initial.
fn is_inline_gap(gap: &str, previous: &str) -> bool {
    let blank = |s: &str| !s.is_empty() && s.chars().all(|c| c == ' ' || c == '\t');
    if blank(gap) {
        return true;
    }
    if gap.trim_matches(|c| c == ' ' || c == '\t') == "&" {
        return true;
    }
    previous.chars().count() == 1
        && gap
            .strip_prefix('.')
            .is_some_and(|rest| rest.is_empty() || blank(rest))
}

fn is_capitalized(word: &str) -> bool {
    word.chars().next().is_some_and(char::is_uppercase)
}

fn is_connector(word: &str) -> bool {
    CONNECTORS.contains(&word)
}

/// `Jane`, `O'Brien`, `Smith-Jones`, `McDonald`, or a bare initial `J`.
fn is_name_shaped(word: &str) -> bool {
    let mut chars = word.chars();
    let Some(first) = chars.next() else {
        return false;
    };
    if !first.is_uppercase() {
        return false;
    }
    let rest: Vec<char> = chars.collect();
    if rest.is_empty() {
        return true;
    }
    rest.iter().any(|c| c.is_lowercase())
        && rest
            .iter()
            .all(|&c| c.is_alphabetic() || c == '\'' || c == '’' || c == '-')
}
