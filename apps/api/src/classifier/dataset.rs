//! Training table loader. Columns are positional: gender, age, the five trait
//! scores, then the personality label. The header row is skipped.

use std::collections::BTreeSet;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use csv::{ReaderBuilder, StringRecord};

use crate::errors::TrainingError;

/// Feature order shared by training rows and prediction requests.
pub const FEATURE_NAMES: [&str; 7] = [
    "gender",
    "age",
    "openness",
    "neuroticism",
    "conscientiousness",
    "agreeableness",
    "extraversion",
];

pub const FEATURE_COUNT: usize = FEATURE_NAMES.len();

/// Cell values treated as missing, matching the usual CSV "NA" spellings.
const MISSING_MARKERS: &[&str] = &[
    "", "NA", "N/A", "n/a", "NaN", "nan", "null", "NULL", "None", "#N/A", "<NA>",
];

#[derive(Debug, Clone, PartialEq)]
pub struct TrainingExample {
    pub features: [f64; FEATURE_COUNT],
    pub label: String,
}

#[derive(Debug, Clone, Default)]
pub struct Dataset {
    pub examples: Vec<TrainingExample>,
    /// Rows excluded for missing or non-numeric cells.
    pub dropped: usize,
}

impl Dataset {
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, TrainingError> {
        let file = File::open(path)?;
        Self::from_reader(file)
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Self, TrainingError> {
        let mut reader = ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_reader(reader);

        let mut dataset = Dataset::default();
        for record in reader.records() {
            match parse_row(&record?) {
                Some(example) => dataset.examples.push(example),
                None => dataset.dropped += 1,
            }
        }
        Ok(dataset)
    }

    /// Distinct labels in sorted order. Class indices follow this order.
    pub fn labels(&self) -> Vec<String> {
        self.examples
            .iter()
            .map(|e| e.label.clone())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    pub fn len(&self) -> usize {
        self.examples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.examples.is_empty()
    }
}

/// Male → 1, Female → 0, compared verbatim. Anything else, padded values
/// included, has no encoding and drops the row.
pub fn encode_gender(value: &str) -> Option<f64> {
    match value {
        "Male" => Some(1.0),
        "Female" => Some(0.0),
        _ => None,
    }
}

/// Best-effort numeric coercion shared with prediction input.
pub fn parse_numeric(raw: &str) -> Option<f64> {
    raw.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

fn parse_row(record: &StringRecord) -> Option<TrainingExample> {
    if record.len() < FEATURE_COUNT + 1 {
        return None;
    }
    // A missing cell anywhere in the row excludes it, even past the label column.
    // Numeric cells tolerate padding; gender and label are taken verbatim.
    if record.iter().any(|cell| MISSING_MARKERS.contains(&cell.trim())) {
        return None;
    }

    let mut features = [0.0; FEATURE_COUNT];
    features[0] = encode_gender(record.get(0)?)?;
    for (idx, slot) in features.iter_mut().enumerate().skip(1) {
        *slot = parse_numeric(record.get(idx)?)?;
    }

    Some(TrainingExample {
        features,
        label: record.get(FEATURE_COUNT)?.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const HEADER: &str = "Gender,Age,openness,neuroticism,conscientiousness,agreeableness,extraversion,Personality (Class label)\n";

    fn load(rows: &str) -> Dataset {
        Dataset::from_reader(format!("{HEADER}{rows}").as_bytes()).unwrap()
    }

    #[test]
    fn test_valid_row_is_encoded() {
        let ds = load("Male,17,7,4,7,3,2,extraverted\n");
        assert_eq!(ds.len(), 1);
        assert_eq!(ds.dropped, 0);
        assert_eq!(
            ds.examples[0].features,
            [1.0, 17.0, 7.0, 4.0, 7.0, 3.0, 2.0]
        );
        assert_eq!(ds.examples[0].label, "extraverted");
    }

    #[test]
    fn test_female_encodes_to_zero() {
        let ds = load("Female,21,5,5,5,5,5,serious\n");
        assert_eq!(ds.examples[0].features[0], 0.0);
    }

    #[test]
    fn test_unknown_gender_is_dropped() {
        let ds = load("Other,21,5,5,5,5,5,serious\nmale,21,5,5,5,5,5,serious\n");
        assert!(ds.is_empty());
        assert_eq!(ds.dropped, 2);
    }

    #[test]
    fn test_non_numeric_feature_is_dropped() {
        let ds = load("Male,abc,5,5,5,5,5,serious\nMale,20,5,5,5,5,5,serious\n");
        assert_eq!(ds.len(), 1);
        assert_eq!(ds.dropped, 1);
    }

    #[test]
    fn test_missing_label_is_dropped() {
        let ds = load("Male,20,5,5,5,5,5,\nMale,20,5,5,5,5,5,NA\n");
        assert!(ds.is_empty());
        assert_eq!(ds.dropped, 2);
    }

    #[test]
    fn test_short_row_is_dropped() {
        let ds = load("Male,20,5,5\n");
        assert!(ds.is_empty());
        assert_eq!(ds.dropped, 1);
    }

    #[test]
    fn test_padded_numbers_are_parsed() {
        let ds = load("Male, 20 , 5 ,5,5,5,5,lively\n");
        assert_eq!(ds.len(), 1);
        assert_eq!(ds.examples[0].features[1], 20.0);
        assert_eq!(ds.examples[0].label, "lively");
    }

    #[test]
    fn test_padded_gender_drops_row() {
        let ds = load("Male ,20,5,5,5,5,5,lively\n Female,20,5,5,5,5,5,lively\n");
        assert_eq!(ds.len(), 0);
        assert_eq!(ds.dropped, 2);
    }

    #[test]
    fn test_blank_cell_counts_as_missing() {
        let ds = load("Male,20,  ,5,5,5,5,lively\nMale,20,5,5,5,5,5,   \n");
        assert_eq!(ds.len(), 0);
        assert_eq!(ds.dropped, 2);
    }

    #[test]
    fn test_labels_are_sorted_and_distinct() {
        let ds = load(
            "Male,20,5,5,5,5,5,serious\nFemale,20,5,5,5,5,5,lively\nMale,22,5,5,5,5,5,serious\n",
        );
        assert_eq!(ds.labels(), vec!["lively".to_string(), "serious".to_string()]);
    }

    #[test]
    fn test_parse_numeric_rejects_non_finite() {
        assert_eq!(parse_numeric(" 4.5 "), Some(4.5));
        assert_eq!(parse_numeric("inf"), None);
        assert_eq!(parse_numeric("NaN"), None);
        assert_eq!(parse_numeric("five"), None);
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let err = Dataset::from_path("/definitely/not/here.csv").unwrap_err();
        assert!(matches!(err, TrainingError::Io(_)));
    }
}
