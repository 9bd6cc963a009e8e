use serde::{Deserialize, Serialize};

use crate::classifier::dataset::FEATURE_COUNT;

/// One set of self-reported attributes. Values stay as raw strings until
/// prediction so that coercion failures can be downgraded, not rejected.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PredictionRequest {
    /// 1 for male, 0 for female.
    pub gender: String,
    pub age: String,
    pub openness: String,
    pub neuroticism: String,
    pub conscientiousness: String,
    pub agreeableness: String,
    pub extraversion: String,
}

impl Default for PredictionRequest {
    /// Mirrors the intake form: traits start at the midpoint, age is blank.
    fn default() -> Self {
        Self {
            gender: "0".to_string(),
            age: String::new(),
            openness: "5".to_string(),
            neuroticism: "5".to_string(),
            conscientiousness: "5".to_string(),
            agreeableness: "5".to_string(),
            extraversion: "5".to_string(),
        }
    }
}

impl PredictionRequest {
    /// Feature values in training-column order.
    pub fn features(&self) -> [&str; FEATURE_COUNT] {
        [
            &self.gender,
            &self.age,
            &self.openness,
            &self.neuroticism,
            &self.conscientiousness,
            &self.agreeableness,
            &self.extraversion,
        ]
    }

    /// Assigns a form field by name. Returns `false` for names that are not features.
    pub fn set_field(&mut self, name: &str, value: String) -> bool {
        let slot = match name {
            "gender" => &mut self.gender,
            "age" => &mut self.age,
            "openness" => &mut self.openness,
            "neuroticism" => &mut self.neuroticism,
            "conscientiousness" => &mut self.conscientiousness,
            "agreeableness" => &mut self.agreeableness,
            "extraversion" => &mut self.extraversion,
            _ => return false,
        };
        *slot = value;
        true
    }
}
