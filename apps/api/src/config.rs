use anyhow::{Context, Result};

/// Service configuration loaded from environment variables.
/// Every variable has a default so a bare checkout runs against the bundled dataset.
#[derive(Debug, Clone)]
pub struct Config {
    pub dataset_path: String,
    pub host: String,
    pub port: u16,
    pub max_upload_bytes: usize,
    /// spaCy pipeline used when built with the `spacy` feature.
    pub ner_model: String,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Ok(Config {
            dataset_path: env_or("DATASET_PATH", "data/training_dataset.csv"),
            host: env_or("HOST", "127.0.0.1"),
            port: env_or("PORT", "8080")
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
            max_upload_bytes: env_or("MAX_UPLOAD_BYTES", "10485760")
                .parse::<usize>()
                .context("MAX_UPLOAD_BYTES must be a positive integer")?,
            ner_model: env_or("NER_MODEL", "en_core_web_sm"),
            rust_log: env_or("RUST_LOG", "info"),
        })
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

#[cfg(test)]
impl Config {
    pub fn for_tests() -> Self {
        Config {
            dataset_path: "unused.csv".to_string(),
            host: "127.0.0.1".to_string(),
            port: 0,
            max_upload_bytes: 1024 * 1024,
            ner_model: "en_core_web_sm".to_string(),
            rust_log: "debug".to_string(),
        }
    }
}
