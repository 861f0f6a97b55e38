//! Error types for the botcensus-report crate.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ReportError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error in {path}: {source}")]
    Json {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Config error: {0}")]
    Config(String),

    #[error("Invalid date limit {value:?}: expected YYYY-MM-DDTHH:MM:SSZ")]
    DateLimit { value: String },

    #[error("Chart rendering failed for {path}: {message}")]
    Chart { path: String, message: String },
}

pub type Result<T> = std::result::Result<T, ReportError>;
