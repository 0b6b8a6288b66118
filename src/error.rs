//! Library error type. Only report I/O and schema compilation can fail;
//! missing repository files are reported as criterion results instead.

use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum ReadinessError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("{path} is not valid JSON: {source}")]
    Json {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("invalid JSON schema: {0}")]
    Schema(String),
    #[error("failed to serialize report: {0}")]
    Serialize(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, ReadinessError>;
