use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Serialize, Deserialize)]
pub enum AppError {
    /// The underlying stream could not be decoded or read. Fatal to the
    /// current pass; carries the number of rows processed before failure.
    Ingestion { rows_processed: u64, message: String },
    ParseError(String),
    ValidationError(String),
    StateError(String),
    IoError(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Ingestion {
                rows_processed,
                message,
            } => write!(
                f,
                "Ingestion error after {} rows: {}",
                rows_processed, message
            ),
            AppError::ParseError(msg) => write!(f, "Parse error: {}", msg),
            AppError::ValidationError(msg) => write!(f, "Validation error: {}", msg),
            AppError::StateError(msg) => write!(f, "State error: {}", msg),
            AppError::IoError(msg) => write!(f, "IO error: {}", msg),
        }
    }
}

impl std::error::Error for AppError {}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::IoError(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
