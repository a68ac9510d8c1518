use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum JobError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML deserialization failed: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Output directory already exists: {}", .0.display())]
    OutputExists(PathBuf),

    #[error("No input files found at {}", .0.display())]
    NoInput(PathBuf),

    #[error("Malformed intermediate record at line {line}: {message}")]
    Codec { line: usize, message: String },

    #[error("Task failed: {0}")]
    Task(String),
}

pub type Result<T> = std::result::Result<T, JobError>;
