//! Error types for orbit.

use std::path::PathBuf;

use thiserror::Error;

/// Main error type for orbit operations.
#[derive(Error, Debug)]
pub enum Error {
    /// File not found.
    #[error("File not found: {0}")]
    FileNotFound(PathBuf),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// SQLite error.
    #[error("SQLite error: {0}")]
    SQLite(#[from] rusqlite::Error),

    /// A task name outside the recognized set.
    #[error("Unknown task: {0} (expected sentiment-analysis, generation or feature-extraction)")]
    UnknownTask(String),

    /// The inference engine has no pipeline for this label.
    #[error("Unsupported pipeline task: {0}")]
    UnsupportedTask(String),

    /// `run` called before `load_model` for the task.
    #[error("Pipeline for task \"{task}\" not initialized. Call load_model(\"{task}\") first.")]
    NotInitialized { task: String },

    /// ONNX inference error.
    #[error("Inference error: {0}")]
    Inference(String),

    /// Tokenization error.
    #[error("Tokenization error: {0}")]
    Tokenization(#[from] tokenizers::Error),

    /// ONNX session error.
    #[error("ONNX session error: {0}")]
    Onnx(#[from] ort::Error),

    /// HuggingFace Hub error.
    #[error("HuggingFace Hub error: {0}")]
    HfHub(#[from] hf_hub::api::sync::ApiError),

    /// JSON error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Cannot compute similarity with an empty vector.
    #[error("Cannot compute similarity with empty vector")]
    EmptyVector,

    /// Vector lengths disagree.
    #[error("Mismatched dimensions: expected {expected} dimensions, got {actual} dimensions")]
    DimensionMismatch { expected: usize, actual: usize },

    /// Vector has zero magnitude, so its direction is undefined.
    #[error("Cannot compute similarity with a zero-magnitude vector")]
    DegenerateVector,

    /// Vector contains NaN or infinite values.
    #[error("Invalid embedding: {0}")]
    InvalidEmbedding(String),

    /// Key-value slot failure not covered by a more specific variant.
    #[error("Storage error: {0}")]
    Storage(String),

    /// The storage slot refused a blob larger than its quota.
    #[error("Storage quota exceeded: {actual} bytes (limit {limit})")]
    QuotaExceeded { limit: usize, actual: usize },
}
