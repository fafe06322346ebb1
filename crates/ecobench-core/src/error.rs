//! Typed errors for telemetry comparison and load generation.

use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while loading, aligning, or exporting telemetry tables.
#[derive(Debug, Error)]
pub enum CompareError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed CSV in {path}: {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("{path} has no '{column}' column")]
    MissingColumn { path: PathBuf, column: String },

    #[error("{path} row {row}: cannot parse timestamp '{value}'")]
    Timestamp {
        path: PathBuf,
        row: usize,
        value: String,
    },

    #[error("column '{0}' is not numeric")]
    NotNumeric(String),

    #[error("unknown column '{0}'")]
    UnknownColumn(String),

    #[error("invalid comparison config: {0}")]
    InvalidConfig(String),

    #[error("export to {path} failed: {message}")]
    Export { path: PathBuf, message: String },
}

/// Errors raised while acquiring or driving the GPU for the load generator.
#[derive(Debug, Error)]
pub enum GpuError {
    #[error("no GPU adapter found")]
    NoAdapter,

    #[error("no GPU adapter matching '{0}'")]
    NoMatchingAdapter(String),

    #[error("failed to create GPU device: {0}")]
    DeviceCreation(String),

    #[error("GPU readback failed: {0}")]
    Readback(String),

    #[error("invalid GPU load config: {0}")]
    InvalidConfig(String),
}

/// Result alias for comparison operations.
pub type Result<T> = std::result::Result<T, CompareError>;
