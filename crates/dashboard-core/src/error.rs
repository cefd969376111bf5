use std::path::PathBuf;
use thiserror::Error;

/// All errors produced by the case dashboard.
#[derive(Error, Debug)]
pub enum DashboardError {
    /// A file could not be opened or read from disk.
    #[error("Failed to read file {path}: {source}")]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// An output file could not be created or written.
    #[error("Failed to write file {path}: {source}")]
    FileWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The input file is not valid CSV.
    #[error("Failed to parse CSV: {0}")]
    Csv(#[from] csv::Error),

    /// The input file extension is not a supported tabular format.
    #[error("Unsupported data file format: {0}")]
    UnsupportedFormat(PathBuf),

    /// A column that drives KPIs, filters or derived fields is absent.
    ///
    /// Reported as a warning; the pipeline keeps running with the columns
    /// that do exist.
    #[error("The column '{column}' is missing in the dataset")]
    MissingColumn { column: String, required: bool },

    /// A timestamp string did not match any recognised format.
    #[error("Invalid timestamp format: {0}")]
    TimestampParse(String),

    /// A schema configuration document could not be parsed.
    #[error("Failed to parse schema config: {0}")]
    SchemaParse(#[from] serde_json::Error),

    /// Pass-through for any raw I/O error that does not carry a path.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Convenience alias used throughout the dashboard crates.
pub type Result<T> = std::result::Result<T, DashboardError>;
