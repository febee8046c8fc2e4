//! Error types for the idp-core library.

use thiserror::Error;

/// Main error type for the idp library.
#[derive(Error, Debug)]
pub enum IdpError {
    /// OCR processing error.
    #[error("OCR error: {0}")]
    Ocr(#[from] OcrError),

    /// Field extraction error.
    #[error("extraction error: {0}")]
    Extraction(#[from] ExtractionError),

    /// History store error.
    #[error("history error: {0}")]
    History(#[from] HistoryError),

    /// CSV export error.
    #[error("export error: {0}")]
    Export(#[from] ExportError),

    /// I/O error, e.g. creating the per-document work directory.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Document could not be processed.
    #[error("processing failed: {0}")]
    Pipeline(String),
}

/// Errors raised by a recognition engine.
///
/// These never leave the recognition adapter; they only decide whether the
/// next tier is tried.
#[derive(Error, Debug)]
pub enum OcrError {
    /// Failed to load OCR models.
    #[error("failed to load model: {0}")]
    ModelLoad(String),

    /// The backend is not installed or could not be started.
    #[error("backend not available: {0}")]
    BackendNotAvailable(String),

    /// Text recognition failed.
    #[error("text recognition failed: {0}")]
    Recognition(String),

    /// The image could not be decoded.
    #[error("invalid image: {0}")]
    InvalidImage(String),

    /// I/O error while talking to the backend.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors related to the pattern table.
#[derive(Error, Debug)]
pub enum ExtractionError {
    /// A rule's pattern is not a valid regular expression.
    #[error("invalid pattern for {field}: {reason}")]
    InvalidPattern { field: String, reason: String },

    /// The rule file names a field that does not exist.
    #[error("unknown field: {0}")]
    UnknownField(String),

    /// The rule file could not be parsed.
    #[error("failed to parse rule file: {0}")]
    Parse(String),
}

/// Errors related to the extraction history.
#[derive(Error, Debug)]
pub enum HistoryError {
    /// The history lock was poisoned by a panicking writer.
    #[error("history lock poisoned")]
    Poisoned,

    /// A persisted history line could not be decoded.
    #[error("corrupt history record at line {line}: {reason}")]
    Corrupt { line: usize, reason: String },

    /// I/O error on the history file.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors related to CSV export.
#[derive(Error, Debug)]
pub enum ExportError {
    /// There are no results to export.
    #[error("no data to export")]
    Empty,

    /// CSV writer error.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// A result could not be flattened into a row.
    #[error("failed to serialize result: {0}")]
    Serialize(String),

    /// I/O error while writing the export.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for the idp library.
pub type Result<T> = std::result::Result<T, IdpError>;
