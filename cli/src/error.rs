//! Error types shared by the catalog, history reader and prediction bridge

use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Coarse failure category, used by the HTTP layer to pick a status code
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Missing or malformed caller input
    Validation,
    /// Unknown symbol or missing backing file
    NotFound,
    /// External predictor failed or produced unusable output
    Bridge,
    /// Filesystem, decoding or transport failure
    Io,
}

#[derive(Debug, Error)]
pub enum StockError {
    /// Required input missing or malformed
    #[error("Validation error: {0}")]
    Validation(String),

    /// No backing data file for the symbol
    #[error("Stock data not found for {symbol}")]
    NotFound { symbol: String },

    /// Fewer points than the summary needs
    #[error("Insufficient data for {symbol}: need at least {required} points, found {found}")]
    InsufficientData {
        symbol: String,
        required: usize,
        found: usize,
    },

    /// Header row does not satisfy the schema
    #[error("Schema error in {path}: {reason}")]
    Schema { path: PathBuf, reason: String },

    /// A row value could not be decoded with its field rule
    #[error("Malformed row {line} in {path}: field {field} has invalid value {value:?}")]
    MalformedRow {
        path: PathBuf,
        line: u64,
        field: String,
        value: String,
    },

    /// Predictor output was not a well-formed result
    #[error("Failed to parse prediction result: {reason}\n{raw}")]
    Parse { reason: String, raw: String },

    /// Predictor process could not be run or was rejected
    #[error("Predictor failed: {0}")]
    Bridge(String),

    /// Predictor exceeded the configured time limit
    #[error("Predictor timed out after {0:?}")]
    Timeout(Duration),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Server answered with an error body
    #[error("Server error {status}: {message}")]
    Remote { status: u16, message: String },

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),
}

impl StockError {
    pub fn not_found(symbol: impl Into<String>) -> Self {
        StockError::NotFound {
            symbol: symbol.into(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            StockError::Validation(_) => ErrorKind::Validation,
            StockError::NotFound { .. } => ErrorKind::NotFound,
            StockError::Parse { .. } | StockError::Bridge(_) | StockError::Timeout(_) => {
                ErrorKind::Bridge
            }
            StockError::Remote { status: 400, .. } => ErrorKind::Validation,
            StockError::Remote { status: 404, .. } => ErrorKind::NotFound,
            StockError::InsufficientData { .. }
            | StockError::Schema { .. }
            | StockError::MalformedRow { .. }
            | StockError::Io(_)
            | StockError::Csv(_)
            | StockError::Remote { .. }
            | StockError::Network(_) => ErrorKind::Io,
        }
    }

    /// Raw predictor output attached to the error, if any
    pub fn raw_output(&self) -> Option<&str> {
        match self {
            StockError::Parse { raw, .. } => Some(raw),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, StockError>;
