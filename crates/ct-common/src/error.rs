//! Error types for Census Taker.
//!
//! Failures fall into three tiers:
//! - Per-item soft failures (unreadable file, one failed HTTP attempt) are
//!   handled at the call site with a log line and a skip; they never surface
//!   through this type.
//! - Provider-level hard failures (the property lister cannot be invoked)
//!   abort the run, since the property set is foundational.
//! - Pipeline-level hard failures (compression) abort delivery entirely,
//!   since no valid payload exists to send or fall back on.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type alias for Census Taker operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error categories for grouping related errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    /// Configuration and asset loading errors.
    Config,
    /// Provider collection errors.
    Collection,
    /// Payload compression errors.
    Compression,
    /// Primary endpoint delivery errors.
    Delivery,
    /// Bulk object store errors.
    Store,
    /// File I/O and serialization errors.
    Io,
}

impl std::fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorCategory::Config => write!(f, "config"),
            ErrorCategory::Collection => write!(f, "collection"),
            ErrorCategory::Compression => write!(f, "compression"),
            ErrorCategory::Delivery => write!(f, "delivery"),
            ErrorCategory::Store => write!(f, "store"),
            ErrorCategory::Io => write!(f, "io"),
        }
    }
}

/// Unified error type for Census Taker.
#[derive(Error, Debug)]
pub enum Error {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("missing asset: {name}")]
    MissingAsset { name: String },

    #[error("collection failed: {0}")]
    Collection(String),

    #[error("property lister failed: {0}")]
    PropertyLister(String),

    #[error("compression failed: {0}")]
    Compression(String),

    #[error("delivery failed after {attempts} attempts")]
    DeliveryExhausted { attempts: u32 },

    #[error("object store error: {0}")]
    Store(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Returns the error category for grouping and filtering.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Error::Config(_) | Error::MissingAsset { .. } => ErrorCategory::Config,
            Error::Collection(_) | Error::PropertyLister(_) => ErrorCategory::Collection,
            Error::Compression(_) => ErrorCategory::Compression,
            Error::DeliveryExhausted { .. } => ErrorCategory::Delivery,
            Error::Store(_) => ErrorCategory::Store,
            Error::Io(_) | Error::Json(_) => ErrorCategory::Io,
        }
    }

    /// Returns whether this error is potentially recoverable.
    ///
    /// Delivery exhaustion is recoverable by design: the payload survives in
    /// the fallback channel and the audit file, so a later run or an operator
    /// can complete delivery.
    pub fn is_recoverable(&self) -> bool {
        match self {
            Error::Config(_) | Error::MissingAsset { .. } => true,
            Error::Collection(_) => true,
            Error::PropertyLister(_) => false,
            Error::Compression(_) => false,
            Error::DeliveryExhausted { .. } => true,
            Error::Store(_) => true,
            Error::Io(_) => true,
            Error::Json(_) => false,
        }
    }
}
