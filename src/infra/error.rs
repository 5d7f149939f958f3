//! Error types for remote PAdES signing operations.
//! One variant per failure class; every error carries a human-readable message.

use thiserror::Error;

/// Result type for signing operations
pub type SigningResult<T> = Result<T, SigningError>;

/// Error taxonomy for the signing engine
#[derive(Error, Debug)]
pub enum SigningError {
    #[error("invalid state: {0}")]
    InvalidState(String),

    #[error("parse failure: {0}")]
    ParseFailure(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("malformed input: {0}")]
    MalformedInput(String),

    #[error("timestamp rejected: {0}")]
    TimestampRejected(String),

    #[error("signature overflow: {0}")]
    SignatureOverflow(String),

    #[error("unsupported algorithm: {0}")]
    UnsupportedAlgorithm(String),

    #[error("IO error: {0}")]
    IoError(String),

    #[error("invalid conformance level: {0}")]
    InvalidConformanceLevel(String),
}

impl From<std::io::Error> for SigningError {
    fn from(error: std::io::Error) -> Self {
        SigningError::IoError(error.to_string())
    }
}

impl From<der::Error> for SigningError {
    fn from(error: der::Error) -> Self {
        SigningError::ParseFailure(error.to_string())
    }
}

impl From<lopdf::Error> for SigningError {
    fn from(error: lopdf::Error) -> Self {
        SigningError::ParseFailure(error.to_string())
    }
}

impl From<base64::DecodeError> for SigningError {
    fn from(error: base64::DecodeError) -> Self {
        SigningError::MalformedInput(error.to_string())
    }
}

impl From<hex::FromHexError> for SigningError {
    fn from(error: hex::FromHexError) -> Self {
        SigningError::MalformedInput(error.to_string())
    }
}
