//! Security error types

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SecurityError {
    /// The OS random source could not produce bytes. Never retried with a
    /// weaker generator.
    #[error("Secure random source unavailable: {0}")]
    EntropyUnavailable(String),

    #[error("Nonce size must be at least 1 byte (got {0})")]
    InvalidNonceSize(usize),

    #[error("Malformed hash source {0:?}: expected a base64 digest")]
    MalformedHash(String),

    #[error("Malformed nonce {0:?}: expected a base64 token")]
    MalformedNonce(String),

    #[error("Invalid report URI {0:?}")]
    InvalidReportUri(String),

    #[error("Invalid CSP directive table: {0}")]
    InvalidBaseline(String),

    #[error("Malformed CSP violation report: {0}")]
    MalformedReport(String),
}

impl From<SecurityError> for bulwark_core::Error {
    fn from(err: SecurityError) -> Self {
        match err {
            SecurityError::MalformedReport(_) => bulwark_core::Error::BadRequest(err.to_string()),
            SecurityError::EntropyUnavailable(_) => {
                bulwark_core::Error::ServiceUnavailable(err.to_string())
            }
            _ => bulwark_core::Error::Configuration(err.to_string()),
        }
    }
}

pub type Result<T> = std::result::Result<T, SecurityError>;
