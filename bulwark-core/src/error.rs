// Error types for the Bulwark pipeline

use crate::{HttpResponse, HttpStatus};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Bad Request: {0}")]
    BadRequest(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Not Found: {0}")]
    NotFound(String),

    #[error("Method not allowed: {0}")]
    MethodNotAllowed(String),

    #[error("Payload Too Large: {0}")]
    PayloadTooLarge(String),

    #[error("Unsupported Media Type: {0}")]
    UnsupportedMediaType(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Deserialization error: {0}")]
    Deserialization(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Internal server error: {0}")]
    Internal(String),

    #[error("Service Unavailable: {0}")]
    ServiceUnavailable(String),
}

impl Error {
    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> u16 {
        self.http_status().code()
    }

    /// Get the HttpStatus enum for this error
    pub fn http_status(&self) -> HttpStatus {
        match self {
            Error::BadRequest(_) | Error::Deserialization(_) => HttpStatus::BadRequest,
            Error::Forbidden(_) => HttpStatus::Forbidden,
            Error::NotFound(_) => HttpStatus::NotFound,
            Error::MethodNotAllowed(_) => HttpStatus::MethodNotAllowed,
            Error::PayloadTooLarge(_) => HttpStatus::PayloadTooLarge,
            Error::UnsupportedMediaType(_) => HttpStatus::UnsupportedMediaType,
            Error::ServiceUnavailable(_) => HttpStatus::ServiceUnavailable,
            Error::Serialization(_) | Error::Configuration(_) | Error::Internal(_) => {
                HttpStatus::InternalServerError
            }
        }
    }

    /// Check if this is a client error (4xx)
    pub fn is_client_error(&self) -> bool {
        self.http_status().is_client_error()
    }

    /// Check if this is a server error (5xx)
    pub fn is_server_error(&self) -> bool {
        self.http_status().is_server_error()
    }

    /// Render the error as a plain-text response.
    ///
    /// Server errors hide their message from the client.
    pub fn into_response(self) -> HttpResponse {
        let status = self.http_status();
        let body = if status.is_server_error() {
            status.reason().to_string()
        } else {
            self.to_string()
        };

        HttpResponse::new(status.code()).with_text(body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(Error::BadRequest("x".into()).status_code(), 400);
        assert_eq!(Error::Deserialization("x".into()).status_code(), 400);
        assert_eq!(Error::MethodNotAllowed("GET".into()).status_code(), 405);
        assert_eq!(Error::Configuration("x".into()).status_code(), 500);
    }

    #[test]
    fn test_error_classes() {
        assert!(Error::UnsupportedMediaType("text/plain".into()).is_client_error());
        assert!(Error::Internal("boom".into()).is_server_error());
    }

    #[test]
    fn test_into_response_hides_server_details() {
        let response = Error::Internal("entropy pool exhausted".into()).into_response();
        assert_eq!(response.status, 500);
        assert_eq!(response.body, b"Internal Server Error".to_vec());

        let response = Error::BadRequest("missing body".into()).into_response();
        assert_eq!(response.status, 400);
        assert_eq!(response.body, b"Bad Request: missing body".to_vec());
    }
}
