//! Protocol error types
//!
//! This module defines the error taxonomy for protocol operations. Decode-time
//! violations carry enough detail to say which field failed and why, and every
//! error maps onto a numeric wire error code that can be placed directly into
//! a response body.

use thiserror::Error;

use crate::broker::constants::{
    ERROR_INVALID_REQUEST, ERROR_NONE, ERROR_REQUEST_TIMED_OUT, ERROR_UNKNOWN_SERVER_ERROR,
    ERROR_UNSUPPORTED_VERSION,
};

/// Wire-level error codes understood by clients
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    /// No error
    None,
    /// The server experienced an unexpected internal error
    UnknownServerError,
    /// The request timed out (reserved for the connection layer)
    RequestTimedOut,
    /// The requested API version is outside the handler's supported range
    UnsupportedVersion,
    /// The request is malformed or targets an unknown API
    InvalidRequest,
}

impl ErrorCode {
    /// The numeric code carried in the error_code field of a response body
    pub fn code(&self) -> i16 {
        match self {
            ErrorCode::None => ERROR_NONE,
            ErrorCode::UnknownServerError => ERROR_UNKNOWN_SERVER_ERROR,
            ErrorCode::RequestTimedOut => ERROR_REQUEST_TIMED_OUT,
            ErrorCode::UnsupportedVersion => ERROR_UNSUPPORTED_VERSION,
            ErrorCode::InvalidRequest => ERROR_INVALID_REQUEST,
        }
    }

    /// Canonical human-readable description
    pub fn message(&self) -> &'static str {
        match self {
            ErrorCode::None => "No error.",
            ErrorCode::UnknownServerError => "The server experienced an unexpected error.",
            ErrorCode::RequestTimedOut => "The request timed out.",
            ErrorCode::UnsupportedVersion => "The version of API is not supported.",
            ErrorCode::InvalidRequest => "The request is invalid.",
        }
    }
}

/// Errors that can occur during protocol operations
#[derive(Error, Debug)]
pub enum BrokerError {
    /// Request bytes violate the wire format or the negotiated schema
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Requested API version is outside the handler's declared range
    #[error("Unsupported version {api_version} for API key {api_key}")]
    UnsupportedVersion { api_key: i16, api_version: i16 },

    /// No handler is registered for this API key
    #[error("Unknown API key: {0}")]
    UnknownApiKey(i16),

    /// Error while encoding a response (internal contract violation)
    #[error("Encoding error: {0}")]
    Encoding(String),

    /// IO error occurred during network operations
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid configuration value
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Unexpected internal failure
    #[error("Internal error: {0}")]
    Internal(String),
}

impl BrokerError {
    /// Convert this error to the wire error code placed in error responses.
    ///
    /// Malformed input and unknown API keys both surface as INVALID_REQUEST;
    /// internal failures (encoding bugs, IO, config) surface as
    /// UNKNOWN_SERVER_ERROR since they are never the client's fault.
    pub fn error_code(&self) -> ErrorCode {
        match self {
            BrokerError::InvalidRequest(_) | BrokerError::UnknownApiKey(_) => {
                ErrorCode::InvalidRequest
            }
            BrokerError::UnsupportedVersion { .. } => ErrorCode::UnsupportedVersion,
            BrokerError::Encoding(_)
            | BrokerError::Io(_)
            | BrokerError::InvalidConfig(_)
            | BrokerError::Internal(_) => ErrorCode::UnknownServerError,
        }
    }
}

/// Result type alias for protocol operations
pub type Result<T> = std::result::Result<T, BrokerError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = BrokerError::InvalidRequest("message size mismatch".to_string());
        let msg = format!("{}", err);
        assert!(msg.contains("Invalid request"));
        assert!(msg.contains("message size mismatch"));
    }

    #[test]
    fn test_unknown_api_key_maps_to_invalid_request() {
        let err = BrokerError::UnknownApiKey(9999);
        assert_eq!(err.error_code(), ErrorCode::InvalidRequest);
        assert_eq!(err.error_code().code(), 42);
    }

    #[test]
    fn test_unsupported_version_code() {
        let err = BrokerError::UnsupportedVersion {
            api_key: 18,
            api_version: 99,
        };
        assert_eq!(err.error_code().code(), 35);
        let msg = format!("{}", err);
        assert!(msg.contains("99"));
        assert!(msg.contains("18"));
    }

    #[test]
    fn test_internal_errors_map_to_unknown_server_error() {
        assert_eq!(
            BrokerError::Encoding("bad".into()).error_code().code(),
            -1
        );
        assert_eq!(
            BrokerError::Internal("bad".into()).error_code().code(),
            -1
        );
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::UnexpectedEof, "connection closed");
        let err: BrokerError = io_err.into();
        let msg = format!("{}", err);
        assert!(msg.contains("IO error"));
        assert!(msg.contains("connection closed"));
    }

    #[test]
    fn test_error_code_messages() {
        assert_eq!(ErrorCode::None.message(), "No error.");
        assert!(ErrorCode::UnsupportedVersion.message().contains("not supported"));
    }
}
