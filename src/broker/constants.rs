//! Wire protocol constants
//!
//! This module centralizes the magic numbers used in the protocol
//! implementation.
//!
//! # Terminology
//! - **API Key**: Identifies which operation/request type (e.g., 18 = ApiVersions)
//! - **API Version**: Identifies which revision of that operation's schema is in use

// ===== API Keys =====

/// API key for ApiVersions requests
///
/// Used to discover which API versions the broker supports
pub const API_KEY_API_VERSIONS: i16 = 18;

// ===== Configuration Defaults =====

/// Default listener port
pub const DEFAULT_PORT: u16 = 9092;

/// Minimum allowed port number (above privileged ports)
pub const MIN_PORT: u16 = 1024;

/// Default host for production (bind to all interfaces)
pub const DEFAULT_HOST: &str = "0.0.0.0";

// ===== Protocol Limits =====

/// Maximum request frame size (100MB)
///
/// This limit prevents runaway allocations from extremely large requests
pub const MAX_FRAME_SIZE: usize = 100_000_000;

/// Sanity ceiling for decoded string and array lengths
///
/// Length prefixes above this are rejected before any allocation is attempted,
/// so corrupt input cannot ask for gigabytes of buffer.
pub const MAX_REASONABLE_SIZE: usize = 8192;

/// Maximum encoded size of an unsigned varint in the 32-bit domain
pub const MAX_VARINT32_BYTES: usize = 5;

/// Maximum encoded size of an unsigned varint in the 64-bit domain
pub const MAX_VARINT64_BYTES: usize = 10;

// ===== Error Codes =====
// Numeric codes carried in the error_code field of response bodies

/// No error
pub const ERROR_NONE: i16 = 0;

/// Unknown server error
pub const ERROR_UNKNOWN_SERVER_ERROR: i16 = -1;

/// Request timed out (connection-layer, never raised by the codec itself)
pub const ERROR_REQUEST_TIMED_OUT: i16 = 7;

/// Unsupported version
pub const ERROR_UNSUPPORTED_VERSION: i16 = 35;

/// Invalid request (malformed framing, schema violation, unknown api key)
pub const ERROR_INVALID_REQUEST: i16 = 42;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes_match_wire_values() {
        assert_eq!(ERROR_NONE, 0);
        assert_eq!(ERROR_UNKNOWN_SERVER_ERROR, -1);
        assert_eq!(ERROR_REQUEST_TIMED_OUT, 7);
        assert_eq!(ERROR_UNSUPPORTED_VERSION, 35);
        assert_eq!(ERROR_INVALID_REQUEST, 42);
    }

    #[test]
    fn test_limits_reasonable() {
        assert!(MAX_FRAME_SIZE <= 1_000_000_000, "frame limit should stay under 1GB");
        assert!(MAX_REASONABLE_SIZE >= 1024);
        assert_eq!(MAX_VARINT32_BYTES, 5);
        assert_eq!(MAX_VARINT64_BYTES, 10);
    }
}
