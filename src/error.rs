//! Error types for trip planning.

use std::fmt;

use thiserror::Error;

/// Result type alias for trip-planner operations.
pub type PlannerResult<T> = Result<T, PlannerError>;

/// Why an encoded polyline could not be decoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PolylineFault {
    /// Input ended while a chunk still had its continuation bit set.
    Truncated,
    /// Byte outside the `'?'..='~'` alphabet.
    InvalidCharacter,
    /// Input ended after a latitude delta with no longitude delta.
    MissingLongitude,
    /// A single value spans more chunks than a 32-bit delta allows.
    Overlong,
}

impl fmt::Display for PolylineFault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            PolylineFault::Truncated => "unterminated chunk",
            PolylineFault::InvalidCharacter => "invalid character",
            PolylineFault::MissingLongitude => "latitude without longitude",
            PolylineFault::Overlong => "value too long",
        };
        f.write_str(text)
    }
}

/// Errors raised while planning a trip.
#[derive(Debug, Error)]
pub enum PlannerError {
    /// The user refused location access.
    #[error("location permission denied")]
    PermissionDenied,

    /// Permission was granted but no position could be determined.
    #[error("location unavailable: {0}")]
    LocationUnavailable(String),

    /// Transport-level failure talking to a remote API.
    #[error("network failure: {0}")]
    NetworkFailure(#[from] reqwest::Error),

    /// Remote API answered with a non-success HTTP status.
    #[error("http status {status}")]
    HttpStatus {
        /// The HTTP status code.
        status: u16,
    },

    /// Remote API answered but reported a failure in its payload.
    #[error("api status {status}: {message}")]
    ApiStatus {
        /// The `status` field of the payload.
        status: String,
        /// The `error_message` field, if any.
        message: String,
    },

    /// Payload is missing fields we rely on.
    #[error("malformed response: {0}")]
    MalformedResponse(String),

    /// Encoded polyline could not be decoded.
    #[error("malformed polyline at byte {position}: {reason}")]
    MalformedPolyline {
        /// Byte offset where decoding stopped.
        position: usize,
        /// What went wrong.
        reason: PolylineFault,
    },

    /// Missing or invalid configuration.
    #[error("configuration error: {0}")]
    Config(String),
}

impl PlannerError {
    /// Whether the UI should treat this error as a failed network call:
    /// log it and keep whatever was on screen.
    pub fn is_network_failure(&self) -> bool {
        matches!(
            self,
            PlannerError::NetworkFailure(_)
                | PlannerError::HttpStatus { .. }
                | PlannerError::ApiStatus { .. }
                | PlannerError::MalformedResponse(_)
                | PlannerError::MalformedPolyline { .. }
        )
    }
}

impl From<serde_json::Error> for PlannerError {
    fn from(err: serde_json::Error) -> Self {
        PlannerError::MalformedResponse(err.to_string())
    }
}
