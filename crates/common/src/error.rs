//! Request-level error taxonomy for the relay.

use thiserror::Error;

/// Top-level relay error type.
///
/// None of these are retried inside the relay. Each variant maps to the HTTP
/// status the serving layer should answer with:
/// - [`RelayError::Transport`] / [`RelayError::UpstreamStatus`] → 502
/// - [`RelayError::NotFound`] → 404
/// - [`RelayError::BadRequest`] / [`RelayError::InvalidKeyMaterial`] /
///   [`RelayError::InvalidIvLength`] / [`RelayError::InvalidRangeFormat`] → 400
/// - [`RelayError::RangeOutOfBounds`] → 416
/// - [`RelayError::Internal`] → 500
#[derive(Debug, Error)]
pub enum RelayError {
    /// Network or I/O failure reaching or reading the byte source.
    #[error("transport error: {0}")]
    Transport(String),

    /// The upstream origin answered with a status the relay cannot serve.
    #[error("upstream returned status {0}")]
    UpstreamStatus(u16),

    /// The requested resource does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// The request was malformed (e.g. a missing or undecodable key header).
    #[error("bad request: {0}")]
    BadRequest(String),

    /// The key is not a valid AES key (16, 24 or 32 bytes).
    #[error("invalid key material: {0}")]
    InvalidKeyMaterial(String),

    /// The IV is not exactly 16 bytes.
    #[error("invalid IV length: expected 16 bytes, got {0}")]
    InvalidIvLength(usize),

    /// The `Range` header is not a single `bytes=<start>-<end>` range.
    #[error("invalid range format: {0}")]
    InvalidRangeFormat(String),

    /// The range cannot be satisfied against a resource of `size` bytes.
    #[error("range {range} out of bounds for resource of {size} bytes")]
    RangeOutOfBounds {
        /// The offending range header value.
        range: String,
        /// Total resource size in bytes.
        size: u64,
    },

    /// An unexpected internal error occurred.
    #[error("internal error: {0}")]
    Internal(String),
}

impl RelayError {
    /// Returns the HTTP status code that should be sent for this error.
    pub fn http_status(&self) -> u16 {
        match self {
            RelayError::Transport(_) | RelayError::UpstreamStatus(_) => 502,
            RelayError::NotFound(_) => 404,
            RelayError::BadRequest(_)
            | RelayError::InvalidKeyMaterial(_)
            | RelayError::InvalidIvLength(_)
            | RelayError::InvalidRangeFormat(_) => 400,
            RelayError::RangeOutOfBounds { .. } => 416,
            RelayError::Internal(_) => 500,
        }
    }

    /// Short machine-readable code used in JSON error bodies.
    pub fn code(&self) -> &'static str {
        match self {
            RelayError::Transport(_) => "transport_error",
            RelayError::UpstreamStatus(_) => "upstream_error",
            RelayError::NotFound(_) => "not_found",
            RelayError::BadRequest(_) => "bad_request",
            RelayError::InvalidKeyMaterial(_) => "invalid_key",
            RelayError::InvalidIvLength(_) => "invalid_iv",
            RelayError::InvalidRangeFormat(_) => "invalid_range",
            RelayError::RangeOutOfBounds { .. } => "range_not_satisfiable",
            RelayError::Internal(_) => "internal_error",
        }
    }

    /// Whether the caller (rather than the relay or its upstream) is at fault.
    pub fn is_client_error(&self) -> bool {
        (400..500).contains(&self.http_status())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn http_status_codes() {
        assert_eq!(RelayError::Transport("x".into()).http_status(), 502);
        assert_eq!(RelayError::UpstreamStatus(500).http_status(), 502);
        assert_eq!(RelayError::NotFound("x".into()).http_status(), 404);
        assert_eq!(RelayError::BadRequest("x".into()).http_status(), 400);
        assert_eq!(RelayError::InvalidKeyMaterial("x".into()).http_status(), 400);
        assert_eq!(RelayError::InvalidIvLength(8).http_status(), 400);
        assert_eq!(RelayError::InvalidRangeFormat("x".into()).http_status(), 400);
        assert_eq!(
            RelayError::RangeOutOfBounds {
                range: "bytes=0-200".into(),
                size: 100
            }
            .http_status(),
            416
        );
        assert_eq!(RelayError::Internal("x".into()).http_status(), 500);
    }

    #[test]
    fn client_errors() {
        assert!(RelayError::InvalidRangeFormat("x".into()).is_client_error());
        assert!(!RelayError::Transport("x".into()).is_client_error());
        assert!(!RelayError::Internal("x".into()).is_client_error());
    }

    #[test]
    fn display_includes_context() {
        let e = RelayError::RangeOutOfBounds {
            range: "bytes=0-200".into(),
            size: 100,
        };
        let s = e.to_string();
        assert!(s.contains("bytes=0-200"));
        assert!(s.contains("100"));
        assert!(RelayError::InvalidIvLength(8).to_string().contains("got 8"));
    }
}
