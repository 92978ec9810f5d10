//! Axum middleware settings applied to the router.
//!
//! Request tracing and a response-head timeout. No compression layer: it
//! would rewrite `Content-Length` and break byte-range semantics.

use std::time::Duration;

/// Time allowed to produce the status line and headers. Body streaming is
/// not covered; the upstream client's own timeout bounds that.
pub const RESPONSE_HEAD_TIMEOUT: Duration = Duration::from_secs(30);
