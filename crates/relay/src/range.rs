//! `Range` / `Content-Range` header handling.
//!
//! Only the single-range form `bytes=<start>-<end>` is accepted. Suffix
//! (`bytes=-N`), open-ended (`bytes=N-`) and multi-range requests are
//! rejected rather than partially honoured.

use common::RelayError;
use thiserror::Error;

const BYTES_PREFIX: &str = "bytes=";

/// Errors from range header parsing.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RangeError {
    /// The header is not a single `bytes=<start>-<end>` range.
    #[error("invalid range format: {0:?}")]
    InvalidFormat(String),

    /// The range is well-formed but cannot be satisfied.
    #[error("range {range:?} out of bounds for resource of {size} bytes")]
    OutOfBounds { range: String, size: u64 },
}

impl From<RangeError> for RelayError {
    fn from(err: RangeError) -> Self {
        match err {
            RangeError::InvalidFormat(h) => RelayError::InvalidRangeFormat(h),
            RangeError::OutOfBounds { range, size } => RelayError::RangeOutOfBounds { range, size },
        }
    }
}

/// A validated client range request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RangeRequest {
    /// No `Range` header: serve the entire resource.
    Whole,
    /// Serve `length` bytes starting at `offset`. `length` is never zero.
    Bytes { offset: u64, length: u64 },
}

impl RangeRequest {
    /// First byte served.
    pub fn offset(&self) -> u64 {
        match self {
            Self::Whole => 0,
            Self::Bytes { offset, .. } => *offset,
        }
    }
}

/// Parse a `Range` header value against a resource of `size` bytes.
///
/// # Errors
///
/// - [`RangeError::InvalidFormat`] if a non-empty header is not `bytes=<start>-<end>`.
/// - [`RangeError::OutOfBounds`] if `start > end` or `end >= size`.
pub fn parse(header: &str, size: u64) -> Result<RangeRequest, RangeError> {
    if header.is_empty() {
        return Ok(RangeRequest::Whole);
    }

    let (start, end) = split_fields(header)?;

    if start > end || end >= size {
        return Err(RangeError::OutOfBounds {
            range: header.to_owned(),
            size,
        });
    }

    Ok(RangeRequest::Bytes {
        offset: start,
        length: end - start + 1,
    })
}

/// Recover only the start offset of a range header, without bounds checks.
///
/// Used where the origin validates bounds itself. An empty header yields `0`.
///
/// # Errors
///
/// Returns [`RangeError::InvalidFormat`] if the header does not consist of
/// `bytes=` followed by exactly two dash-separated integers.
pub fn parse_start_offset(header: &str) -> Result<u64, RangeError> {
    if header.is_empty() {
        return Ok(0);
    }
    split_fields(header).map(|(start, _)| start)
}

fn split_fields(header: &str) -> Result<(u64, u64), RangeError> {
    let invalid = || RangeError::InvalidFormat(header.to_owned());

    let fields = header.strip_prefix(BYTES_PREFIX).ok_or_else(invalid)?;
    let (start, end) = fields.split_once('-').ok_or_else(invalid)?;

    // `u64::from_str` accepts a leading '+'; ranges must be plain digits.
    let field = |s: &str| -> Result<u64, RangeError> {
        if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
            return Err(invalid());
        }
        s.parse().map_err(|_| invalid())
    };

    Ok((field(start)?, field(end)?))
}

/// A parsed `Content-Range: bytes <start>-<end>/<total>` value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContentRange {
    pub start: u64,
    pub end: u64,
    /// `None` when the total is sent as `*`.
    pub total: Option<u64>,
}

impl ContentRange {
    /// Number of bytes covered (inclusive range), `None` if it does not fit
    /// in a `u64` or `start > end`.
    pub fn length(&self) -> Option<u64> {
        self.end.checked_sub(self.start)?.checked_add(1)
    }

    /// Format as a `Content-Range` header value.
    pub fn to_header(&self) -> String {
        match self.total {
            Some(total) => format!("bytes {}-{}/{}", self.start, self.end, total),
            None => format!("bytes {}-{}/*", self.start, self.end),
        }
    }
}

/// Parse an upstream `Content-Range` header of a `206` response.
///
/// Returns `None` for anything else, including the `bytes */<total>` form of
/// a `416` response (see [`parse_unsatisfied_total`]).
pub fn parse_content_range(value: &str) -> Option<ContentRange> {
    let rest = value.trim().strip_prefix("bytes ")?;
    let (range, total) = rest.split_once('/')?;
    let (start, end) = range.split_once('-')?;
    let start: u64 = start.trim().parse().ok()?;
    let end: u64 = end.trim().parse().ok()?;
    // `end` is inclusive, so `u64::MAX` would describe 2^64 bytes.
    if start > end || end == u64::MAX {
        return None;
    }
    let total = match total.trim() {
        "*" => None,
        t => {
            let t: u64 = t.parse().ok()?;
            if end >= t {
                return None;
            }
            Some(t)
        }
    };
    Some(ContentRange { start, end, total })
}

/// Total size from a `416` response's `Content-Range: bytes */<total>`.
pub fn parse_unsatisfied_total(value: &str) -> Option<u64> {
    value.trim().strip_prefix("bytes */")?.trim().parse().ok()
}
