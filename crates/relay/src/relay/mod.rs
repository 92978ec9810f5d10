//! Range-aware relay: source → keystream XOR → HTTP response body.
//!
//! [`relay`] opens a [`ByteSource`], positions a CTR keystream at the first
//! byte the source actually serves, fixes the status line and headers, and
//! only then attaches the streaming body. Nothing is buffered beyond a single
//! read chunk and nothing is retried: a source read error ends the body
//! stream with that error, which aborts the response.

pub mod reader;

pub use reader::KeystreamReader;

use axum::{
    body::Body,
    http::{header, HeaderMap, HeaderValue, StatusCode},
    response::Response,
};
use common::RelayError;
use tokio_util::io::ReaderStream;
use tracing::info;

use crate::crypto::{ContentKey, Iv, Keystream};
use crate::range::ContentRange;
use crate::source::{ByteSource, OpenedSource, SourceSlice};

/// Relay `source` to the client, XORing it with the keystream of `key`/`iv`.
///
/// `range_header` is the client's raw `Range` value (empty when absent). The
/// reply is `206` with `Content-Range` when the source serves a partial
/// slice, `200` otherwise.
///
/// # Errors
///
/// Any source, range or key error is returned before a response exists, so
/// no status or body byte has been committed when this fails.
pub async fn relay<S: ByteSource>(
    source: S,
    key: &ContentKey,
    iv: &Iv,
    range_header: &str,
    content_type: &str,
) -> Result<Response, RelayError> {
    let kind = source.kind();
    let OpenedSource { slice, reader } = source.open(range_header).await?;

    let keystream = Keystream::at_offset(key, iv, slice.offset)?;
    let status = if slice.partial {
        StatusCode::PARTIAL_CONTENT
    } else {
        StatusCode::OK
    };
    let headers = response_headers(&slice, content_type)?;

    info!(
        source = kind,
        offset = slice.offset,
        length = ?slice.length,
        total = ?slice.total,
        status = status.as_u16(),
        "relaying"
    );

    let body = Body::from_stream(ReaderStream::new(KeystreamReader::new(reader, keystream)));
    let mut response = Response::new(body);
    *response.status_mut() = status;
    *response.headers_mut() = headers;
    Ok(response)
}

/// Response metadata for a served slice.
fn response_headers(slice: &SourceSlice, content_type: &str) -> Result<HeaderMap, RelayError> {
    let mut headers = HeaderMap::new();
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_str(content_type)
            .map_err(|_| RelayError::Internal(format!("invalid content type {content_type:?}")))?,
    );
    headers.insert(header::ACCEPT_RANGES, HeaderValue::from_static("bytes"));

    if let Some(length) = slice.length {
        headers.insert(header::CONTENT_LENGTH, HeaderValue::from(length));
    }

    if slice.partial {
        let length = slice.length.filter(|&n| n > 0).ok_or_else(|| {
            RelayError::Internal("partial slice without a known, non-zero length".into())
        })?;
        let end = slice.offset.checked_add(length - 1).ok_or_else(|| {
            RelayError::Transport(format!(
                "served range of {length} bytes at {} overflows",
                slice.offset
            ))
        })?;
        let range = ContentRange {
            start: slice.offset,
            end,
            total: slice.total,
        };
        headers.insert(
            header::CONTENT_RANGE,
            HeaderValue::from_str(&range.to_header())
                .map_err(|e| RelayError::Internal(e.to_string()))?,
        );
    }

    Ok(headers)
}
