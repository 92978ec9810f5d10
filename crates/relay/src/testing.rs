//! Fixtures shared by unit tests: a known plaintext, its full-stream CTR
//! ciphertext, and an in-process upstream origin that honours byte ranges.

use axum::{
    body::Body,
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use tokio::net::TcpListener;

use crate::crypto::{ContentKey, Iv, Keystream};
use crate::range::{self, RangeRequest};

pub const PLAINTEXT: &[u8] =
    b"HelloSecureStreamingWorld! Range-aware relays keep the CTR keystream aligned to every served byte.";

pub const CIPHERTEXT_LEN: u64 = PLAINTEXT.len() as u64;

pub const KEY: &[u8; 32] = b"examplekey123456examplekey123456";

pub const IV: Iv = [
    0x00, 0x01, 0x02, 0x03, 0x04, 0x05, 0x06, 0x07, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0xf0,
];

pub fn key() -> ContentKey {
    ContentKey::new(KEY.to_vec()).unwrap()
}

/// `PLAINTEXT` encrypted as one unbroken CTR stream from offset 0.
pub fn ciphertext() -> Vec<u8> {
    let mut buf = PLAINTEXT.to_vec();
    Keystream::new(&key(), &IV).unwrap().apply(&mut buf);
    buf
}

/// Origin serving `ciphertext()` at `/blob` with single-range support.
pub fn ranged_upstream() -> Router {
    Router::new().route("/blob", get(serve_ranged))
}

async fn serve_ranged(headers: HeaderMap) -> Response {
    let data = ciphertext();
    let size = data.len() as u64;
    let range_header = headers
        .get(header::RANGE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");

    match range::parse(range_header, size) {
        Ok(RangeRequest::Whole) => data.into_response(),
        Ok(RangeRequest::Bytes { offset, length }) => {
            let (start, end) = (offset as usize, (offset + length) as usize);
            (
                StatusCode::PARTIAL_CONTENT,
                [(
                    header::CONTENT_RANGE,
                    format!("bytes {}-{}/{}", start, end - 1, size),
                )],
                data[start..end].to_vec(),
            )
                .into_response()
        }
        Err(_) => (
            StatusCode::RANGE_NOT_SATISFIABLE,
            [(header::CONTENT_RANGE, format!("bytes */{size}"))],
        )
            .into_response(),
    }
}

/// Origin serving `ciphertext()` at `/blob` as a chunked body, so responses
/// carry no `Content-Length`.
pub fn streamed_upstream() -> Router {
    Router::new().route("/blob", get(serve_streamed))
}

async fn serve_streamed(headers: HeaderMap) -> Response {
    let data = ciphertext();
    let size = data.len() as u64;
    let range_header = headers
        .get(header::RANGE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");

    let (status, start, end) = match range::parse(range_header, size) {
        Ok(RangeRequest::Whole) => (StatusCode::OK, 0, data.len()),
        Ok(RangeRequest::Bytes { offset, length }) => (
            StatusCode::PARTIAL_CONTENT,
            offset as usize,
            (offset + length) as usize,
        ),
        Err(_) => return StatusCode::RANGE_NOT_SATISFIABLE.into_response(),
    };
    let chunks: Vec<Result<Vec<u8>, std::io::Error>> = data[start..end]
        .chunks(7)
        .map(|c| Ok(c.to_vec()))
        .collect();
    let mut response = Response::new(Body::from_stream(futures::stream::iter(chunks)));
    *response.status_mut() = status;
    if status == StatusCode::PARTIAL_CONTENT {
        let value = format!("bytes {}-{}/{}", start, end - 1, size);
        response
            .headers_mut()
            .insert(header::CONTENT_RANGE, value.parse().unwrap());
    }
    response
}

/// Serve `app` on an ephemeral loopback port and return its base URL.
pub async fn spawn_upstream(app: Router) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}")
}
