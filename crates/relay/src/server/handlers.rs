//! Axum request handlers for all service endpoints.

use axum::{
    extract::{Path, State},
    http::{header, HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use common::protocol::{ErrorResponse, HealthResponse};
use common::RelayError;
use tracing::{debug, info_span, warn, Instrument};
use uuid::Uuid;

use super::state::AppState;
use crate::crypto::{iv_from_slice, ContentKey, Iv};
use crate::relay::relay;
use crate::source::{local::resolve_under, LocalSource, RemoteSource};

/// `GET /remote/*path` — relay `{UPSTREAM_BASE_URL}/{path}`.
///
/// The client's `Range` header is forwarded upstream verbatim.
pub async fn relay_remote(
    State(state): State<AppState>,
    Path(path): Path<String>,
    headers: HeaderMap,
) -> Response {
    let span = info_span!("relay", request_id = %Uuid::new_v4(), source = "remote");
    async move {
        match serve_remote(&state, &path, &headers).await {
            Ok(resp) => resp,
            Err(e) => error_response(&e),
        }
    }
    .instrument(span)
    .await
}

/// `GET /local/*path` — relay `{LOCAL_ROOT}/{path}`.
pub async fn relay_local(
    State(state): State<AppState>,
    Path(path): Path<String>,
    headers: HeaderMap,
) -> Response {
    let span = info_span!("relay", request_id = %Uuid::new_v4(), source = "local");
    async move {
        match serve_local(&state, &path, &headers).await {
            Ok(resp) => resp,
            Err(e) => error_response(&e),
        }
    }
    .instrument(span)
    .await
}

/// `GET /health` — liveness check reporting which sources are served.
pub async fn health(State(state): State<AppState>) -> Response {
    let body = HealthResponse {
        status: "ok".into(),
        remote_enabled: state.upstream_base_url.is_some(),
        local_enabled: state.local_root.is_some(),
    };
    (StatusCode::OK, Json(body)).into_response()
}

/// Catch-all 404 handler.
pub async fn not_found() -> impl IntoResponse {
    let err = ErrorResponse::new("not_found", "the requested resource does not exist");
    (StatusCode::NOT_FOUND, Json(err))
}

async fn serve_remote(
    state: &AppState,
    path: &str,
    headers: &HeaderMap,
) -> Result<Response, RelayError> {
    let base = state
        .upstream_base_url
        .as_deref()
        .ok_or_else(|| RelayError::NotFound("remote relay is not enabled".into()))?;
    let url = upstream_url(base, path)?;
    let (key, iv) = key_material(headers, state)?;
    let range = range_header(headers)?;

    relay(
        RemoteSource::new(state.client.clone(), url),
        &key,
        &iv,
        range,
        &state.content_type,
    )
    .await
}

async fn serve_local(
    state: &AppState,
    path: &str,
    headers: &HeaderMap,
) -> Result<Response, RelayError> {
    let root = state
        .local_root
        .as_deref()
        .ok_or_else(|| RelayError::NotFound("local relay is not enabled".into()))?;
    let file = resolve_under(root, path).ok_or_else(|| RelayError::NotFound(path.to_owned()))?;
    let (key, iv) = key_material(headers, state)?;
    let range = range_header(headers)?;

    let source = LocalSource::open_file(&file).await?;
    relay(source, &key, &iv, range, &state.content_type).await
}

// ---------------------------------------------------------------------------
// Request helpers
// ---------------------------------------------------------------------------

/// Append `path` to `base` segment by segment, percent-encoding each one.
fn upstream_url(base: &str, path: &str) -> Result<String, RelayError> {
    let segments: Vec<&str> = path.split('/').collect();
    if segments.iter().any(|s| s.is_empty() || *s == "." || *s == "..") {
        return Err(RelayError::NotFound(path.to_owned()));
    }

    let mut url = reqwest::Url::parse(base)
        .map_err(|e| RelayError::Internal(format!("upstream base URL: {e}")))?;
    url.path_segments_mut()
        .map_err(|_| RelayError::Internal("upstream base URL cannot be a base".into()))?
        .pop_if_empty()
        .extend(segments);
    Ok(url.into())
}

/// The client's `Range` header, or `""` when absent.
fn range_header(headers: &HeaderMap) -> Result<&str, RelayError> {
    match headers.get(header::RANGE) {
        Some(v) => v
            .to_str()
            .map_err(|_| RelayError::InvalidRangeFormat("non-ASCII Range header".into())),
        None => Ok(""),
    }
}

/// Decode the per-request key and IV headers.
fn key_material(headers: &HeaderMap, state: &AppState) -> Result<(ContentKey, Iv), RelayError> {
    let key = ContentKey::new(decode_header(headers, &state.key_header_name)?)?;
    let iv = iv_from_slice(&decode_header(headers, &state.iv_header_name)?)?;
    Ok((key, iv))
}

fn decode_header(headers: &HeaderMap, name: &str) -> Result<Vec<u8>, RelayError> {
    let value = headers
        .get(name)
        .ok_or_else(|| RelayError::BadRequest(format!("missing {name} header")))?;
    let text = value
        .to_str()
        .map_err(|_| RelayError::BadRequest(format!("{name} header is not ASCII")))?;
    STANDARD
        .decode(text.trim())
        .map_err(|_| RelayError::BadRequest(format!("{name} header is not valid base64")))
}

/// Render a [`RelayError`] as a JSON error response.
fn error_response(err: &RelayError) -> Response {
    if err.is_client_error() {
        debug!(error = %err, "rejected request");
    } else {
        warn!(error = %err, "relay failed");
    }

    let status =
        StatusCode::from_u16(err.http_status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    let mut resp = (status, Json(ErrorResponse::from(err))).into_response();
    if let RelayError::RangeOutOfBounds { size, .. } = err {
        if let Ok(v) = HeaderValue::from_str(&format!("bytes */{size}")) {
            resp.headers_mut().insert(header::CONTENT_RANGE, v);
        }
    }
    resp
}
