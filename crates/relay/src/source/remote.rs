//! [`RemoteSource`]: a resource fetched over HTTP with the client's `Range`
//! forwarded upstream.
//!
//! The upstream origin validates bounds. Its response decides what is served:
//!
//! | Upstream answer                    | Served slice                                   |
//! |------------------------------------|------------------------------------------------|
//! | `206` + `Content-Range` (ranged)   | partial, total from `Content-Range`             |
//! | `206` starting at 0 (unranged)     | not partial, served as `200`                    |
//! | other `2xx`                        | whole resource from offset 0, total = length    |
//! | `404`                              | [`RelayError::NotFound`]                        |
//! | `416`                              | [`RelayError::RangeOutOfBounds`] when sized     |
//! | anything else                      | [`RelayError::UpstreamStatus`]                  |

use std::io;

use common::RelayError;
use futures::TryStreamExt;
use reqwest::header::{CONTENT_RANGE, RANGE};
use reqwest::{Client, StatusCode};
use tokio_util::io::StreamReader;
use tracing::{debug, warn};

use super::{ByteSource, OpenedSource, SourceSlice};
use crate::range::{self, parse_content_range, parse_unsatisfied_total};

/// An HTTP resource fetched with an injected, explicitly configured client.
#[derive(Debug, Clone)]
pub struct RemoteSource {
    client: Client,
    url: String,
}

impl RemoteSource {
    /// Fetch `url` with `client` when opened.
    pub fn new(client: Client, url: impl Into<String>) -> Self {
        Self {
            client,
            url: url.into(),
        }
    }
}

impl ByteSource for RemoteSource {
    fn kind(&self) -> &'static str {
        "remote"
    }

    async fn open(self, range_header: &str) -> Result<OpenedSource, RelayError> {
        // Reject malformed ranges before touching the network.
        let requested_offset = range::parse_start_offset(range_header)?;

        let mut request = self.client.get(&self.url);
        if !range_header.is_empty() {
            request = request.header(RANGE, range_header);
        }

        let response = request
            .send()
            .await
            .map_err(|e| RelayError::Transport(format!("upstream fetch failed: {e}")))?;

        let status = response.status();
        let content_range = response
            .headers()
            .get(CONTENT_RANGE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_owned);
        debug!(
            status = status.as_u16(),
            content_range = content_range.as_deref().unwrap_or(""),
            content_length = ?response.content_length(),
            "upstream responded"
        );

        let slice = if status == StatusCode::PARTIAL_CONTENT {
            let served = content_range
                .as_deref()
                .and_then(parse_content_range)
                .ok_or_else(|| {
                    RelayError::Transport("upstream 206 without a valid Content-Range".into())
                })?;
            // The keystream is positioned from the requested offset (0 when
            // unranged); bytes starting anywhere else would decrypt to garbage.
            if served.start != requested_offset {
                return Err(RelayError::Transport(format!(
                    "upstream served bytes from {} but {} was requested",
                    served.start, requested_offset
                )));
            }
            let length = match response.content_length() {
                Some(n) => n,
                None => served.length().ok_or_else(|| {
                    RelayError::Transport("upstream Content-Range length overflows".into())
                })?,
            };
            let partial = !range_header.is_empty();
            if !partial {
                warn!(
                    content_range = content_range.as_deref().unwrap_or(""),
                    "upstream sent 206 to an unranged request; relaying as 200"
                );
            }
            SourceSlice {
                offset: requested_offset,
                length: Some(length),
                total: served.total,
                partial,
            }
        } else if status.is_success() {
            if !range_header.is_empty() {
                warn!(range = range_header, "upstream ignored range; relaying whole resource");
            }
            SourceSlice::whole(response.content_length())
        } else if status == StatusCode::NOT_FOUND {
            return Err(RelayError::NotFound(self.url));
        } else if status == StatusCode::RANGE_NOT_SATISFIABLE {
            return Err(match content_range.as_deref().and_then(parse_unsatisfied_total) {
                Some(size) => RelayError::RangeOutOfBounds {
                    range: range_header.to_owned(),
                    size,
                },
                None => RelayError::UpstreamStatus(status.as_u16()),
            });
        } else {
            return Err(RelayError::UpstreamStatus(status.as_u16()));
        };

        let body = response
            .bytes_stream()
            .map_err(|e| io::Error::new(io::ErrorKind::Other, e));

        Ok(OpenedSource {
            slice,
            reader: Box::pin(StreamReader::new(body)),
        })
    }
}
