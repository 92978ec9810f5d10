//! Shared application state injected into every Axum handler.

use std::path::PathBuf;
use std::sync::Arc;

use reqwest::Client;

use crate::config::Config;

/// Application state shared across all request handlers.
///
/// Read-only after startup. All fields are cheaply cloneable so that Axum can
/// clone the state for each request; no per-request data lives here.
#[derive(Clone, Debug)]
pub struct AppState {
    /// Upstream HTTP client with its own pool and timeouts.
    pub client: Client,
    /// Origin base URL for `/remote`, if enabled.
    pub upstream_base_url: Option<Arc<String>>,
    /// Directory for `/local`, if enabled.
    pub local_root: Option<Arc<PathBuf>>,
    /// `Content-Type` of relayed bodies.
    pub content_type: Arc<String>,
    /// Header carrying the base64 AES key.
    pub key_header_name: Arc<String>,
    /// Header carrying the base64 IV.
    pub iv_header_name: Arc<String>,
}

impl AppState {
    /// Build state from validated configuration and an upstream client.
    pub fn new(cfg: &Config, client: Client) -> Self {
        let non_empty = |v: &Option<String>| {
            v.as_deref()
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_owned)
        };
        Self {
            client,
            upstream_base_url: non_empty(&cfg.upstream_base_url).map(Arc::new),
            local_root: non_empty(&cfg.local_root).map(|p| Arc::new(PathBuf::from(p))),
            content_type: Arc::new(cfg.content_type.clone()),
            key_header_name: Arc::new(cfg.key_header_name.clone()),
            iv_header_name: Arc::new(cfg.iv_header_name.clone()),
        }
    }
}
