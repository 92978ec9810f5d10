//! Construction of the injectable upstream HTTP client.

use anyhow::{Context, Result};
use reqwest::Client;

use crate::config::Config;

/// Build the client used for every `/remote` fetch.
///
/// Connection pooling and timeouts come from configuration; no process-wide
/// default client is used. The overall timeout bounds the whole upstream
/// exchange, body included.
///
/// # Errors
///
/// Returns an error if the TLS backend cannot be initialised.
pub fn build_client(cfg: &Config) -> Result<Client> {
    Client::builder()
        .connect_timeout(cfg.upstream_connect_timeout())
        .timeout(cfg.upstream_timeout())
        .pool_max_idle_per_host(cfg.upstream_pool_max_idle_per_host)
        .user_agent(concat!("ctr-relay/", env!("CARGO_PKG_VERSION")))
        .build()
        .context("failed to build upstream HTTP client")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::test_config;

    #[test]
    fn builds_from_config() {
        assert!(build_client(&test_config()).is_ok());
    }
}
