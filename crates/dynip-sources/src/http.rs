//! Shared HTTP helpers for source implementations
//!
//! Sources never surface transport errors: a failed or non-2xx response is
//! `false`/`None` and the manager moves on.

use std::time::Duration;

use tracing::debug;

/// Lightweight reachability check against one URL
pub(crate) async fn probe_url(client: &reqwest::Client, url: &str, timeout: Duration) -> bool {
    match client.get(url).timeout(timeout).send().await {
        Ok(response) => response.status().is_success(),
        Err(e) => {
            debug!(url, error = %e, "probe failed");
            false
        }
    }
}

/// Fetch one URL's body as text, or `None` on any failure
pub(crate) async fn get_text(
    client: &reqwest::Client,
    url: &str,
    timeout: Duration,
) -> Option<String> {
    let response = match client.get(url).timeout(timeout).send().await {
        Ok(response) => response,
        Err(e) => {
            debug!(url, error = %e, "request failed");
            return None;
        }
    };

    if !response.status().is_success() {
        debug!(url, status = %response.status(), "unexpected status");
        return None;
    }

    response.text().await.ok()
}
