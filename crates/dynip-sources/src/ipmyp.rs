//! ipmyp.ir detection source
//!
//! Two-step AJAX protocol: the landing page embeds a dynamic endpoint URL
//! and a one-time nonce in the attributes of its widget root element; the
//! address comes from a follow-up POST authenticated by that nonce.
//!
//! The nonce is short-lived, so both steps run inside a single `fetch` —
//! nothing is cached between cycles, and any failure restarts the
//! negotiation from the landing page on the next cycle.

use std::net::Ipv4Addr;
use std::sync::LazyLock;
use std::time::Duration;

use async_trait::async_trait;
use dynip_core::traits::{IpSource, SourceReport};
use regex::Regex;
use serde_json::Value;
use tracing::debug;

use crate::extract::ipv4_from_response;
use crate::http::{get_text, probe_url};

const URL: &str = "https://ipmyp.ir";
const AJAX_ACTION: &str = "ipvj_lite_lookup";

static ROOT_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?i)<div[^>]*id="ipvj-lite-root"[^>]*>"#).unwrap());

static AJAX_ATTR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"data-ajax="([^"]+)""#).unwrap());

static NONCE_ATTR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"data-nonce="([^"]+)""#).unwrap());

/// Locate the widget root element and pull out its AJAX endpoint and nonce.
/// Attribute order within the tag does not matter.
fn parse_ajax_params(html: &str) -> Option<(String, String)> {
    let root = ROOT_PATTERN.find(html)?.as_str();

    let ajax_url = AJAX_ATTR.captures(root)?[1].to_string();
    let nonce = NONCE_ATTR.captures(root)?[1].to_string();

    Some((ajax_url, nonce))
}

/// Pull the reported address out of the AJAX answer
/// (`{"success": true, "data": {"ip": "..."}}`).
fn parse_ajax_answer(body: &str) -> Option<Ipv4Addr> {
    let answer: Value = serde_json::from_str(body).ok()?;

    if answer["success"] != Value::Bool(true) {
        return None;
    }

    answer["data"]["ip"]
        .as_str()
        .and_then(ipv4_from_response)
}

pub struct IpMypSource;

impl IpMypSource {
    async fn lookup(&self, client: &reqwest::Client, timeout: Duration) -> Option<Ipv4Addr> {
        // Step 1: landing page, extract dynamic endpoint + nonce
        let html = get_text(client, URL, timeout).await?;
        let (ajax_url, nonce) = parse_ajax_params(&html)?;

        // Step 2: the nonce-authenticated lookup. Omitting the "ip" field
        // makes the service report the caller's own address.
        let response = client
            .post(&ajax_url)
            .form(&[("action", AJAX_ACTION), ("nonce", nonce.as_str())])
            .header("X-Requested-With", "XMLHttpRequest")
            .header("Referer", "https://ipmyp.ir/")
            .header("Origin", "https://ipmyp.ir")
            .timeout(timeout)
            .send()
            .await
            .ok()?;

        if !response.status().is_success() {
            debug!(status = %response.status(), "ajax lookup rejected");
            return None;
        }

        let body = response.text().await.ok()?;
        parse_ajax_answer(&body)
    }
}

#[async_trait]
impl IpSource for IpMypSource {
    fn name(&self) -> &'static str {
        "ipmyp.ir"
    }

    fn priority(&self) -> u8 {
        1
    }

    async fn probe(&self, client: &reqwest::Client, timeout: Duration) -> bool {
        probe_url(client, URL, timeout).await
    }

    async fn fetch(&self, client: &reqwest::Client, timeout: Duration) -> SourceReport {
        SourceReport {
            ipv4: self.lookup(client, timeout).await,
            ipv6: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_endpoint_and_nonce() {
        let html = r#"<div id="ipvj-lite-root" data-ajax="https://ipmyp.ir/wp-admin/admin-ajax.php" data-nonce="ab12cd34">"#;
        assert_eq!(
            parse_ajax_params(html),
            Some((
                "https://ipmyp.ir/wp-admin/admin-ajax.php".to_string(),
                "ab12cd34".to_string()
            ))
        );
    }

    #[test]
    fn attribute_order_is_irrelevant() {
        let html = r#"<body><div class="w" data-nonce="n0" data-ajax="https://x/a.php" id="ipvj-lite-root"></div></body>"#;
        assert_eq!(
            parse_ajax_params(html),
            Some(("https://x/a.php".to_string(), "n0".to_string()))
        );
    }

    #[test]
    fn missing_root_element_yields_none() {
        assert_eq!(parse_ajax_params("<div id=\"other\"></div>"), None);
    }

    #[test]
    fn missing_nonce_yields_none() {
        let html = r#"<div id="ipvj-lite-root" data-ajax="https://x/a.php">"#;
        assert_eq!(parse_ajax_params(html), None);
    }

    #[test]
    fn parses_successful_answer() {
        let body = r#"{"success": true, "data": {"ip": "203.0.113.5"}}"#;
        assert_eq!(parse_ajax_answer(body), Some(Ipv4Addr::new(203, 0, 113, 5)));
    }

    #[test]
    fn unsuccessful_answer_yields_none() {
        assert_eq!(parse_ajax_answer(r#"{"success": false}"#), None);
        assert_eq!(parse_ajax_answer("not json"), None);
    }

    #[test]
    fn invalid_address_in_answer_rejected() {
        let body = r#"{"success": true, "data": {"ip": "not an ip"}}"#;
        assert_eq!(parse_ajax_answer(body), None);
    }
}
