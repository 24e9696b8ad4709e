//! ipify.org detection source
//!
//! JSON API with dedicated per-family endpoints; answers `{"ip": "..."}`.

use std::time::Duration;

use async_trait::async_trait;
use dynip_core::traits::{IpSource, SourceReport};
use serde::Deserialize;

use crate::extract::{ipv4_from_response, ipv6_from_response};
use crate::http::{get_text, probe_url};

const IPV4_URL: &str = "https://api.ipify.org?format=json";
const IPV6_URL: &str = "https://api6.ipify.org?format=json";

#[derive(Deserialize)]
struct IpifyAnswer {
    ip: String,
}

fn ip_field(body: &str) -> Option<String> {
    serde_json::from_str::<IpifyAnswer>(body).ok().map(|a| a.ip)
}

pub struct IpifySource;

#[async_trait]
impl IpSource for IpifySource {
    fn name(&self) -> &'static str {
        "ipify.org"
    }

    fn priority(&self) -> u8 {
        3
    }

    async fn probe(&self, client: &reqwest::Client, timeout: Duration) -> bool {
        probe_url(client, IPV4_URL, timeout).await
    }

    async fn fetch(&self, client: &reqwest::Client, timeout: Duration) -> SourceReport {
        let ipv4 = match get_text(client, IPV4_URL, timeout).await {
            Some(body) => ip_field(&body).and_then(|ip| ipv4_from_response(&ip)),
            None => None,
        };
        let ipv6 = match get_text(client, IPV6_URL, timeout).await {
            Some(body) => ip_field(&body).and_then(|ip| ipv6_from_response(&ip)),
            None => None,
        };

        SourceReport { ipv4, ipv6 }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_json_answer() {
        assert_eq!(
            ip_field(r#"{"ip":"203.0.113.5"}"#),
            Some("203.0.113.5".to_string())
        );
    }

    #[test]
    fn malformed_json_yields_none() {
        assert_eq!(ip_field("<html>busy</html>"), None);
    }
}
