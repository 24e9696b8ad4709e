//! ident.me detection source
//!
//! Plain-text service with dedicated per-family endpoints.

use std::time::Duration;

use async_trait::async_trait;
use dynip_core::traits::{IpSource, SourceReport};

use crate::extract::{ipv4_from_response, ipv6_from_response};
use crate::http::{get_text, probe_url};

const IPV4_URL: &str = "https://v4.ident.me";
const IPV6_URL: &str = "https://v6.ident.me";

pub struct IdentMeSource;

#[async_trait]
impl IpSource for IdentMeSource {
    fn name(&self) -> &'static str {
        "ident.me"
    }

    fn priority(&self) -> u8 {
        2
    }

    async fn probe(&self, client: &reqwest::Client, timeout: Duration) -> bool {
        probe_url(client, IPV4_URL, timeout).await
    }

    async fn fetch(&self, client: &reqwest::Client, timeout: Duration) -> SourceReport {
        let ipv4 = match get_text(client, IPV4_URL, timeout).await {
            Some(body) => ipv4_from_response(&body),
            None => None,
        };
        let ipv6 = match get_text(client, IPV6_URL, timeout).await {
            Some(body) => ipv6_from_response(&body),
            None => None,
        };

        SourceReport { ipv4, ipv6 }
    }
}
