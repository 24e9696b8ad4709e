//! icanhazip.com detection source

use std::time::Duration;

use async_trait::async_trait;
use dynip_core::traits::{IpSource, SourceReport};

use crate::extract::{ipv4_from_response, ipv6_from_response};
use crate::http::{get_text, probe_url};

const IPV4_URL: &str = "https://ipv4.icanhazip.com";
const IPV6_URL: &str = "https://ipv6.icanhazip.com";

pub struct ICanHazIpSource;

#[async_trait]
impl IpSource for ICanHazIpSource {
    fn name(&self) -> &'static str {
        "icanhazip.com"
    }

    fn priority(&self) -> u8 {
        4
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
