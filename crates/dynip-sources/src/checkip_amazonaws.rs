//! checkip.amazonaws.com detection source
//!
//! IPv4 only; the service has no IPv6 endpoint.

use std::time::Duration;

use async_trait::async_trait;
use dynip_core::traits::{IpSource, SourceReport};

use crate::extract::ipv4_from_response;
use crate::http::{get_text, probe_url};

const URL: &str = "https://checkip.amazonaws.com";

pub struct CheckIpAwsSource;

#[async_trait]
impl IpSource for CheckIpAwsSource {
    fn name(&self) -> &'static str {
        "checkip.amazonaws.com"
    }

    fn priority(&self) -> u8 {
        5
    }

    async fn probe(&self, client: &reqwest::Client, timeout: Duration) -> bool {
        probe_url(client, URL, timeout).await
    }

    async fn fetch(&self, client: &reqwest::Client, timeout: Duration) -> SourceReport {
        let ipv4 = match get_text(client, URL, timeout).await {
            Some(body) => ipv4_from_response(&body),
            None => None,
        };

        SourceReport { ipv4, ipv6: None }
    }
}
