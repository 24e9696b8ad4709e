//! ipnumberia.com detection source
//!
//! Scrapes the service's HTML page. The address appears either in a
//! `<div class="ip">` element or in a table cell; the page only shows IPv4.

use std::net::Ipv4Addr;
use std::sync::LazyLock;
use std::time::Duration;

use async_trait::async_trait;
use dynip_core::traits::{IpSource, SourceReport};
use regex::Regex;

use crate::extract::ipv4_from_response;
use crate::http::{get_text, probe_url};

const URL: &str = "https://ipnumberia.com";

static DIV_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"<div\s+class="ip">([0-9]{1,3}\.[0-9]{1,3}\.[0-9]{1,3}\.[0-9]{1,3})</div>"#)
        .unwrap()
});

static CELL_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"<td>([0-9]{1,3}\.[0-9]{1,3}\.[0-9]{1,3}\.[0-9]{1,3})</td>").unwrap()
});

/// Pull the reported address out of the page, preferring the more specific
/// `<div class="ip">` marker over bare table cells.
fn parse_page(html: &str) -> Option<Ipv4Addr> {
    for pattern in [&*DIV_PATTERN, &*CELL_PATTERN] {
        if let Some(captures) = pattern.captures(html)
            && let Some(ip) = ipv4_from_response(&captures[1])
        {
            return Some(ip);
        }
    }
    None
}

pub struct IpNumberiaSource;

#[async_trait]
impl IpSource for IpNumberiaSource {
    fn name(&self) -> &'static str {
        "ipnumberia.com"
    }

    fn priority(&self) -> u8 {
        0
    }

    async fn probe(&self, client: &reqwest::Client, timeout: Duration) -> bool {
        probe_url(client, URL, timeout).await
    }

    async fn fetch(&self, client: &reqwest::Client, timeout: Duration) -> SourceReport {
        let ipv4 = match get_text(client, URL, timeout).await {
            Some(html) => parse_page(&html),
            None => None,
        };

        SourceReport { ipv4, ipv6: None }
    }
}
