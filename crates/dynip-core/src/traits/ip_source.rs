// # IP Source Trait
//
// Defines the interface for external public-IP detection services.
//
// ## Implementations
//
// One type per service, collected in the `dynip-sources` crate:
// ident.me, icanhazip.com, checkip.amazonaws.com, ipify.org, and others.
//
// ## Usage
//
// ```rust,ignore
// use dynip_core::traits::{IpSource, IpVersion};
// use std::time::Duration;
//
// #[tokio::main]
// async fn main() {
//     let source = /* IpSource implementation */;
//     let client = reqwest::Client::new();
//
//     if source.probe(&client, Duration::from_secs(10)).await {
//         let report = source.fetch(&client, Duration::from_secs(10)).await;
//         println!("{}: {:?}", source.name(), report.get(IpVersion::V4));
//     }
// }
// ```

use async_trait::async_trait;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};
use std::time::Duration;

/// IP version (v4 or v6)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IpVersion {
    V4,
    V6,
}

impl IpVersion {
    /// Check whether an address belongs to this family
    pub fn matches(&self, ip: IpAddr) -> bool {
        match self {
            IpVersion::V4 => ip.is_ipv4(),
            IpVersion::V6 => ip.is_ipv6(),
        }
    }
}

impl std::fmt::Display for IpVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            IpVersion::V4 => write!(f, "IPv4"),
            IpVersion::V6 => write!(f, "IPv6"),
        }
    }
}

/// The addresses one source reported during a single fetch.
///
/// Absent or malformed data is `None`, never an error: a source that cannot
/// answer for a family simply contributes nothing for that family.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SourceReport {
    /// IPv4 address reported by the service, if any
    pub ipv4: Option<Ipv4Addr>,
    /// IPv6 address reported by the service, if any
    pub ipv6: Option<Ipv6Addr>,
}

impl SourceReport {
    /// A report with no addresses
    pub fn empty() -> Self {
        Self::default()
    }

    /// The reported address for the requested family, if any
    pub fn get(&self, version: IpVersion) -> Option<IpAddr> {
        match version {
            IpVersion::V4 => self.ipv4.map(IpAddr::V4),
            IpVersion::V6 => self.ipv6.map(IpAddr::V6),
        }
    }

    /// True if the source reported nothing for either family
    pub fn is_empty(&self) -> bool {
        self.ipv4.is_none() && self.ipv6.is_none()
    }
}

/// Trait for IP-reporting source implementations
///
/// Each implementation is a fixed capability bound at construction: base
/// URL(s), request method, and a static priority reflecting how trustworthy
/// and responsive the service has proven in practice.
///
/// # Contract
///
/// - `probe` and `fetch` never panic and never return an error. All
///   transport and parsing failures are swallowed: `probe` maps them to
///   `false`, `fetch` maps them to an empty [`SourceReport`].
/// - Sources hold no mutable state. Multi-step protocols (e.g. fetching a
///   page to extract a dynamic endpoint and a one-time nonce) keep all
///   intermediate state local to a single `fetch` call and restart from
///   step one on the next cycle.
/// - The HTTP client is injected; sources never own connection-pool
///   lifecycle and never spawn tasks.
///
/// The [`SourceManager`](crate::manager::SourceManager) additionally bounds
/// every call with `tokio::time::timeout`, so a hung service can never
/// stall a discovery or resolve cycle past the configured limit.
#[async_trait]
pub trait IpSource: Send + Sync {
    /// Unique identifier of the service (e.g. "ident.me")
    fn name(&self) -> &'static str;

    /// Static trust ranking, 0-9. Lower value = more trusted.
    ///
    /// Never changes after construction.
    fn priority(&self) -> u8;

    /// Check if the service is currently reachable.
    ///
    /// Issues a lightweight request; returns `true` only on a successful,
    /// well-formed response.
    async fn probe(&self, client: &reqwest::Client, timeout: Duration) -> bool;

    /// Retrieve the address(es) the service reports for this host.
    async fn fetch(&self, client: &reqwest::Client, timeout: Duration) -> SourceReport;
}
