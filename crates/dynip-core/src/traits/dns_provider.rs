// # DNS Provider Trait
//
// Defines the interface for validating domains and updating address records
// via provider APIs.
//
// ## Implementations
//
// - ArvanCloud: `dynip-provider-arvan` crate
// - Future: Cloudflare, Route53, DigitalOcean, etc.
//
// ## Usage
//
// ```rust,ignore
// use dynip_core::traits::{DnsProvider, RecordType};
//
// #[tokio::main]
// async fn main() -> anyhow::Result<()> {
//     let provider = /* DnsProvider implementation */;
//
//     provider.validate_domain("example.com").await?;
//     provider
//         .update_record(
//             "example.com",
//             "www",
//             RecordType::A,
//             "203.0.113.5".parse()?,
//         )
//         .await?;
//
//     Ok(())
// }
// ```

use async_trait::async_trait;
use std::net::IpAddr;

/// Address record type, derived solely from the resolved address's family
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordType {
    /// A record (IPv4)
    A,
    /// AAAA record (IPv6)
    Aaaa,
}

impl RecordType {
    /// Derive the record type from an address
    pub fn for_ip(ip: IpAddr) -> Self {
        match ip {
            IpAddr::V4(_) => RecordType::A,
            IpAddr::V6(_) => RecordType::Aaaa,
        }
    }

    /// Wire name of the record type ("A" / "AAAA")
    pub fn as_str(&self) -> &'static str {
        match self {
            RecordType::A => "A",
            RecordType::Aaaa => "AAAA",
        }
    }
}

impl std::fmt::Display for RecordType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Trait for DNS provider implementations
///
/// Implementations handle the specifics of each provider's API. They are
/// isolated, stateless, single-shot integrations: one logical API operation
/// per invocation, full error propagation to the caller, no retry or
/// backoff logic (owned by the [`UpdateEngine`](crate::engine::UpdateEngine)),
/// and no background tasks.
///
/// # Thread Safety
///
/// Implementations must be thread-safe and usable across async tasks.
#[async_trait]
pub trait DnsProvider: Send + Sync {
    /// Check that the domain is known to the provider.
    ///
    /// # Returns
    ///
    /// - `Ok(())`: The domain exists under this account
    /// - `Err(Error)`: The domain is unknown or the request failed
    async fn validate_domain(&self, domain: &str) -> Result<(), crate::Error>;

    /// Update a single address record with a new IP.
    ///
    /// # Parameters
    ///
    /// - `domain`: The zone the record belongs to (e.g. "example.com")
    /// - `record`: The record name within the zone (e.g. "www")
    /// - `record_type`: A or AAAA, derived from the address family
    /// - `new_ip`: The new address
    ///
    /// # Idempotency
    ///
    /// Calling this repeatedly with the same address must be safe; a record
    /// that already carries the address results in no provider-side change.
    async fn update_record(
        &self,
        domain: &str,
        record: &str,
        record_type: RecordType,
        new_ip: IpAddr,
    ) -> Result<(), crate::Error>;

    /// Get the provider name (for logging/debugging)
    fn provider_name(&self) -> &'static str;
}

/// Helper trait for constructing DNS providers from configuration
pub trait DnsProviderFactory: Send + Sync {
    /// Create a DnsProvider instance from configuration
    fn create(
        &self,
        config: &crate::config::ProviderConfig,
    ) -> Result<Box<dyn DnsProvider>, crate::Error>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_type_follows_address_family() {
        let v4: IpAddr = "203.0.113.5".parse().unwrap();
        let v6: IpAddr = "2001:db8::1".parse().unwrap();

        assert_eq!(RecordType::for_ip(v4), RecordType::A);
        assert_eq!(RecordType::for_ip(v6), RecordType::Aaaa);
        assert_eq!(RecordType::A.as_str(), "A");
        assert_eq!(RecordType::Aaaa.as_str(), "AAAA");
    }
}
