//! Core traits for the dynip system
//!
//! This module defines the abstract interfaces that all implementations must follow.
//!
//! - [`IpSource`]: Probe and query an external IP-reporting service
//! - [`DnsProvider`]: Validate domains and update DNS records via provider APIs

pub mod dns_provider;
pub mod ip_source;

pub use dns_provider::{DnsProvider, DnsProviderFactory, RecordType};
pub use ip_source::{IpSource, IpVersion, SourceReport};
