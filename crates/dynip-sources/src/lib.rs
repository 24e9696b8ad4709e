// # dynip-sources
//
// Built-in public-IP detection sources for the dynip system.
//
// ## Purpose
//
// One module per external service, each implementing the `IpSource`
// probe/fetch contract from `dynip-core`. Priorities encode how
// trustworthy and responsive each service has proven in practice
// (0 = most trusted).
//
// ## Registry
//
// The source set is a fixed compile-time table: [`REGISTRY`] maps each
// service identifier to its constructor, in registration order. The
// `SourceManager` breaks priority ties by this order, so reordering the
// table is a behavior change.

use std::sync::Arc;

use dynip_core::traits::IpSource;

pub mod extract;
mod http;

mod checkip_amazonaws;
mod icanhazip;
mod ident_me;
mod ipify;
mod ipmyp;
mod ipnumberia;

pub use checkip_amazonaws::CheckIpAwsSource;
pub use icanhazip::ICanHazIpSource;
pub use ident_me::IdentMeSource;
pub use ipify::IpifySource;
pub use ipmyp::IpMypSource;
pub use ipnumberia::IpNumberiaSource;

/// One registry row: service identifier and constructor
pub struct SourceEntry {
    /// Unique service identifier (matches `IpSource::name`)
    pub name: &'static str,
    /// Constructor for the source
    pub build: fn() -> Arc<dyn IpSource>,
}

/// All available detection sources, in registration order
pub static REGISTRY: &[SourceEntry] = &[
    SourceEntry {
        name: "ident.me",
        build: || Arc::new(IdentMeSource),
    },
    SourceEntry {
        name: "icanhazip.com",
        build: || Arc::new(ICanHazIpSource),
    },
    SourceEntry {
        name: "checkip.amazonaws.com",
        build: || Arc::new(CheckIpAwsSource),
    },
    SourceEntry {
        name: "ipify.org",
        build: || Arc::new(IpifySource),
    },
    SourceEntry {
        name: "ipnumberia.com",
        build: || Arc::new(IpNumberiaSource),
    },
    SourceEntry {
        name: "ipmyp.ir",
        build: || Arc::new(IpMypSource),
    },
];

/// Instantiate every registered source, in registration order
pub fn builtin_sources() -> Vec<Arc<dyn IpSource>> {
    REGISTRY.iter().map(|entry| (entry.build)()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn registry_names_match_sources() {
        for entry in REGISTRY {
            assert_eq!(entry.name, (entry.build)().name());
        }
    }

    #[test]
    fn registry_names_are_unique() {
        let names: HashSet<&str> = REGISTRY.iter().map(|e| e.name).collect();
        assert_eq!(names.len(), REGISTRY.len());
    }

    #[test]
    fn priorities_are_in_range() {
        for source in builtin_sources() {
            assert!(source.priority() <= 9, "{} out of range", source.name());
        }
    }

    #[test]
    fn every_priority_is_distinct() {
        let priorities: HashSet<u8> =
            builtin_sources().iter().map(|s| s.priority()).collect();
        assert_eq!(priorities.len(), REGISTRY.len());
    }
}
