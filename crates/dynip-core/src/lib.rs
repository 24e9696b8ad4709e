// # dynip-core
//
// Core library for the multi-source dynamic DNS system.
//
// ## Architecture Overview
//
// This library provides the core functionality for keeping DNS records in
// sync with a host's public IP:
// - **IpSource**: Trait for probing and querying external IP detection services
// - **SourceManager**: Discovers reachable sources and arbitrates their
//   disagreeing answers into one trusted address per IP version
// - **DnsProvider**: Trait for validating domains and updating records via
//   provider APIs
// - **UpdateEngine**: Polling orchestrator driving resolve → compare → update
// - **ProviderRegistry**: Plugin-based registry for DNS providers
//
// ## Design Principles
//
// 1. **Semi-trusted inputs**: detection services can be slow, down,
//    malformed, or wrong; the manager tolerates all of it and still
//    produces one deterministic answer
// 2. **Separation of Concerns**: core logic is separate from implementations
// 3. **Plugin-Based**: providers are registered dynamically; sources are a
//    fixed compile-time table
// 4. **Library-First**: all core functionality can be used as a library

pub mod config;
pub mod engine;
pub mod error;
pub mod manager;
pub mod registry;
pub mod traits;

// Re-export core types for convenience
pub use config::{DynipConfig, FamilyMode, ProviderConfig, SourceFilter};
pub use engine::{EngineEvent, UpdateEngine};
pub use error::{Error, Result};
pub use manager::{SourceManager, SourceStatus};
pub use registry::ProviderRegistry;
pub use traits::{DnsProvider, IpSource, IpVersion, RecordType, SourceReport};
