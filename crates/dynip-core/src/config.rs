//! Configuration types for the dynip system
//!
//! This module defines all configuration structures used throughout the crate.

use serde::{Deserialize, Serialize};

use crate::traits::IpVersion;

/// Main dynip configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DynipConfig {
    /// DNS provider configuration
    pub provider: ProviderConfig,

    /// Zone the managed records belong to
    pub domain: String,

    /// Record names within the zone to keep in sync
    pub records: Vec<String>,

    /// Address families to resolve and publish
    #[serde(default)]
    pub family: FamilyMode,

    /// IP source include/exclude filter
    #[serde(default)]
    pub sources: SourceFilter,

    /// Per-source probe/fetch timeout in seconds
    #[serde(default = "default_source_timeout_secs")]
    pub source_timeout_secs: u64,

    /// Interval between poll ticks in seconds
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,

    /// Overall HTTP request timeout in seconds (client-level)
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Optional engine settings
    #[serde(default)]
    pub engine: EngineConfig,
}

impl DynipConfig {
    /// Validate the configuration
    ///
    /// This is the only place a failure is fatal to the process: everything
    /// past startup recovers and retries.
    pub fn validate(&self) -> Result<(), crate::Error> {
        if self.domain.is_empty() {
            return Err(crate::Error::config("Domain cannot be empty"));
        }
        if self.records.is_empty() {
            return Err(crate::Error::config("No records configured"));
        }
        if self.records.iter().any(|r| r.is_empty()) {
            return Err(crate::Error::config("Record names cannot be empty"));
        }
        if self.poll_interval_secs == 0 {
            return Err(crate::Error::config("Poll interval must be > 0"));
        }
        if self.source_timeout_secs == 0 {
            return Err(crate::Error::config("Source timeout must be > 0"));
        }

        self.provider.validate()?;

        Ok(())
    }

    /// The IP versions this configuration resolves, in fixed order
    pub fn versions(&self) -> Vec<IpVersion> {
        match self.family {
            FamilyMode::V4 => vec![IpVersion::V4],
            FamilyMode::V6 => vec![IpVersion::V6],
            FamilyMode::Dual => vec![IpVersion::V4, IpVersion::V6],
        }
    }
}

/// Address-family mode
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FamilyMode {
    /// IPv4 only
    #[default]
    V4,
    /// IPv6 only
    V6,
    /// Both IPv4 and IPv6, resolved as two independent cycles
    Dual,
}

/// IP source include/exclude filter
///
/// An empty include list means "all registered sources". Names are matched
/// case-insensitively. Exclude is applied after include and wins on conflict.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SourceFilter {
    /// Source names to include (empty = all)
    #[serde(default)]
    pub include: Vec<String>,

    /// Source names to exclude
    #[serde(default)]
    pub exclude: Vec<String>,
}

impl SourceFilter {
    /// Whether a source name passes this filter
    pub fn allows(&self, name: &str) -> bool {
        let name = name.to_lowercase();

        let included = self.include.is_empty()
            || self.include.iter().any(|n| n.to_lowercase() == name);
        let excluded = self.exclude.iter().any(|n| n.to_lowercase() == name);

        included && !excluded
    }
}

/// DNS provider configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ProviderConfig {
    /// ArvanCloud provider
    Arvan {
        /// ArvanCloud API key
        api_key: String,
    },

    /// Custom provider
    Custom {
        /// Factory name to use
        factory: String,
        /// Custom configuration data
        config: serde_json::Value,
    },
}

impl ProviderConfig {
    /// Validate the provider configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        match self {
            ProviderConfig::Arvan { api_key } => {
                if api_key.is_empty() {
                    return Err(crate::Error::config("ArvanCloud API key cannot be empty"));
                }
                Ok(())
            }
            ProviderConfig::Custom { factory, config } => {
                if factory.is_empty() {
                    return Err(crate::Error::config("Custom provider factory cannot be empty"));
                }
                if config.is_null() {
                    return Err(crate::Error::config("Custom provider config cannot be null"));
                }
                Ok(())
            }
        }
    }

    /// Get the provider type name
    pub fn type_name(&self) -> &str {
        match self {
            ProviderConfig::Arvan { .. } => "arvan",
            ProviderConfig::Custom { factory, .. } => factory,
        }
    }
}

/// Engine configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Upper bound in seconds for the error backoff sleep
    #[serde(default = "default_backoff_cap_secs")]
    pub backoff_cap_secs: u64,

    /// Capacity of the internal event channel
    ///
    /// When full, new events are dropped (with a warning log) so the engine
    /// never blocks on a slow observer.
    #[serde(default = "default_event_channel_capacity")]
    pub event_channel_capacity: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            backoff_cap_secs: default_backoff_cap_secs(),
            event_channel_capacity: default_event_channel_capacity(),
        }
    }
}

fn default_source_timeout_secs() -> u64 {
    10
}

fn default_poll_interval_secs() -> u64 {
    60
}

fn default_request_timeout_secs() -> u64 {
    30
}

fn default_backoff_cap_secs() -> u64 {
    30
}

fn default_event_channel_capacity() -> usize {
    1000
}
