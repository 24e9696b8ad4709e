//! Test doubles and common utilities for the core contract tests
//!
//! Scripted sources and a call-recording provider, so discovery,
//! arbitration and engine behavior can be verified without any network.

use std::collections::HashSet;
use std::net::IpAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use dynip_core::config::{DynipConfig, FamilyMode, ProviderConfig, SourceFilter};
use dynip_core::error::Result;
use dynip_core::traits::{DnsProvider, IpSource, RecordType, SourceReport};

/// A source whose probe/fetch behavior is scripted by the test
pub struct ScriptedSource {
    name: &'static str,
    priority: u8,
    reachable: Arc<AtomicBool>,
    report: SourceReport,
    probe_delay: Option<Duration>,
    fetch_delay: Option<Duration>,
    probe_calls: Arc<AtomicUsize>,
    fetch_calls: Arc<AtomicUsize>,
}

impl ScriptedSource {
    pub fn new(name: &'static str, priority: u8) -> Self {
        Self {
            name,
            priority,
            reachable: Arc::new(AtomicBool::new(true)),
            report: SourceReport::empty(),
            probe_delay: None,
            fetch_delay: None,
            probe_calls: Arc::new(AtomicUsize::new(0)),
            fetch_calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn with_ipv4(mut self, ip: &str) -> Self {
        self.report.ipv4 = Some(ip.parse().unwrap());
        self
    }

    pub fn with_ipv6(mut self, ip: &str) -> Self {
        self.report.ipv6 = Some(ip.parse().unwrap());
        self
    }

    pub fn unreachable(self) -> Self {
        self.reachable.store(false, Ordering::SeqCst);
        self
    }

    /// Delay applied inside probe, for timeout-bounding tests
    pub fn with_probe_delay(mut self, delay: Duration) -> Self {
        self.probe_delay = Some(delay);
        self
    }

    /// Delay applied inside fetch, for timeout-bounding tests
    pub fn with_fetch_delay(mut self, delay: Duration) -> Self {
        self.fetch_delay = Some(delay);
        self
    }

    /// Handle for flipping reachability after the source was handed over
    pub fn reachability_handle(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.reachable)
    }

    pub fn probe_calls_handle(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.probe_calls)
    }

    pub fn fetch_calls_handle(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.fetch_calls)
    }

    pub fn into_arc(self) -> Arc<dyn IpSource> {
        Arc::new(self)
    }
}

#[async_trait]
impl IpSource for ScriptedSource {
    fn name(&self) -> &'static str {
        self.name
    }

    fn priority(&self) -> u8 {
        self.priority
    }

    async fn probe(&self, _client: &reqwest::Client, _timeout: Duration) -> bool {
        self.probe_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.probe_delay {
            tokio::time::sleep(delay).await;
        }
        self.reachable.load(Ordering::SeqCst)
    }

    async fn fetch(&self, _client: &reqwest::Client, _timeout: Duration) -> SourceReport {
        self.fetch_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.fetch_delay {
            tokio::time::sleep(delay).await;
        }
        self.report
    }
}

/// A DnsProvider double that records update calls and can be scripted to
/// reject specific records
pub struct MockProvider {
    updates: Arc<std::sync::Mutex<Vec<(String, RecordType, IpAddr)>>>,
    failing_records: Arc<std::sync::Mutex<HashSet<String>>>,
    validate_ok: bool,
}

impl MockProvider {
    pub fn new() -> Self {
        Self {
            updates: Arc::new(std::sync::Mutex::new(Vec::new())),
            failing_records: Arc::new(std::sync::Mutex::new(HashSet::new())),
            validate_ok: true,
        }
    }

    pub fn rejecting_domain() -> Self {
        Self {
            validate_ok: false,
            ..Self::new()
        }
    }

    /// Create a handle that shares call records with this provider
    pub fn sharing_state_with(other: &Self) -> Self {
        Self {
            updates: Arc::clone(&other.updates),
            failing_records: Arc::clone(&other.failing_records),
            validate_ok: other.validate_ok,
        }
    }

    /// Make updates for a record fail until cleared
    pub fn fail_record(&self, record: &str) {
        self.failing_records
            .lock()
            .unwrap()
            .insert(record.to_string());
    }

    pub fn heal_record(&self, record: &str) {
        self.failing_records.lock().unwrap().remove(record);
    }

    pub fn updates(&self) -> Vec<(String, RecordType, IpAddr)> {
        self.updates.lock().unwrap().clone()
    }

    pub fn update_count(&self) -> usize {
        self.updates.lock().unwrap().len()
    }
}

#[async_trait]
impl DnsProvider for MockProvider {
    async fn validate_domain(&self, domain: &str) -> Result<()> {
        if self.validate_ok {
            Ok(())
        } else {
            Err(dynip_core::Error::not_found(format!(
                "domain unknown: {}",
                domain
            )))
        }
    }

    async fn update_record(
        &self,
        _domain: &str,
        record: &str,
        record_type: RecordType,
        new_ip: IpAddr,
    ) -> Result<()> {
        if self.failing_records.lock().unwrap().contains(record) {
            return Err(dynip_core::Error::provider(
                "mock",
                format!("rejected update for {}", record),
            ));
        }

        self.updates
            .lock()
            .unwrap()
            .push((record.to_string(), record_type, new_ip));
        Ok(())
    }

    fn provider_name(&self) -> &'static str {
        "mock"
    }
}

/// Minimal valid configuration for engine tests
pub fn test_config(records: &[&str], family: FamilyMode) -> DynipConfig {
    DynipConfig {
        provider: ProviderConfig::Arvan {
            api_key: "test-key".to_string(),
        },
        domain: "example.com".to_string(),
        records: records.iter().map(|r| r.to_string()).collect(),
        family,
        sources: SourceFilter::default(),
        source_timeout_secs: 1,
        poll_interval_secs: 60,
        request_timeout_secs: 5,
        engine: Default::default(),
    }
}

/// Short timeout used across the contract tests
pub fn short_timeout() -> Duration {
    Duration::from_millis(200)
}
