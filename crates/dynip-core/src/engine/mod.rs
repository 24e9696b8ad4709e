//! Core update engine
//!
//! The UpdateEngine is responsible for:
//! - Periodically resolving the public IP through the SourceManager
//! - Detecting changes against the last value it applied
//! - Updating DNS records via DnsProvider when the IP changes
//!
//! ## Architecture
//!
//! ```text
//! ┌───────────────┐
//! │ SourceManager │◀── resolve(version) ──┐
//! └───────────────┘                       │
//!                                ┌──────────────┐
//!                                │ UpdateEngine │── poll tick ──▶ compare last applied
//!                                └──────────────┘
//!                                         │
//!                      ┌──────────────────┼──────────────────┐
//!                      ▼                  ▼                  ▼
//!               ┌─────────────┐   ┌──────────────┐   ┌─────────────┐
//!               │ DnsProvider │   │ DnsProvider  │   │   Events    │
//!               │ (record 1)  │   │ (record N)   │   │  (notify)   │
//!               └─────────────┘   └──────────────┘   └─────────────┘
//! ```
//!
//! ## Tick Flow
//!
//! 1. Resolve one trusted address per configured IP version
//! 2. A null resolution is transient: log, keep state, wait for next tick
//! 3. On change, update every configured record concurrently
//! 4. Adopt the new value as "last applied" only if every record succeeded
//! 5. Emit events for monitoring/logging
//!
//! In dual-stack mode IPv4 and IPv6 run as two fully independent cycles
//! with separate working-sets, since reachability of a source can differ
//! per address family.

use std::net::IpAddr;
use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use crate::config::DynipConfig;
use crate::error::{Error, Result};
use crate::manager::SourceManager;
use crate::traits::{DnsProvider, IpSource, IpVersion, RecordType};

/// Events emitted by the UpdateEngine
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineEvent {
    /// Engine started
    Started {
        versions: Vec<IpVersion>,
        records_count: usize,
    },

    /// No source could provide an address this tick (transient)
    ResolveFailed { version: IpVersion },

    /// A new public IP was resolved for a version
    IpChanged {
        version: IpVersion,
        new_ip: IpAddr,
        previous_ip: Option<IpAddr>,
    },

    /// One record was updated successfully
    RecordUpdated { record: String, new_ip: IpAddr },

    /// One record update failed (siblings unaffected)
    RecordUpdateFailed { record: String, error: String },

    /// Engine stopped
    Stopped { reason: String },
}

/// One IP version's independent resolve cycle
struct VersionCycle {
    version: IpVersion,
    manager: SourceManager,
    /// Last address successfully applied to every record. Advances only
    /// when a full update cycle succeeds, so a failed tick retries.
    last_applied: Option<IpAddr>,
}

/// Core update engine
///
/// The engine drives the entire resolve → compare → update flow. It runs
/// continuously, polling at the configured interval until shutdown.
///
/// ## Lifecycle
///
/// 1. Create with [`UpdateEngine::new()`]
/// 2. Optionally [`UpdateEngine::validate()`] the domain with the provider
/// 3. Start with [`UpdateEngine::run()`]
/// 4. Engine runs until shutdown signal received
///
/// Nothing inside a tick can terminate the loop: resolution failures are
/// transient, record failures are isolated, and transport-class errors are
/// recovered with a bounded backoff sleep.
pub struct UpdateEngine {
    /// DNS provider for record updates
    provider: Box<dyn DnsProvider>,

    /// Shared HTTP client, injected by the caller
    client: reqwest::Client,

    /// Zone the managed records belong to
    domain: String,

    /// Record names to keep in sync
    records: Vec<String>,

    /// Independent cycle state per configured IP version
    cycles: Vec<VersionCycle>,

    /// Per-source probe/fetch timeout
    source_timeout: Duration,

    /// Interval between poll ticks
    poll_interval: Duration,

    /// Upper bound for the error backoff sleep
    backoff_cap: Duration,

    /// Event sender for external monitoring
    event_tx: mpsc::Sender<EngineEvent>,
}

impl UpdateEngine {
    /// Create a new update engine
    ///
    /// # Parameters
    ///
    /// - `provider`: DNS provider implementation
    /// - `client`: shared HTTP client (the engine never builds its own)
    /// - `sources`: full registered source set; the config's include/exclude
    ///   filter is applied here
    /// - `config`: dynip configuration (validated)
    ///
    /// # Returns
    ///
    /// A tuple of (engine, event_receiver) where event_receiver yields
    /// engine events.
    pub fn new(
        provider: Box<dyn DnsProvider>,
        client: reqwest::Client,
        sources: Vec<Arc<dyn IpSource>>,
        config: DynipConfig,
    ) -> Result<(Self, mpsc::Receiver<EngineEvent>)> {
        config.validate()?;

        let (tx, rx) = mpsc::channel(config.engine.event_channel_capacity);

        // One manager per version: working-sets are never shared across
        // families because reachability can legitimately differ per family.
        let cycles = config
            .versions()
            .into_iter()
            .map(|version| VersionCycle {
                version,
                manager: SourceManager::with_filter(sources.clone(), &config.sources),
                last_applied: None,
            })
            .collect();

        let engine = Self {
            provider,
            client,
            domain: config.domain,
            records: config.records,
            cycles,
            source_timeout: Duration::from_secs(config.source_timeout_secs),
            poll_interval: Duration::from_secs(config.poll_interval_secs),
            backoff_cap: Duration::from_secs(config.engine.backoff_cap_secs),
            event_tx: tx,
        };

        Ok((engine, rx))
    }

    /// Validate the configured domain with the provider.
    ///
    /// Called once before the loop starts; a rejection here is the only
    /// fatal provider condition.
    pub async fn validate(&self) -> Result<()> {
        self.provider.validate_domain(&self.domain).await?;
        info!(
            domain = %self.domain,
            provider = self.provider.provider_name(),
            "domain validated"
        );
        Ok(())
    }

    /// Last address applied for a version, if any
    pub fn last_applied(&self, version: IpVersion) -> Option<IpAddr> {
        self.cycles
            .iter()
            .find(|c| c.version == version)
            .and_then(|c| c.last_applied)
    }

    /// Run the engine until a shutdown signal is received
    pub async fn run(&mut self) -> Result<()> {
        self.run_internal(None).await
    }

    /// Run the engine with a controlled shutdown signal
    ///
    /// **TESTING ONLY**: integration tests require controlled shutdown.
    /// Production code should use `run()`, which manages shutdown via
    /// SIGINT rather than programmatic channels.
    pub async fn run_with_shutdown(
        &mut self,
        shutdown_rx: tokio::sync::oneshot::Receiver<()>,
    ) -> Result<()> {
        self.run_internal(Some(shutdown_rx)).await
    }

    async fn run_internal(
        &mut self,
        shutdown_rx: Option<tokio::sync::oneshot::Receiver<()>>,
    ) -> Result<()> {
        self.emit_event(EngineEvent::Started {
            versions: self.cycles.iter().map(|c| c.version).collect(),
            records_count: self.records.len(),
        });

        let mut interval = tokio::time::interval(self.poll_interval);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        if let Some(mut rx) = shutdown_rx {
            loop {
                tokio::select! {
                    _ = interval.tick() => {
                        self.poll_once().await;
                    }

                    _ = &mut rx => {
                        info!("shutdown signal received");
                        self.emit_event(EngineEvent::Stopped {
                            reason: "Shutdown signal".to_string(),
                        });
                        break;
                    }
                }
            }
        } else {
            loop {
                tokio::select! {
                    _ = interval.tick() => {
                        self.poll_once().await;
                    }

                    _ = tokio::signal::ctrl_c() => {
                        info!("shutdown signal received");
                        self.emit_event(EngineEvent::Stopped {
                            reason: "Shutdown signal".to_string(),
                        });
                        break;
                    }
                }
            }
        }

        Ok(())
    }

    /// Run one poll tick across every configured IP version.
    ///
    /// Each version is an independent, self-contained cycle. Transport-class
    /// failures sleep a bounded backoff and move on; nothing here is fatal.
    pub async fn poll_once(&mut self) {
        for i in 0..self.cycles.len() {
            match self.tick_version(i).await {
                Ok(()) => {}
                Err(e) if e.is_transient() => {
                    error!(version = %self.cycles[i].version, error = %e,
                           "transient error, backing off");
                    tokio::time::sleep(self.backoff_cap.min(self.poll_interval)).await;
                }
                Err(e) => {
                    error!(version = %self.cycles[i].version, error = %e, "tick failed");
                }
            }
        }
    }

    /// One version's resolve → compare → update pass
    async fn tick_version(&mut self, index: usize) -> Result<()> {
        let version = self.cycles[index].version;

        let resolved = {
            let cycle = &mut self.cycles[index];
            cycle
                .manager
                .resolve(&self.client, version, self.source_timeout)
                .await
        };

        let Some(new_ip) = resolved else {
            // Transient: keep state untouched and try again next tick
            warn!(%version, "could not resolve a public address this tick");
            self.emit_event(EngineEvent::ResolveFailed { version });
            return Ok(());
        };

        let previous = self.cycles[index].last_applied;
        if previous == Some(new_ip) {
            debug!(%version, ip = %new_ip, "address unchanged");
            return Ok(());
        }

        info!(
            %version,
            previous = %previous.map(|ip| ip.to_string()).unwrap_or_else(|| "none".to_string()),
            new = %new_ip,
            "public address changed"
        );
        self.emit_event(EngineEvent::IpChanged {
            version,
            new_ip,
            previous_ip: previous,
        });

        match self.update_all_records(new_ip).await {
            Ok(()) => {
                // Every record took the new address; safe to adopt it
                self.cycles[index].last_applied = Some(new_ip);
                Ok(())
            }
            Err(e) => {
                // Retain the previous value so the next tick retries
                warn!(%version, error = %e, "update cycle incomplete, will retry");
                Err(e)
            }
        }
    }

    /// Update every configured record concurrently.
    ///
    /// Failures are isolated per record: one rejection neither aborts nor
    /// rolls back its siblings. Returns `Err` if any record failed, carrying
    /// a transient error when one was observed so the caller can back off.
    async fn update_all_records(&self, new_ip: IpAddr) -> Result<()> {
        let record_type = RecordType::for_ip(new_ip);

        let updates = self.records.iter().map(|record| {
            self.provider
                .update_record(&self.domain, record, record_type, new_ip)
        });
        let results = join_all(updates).await;

        let mut first_error = None;
        for (record, result) in self.records.iter().zip(results) {
            match result {
                Ok(()) => {
                    info!(record = %record, ip = %new_ip, %record_type, "record updated");
                    self.emit_event(EngineEvent::RecordUpdated {
                        record: record.clone(),
                        new_ip,
                    });
                }
                Err(e) => {
                    error!(record = %record, error = %e, "record update failed");
                    self.emit_event(EngineEvent::RecordUpdateFailed {
                        record: record.clone(),
                        error: e.to_string(),
                    });
                    // Prefer reporting a transient error so the loop backs off
                    if first_error.is_none() || e.is_transient() {
                        first_error = Some(e);
                    }
                }
            }
        }

        match first_error {
            None => Ok(()),
            Some(e) => Err(e),
        }
    }

    /// Emit an engine event
    ///
    /// Uses `try_send` so a slow or absent observer can never block the
    /// update loop; on a full channel the event is dropped with a warning.
    fn emit_event(&self, event: EngineEvent) {
        if self.event_tx.try_send(event).is_err() {
            warn!("event channel full, dropping event");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn engine_event_is_cloneable() {
        let event = EngineEvent::IpChanged {
            version: IpVersion::V4,
            new_ip: IpAddr::from([1, 2, 3, 4]),
            previous_ip: None,
        };

        assert_eq!(event.clone(), event);
    }
}
