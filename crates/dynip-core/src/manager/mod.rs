//! Source manager and arbiter
//!
//! The [`SourceManager`] owns the set of enabled IP sources, discovers which
//! of them are currently reachable, fans fetches out across the survivors,
//! and arbitrates disagreeing answers into a single trusted address per IP
//! version.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────┐   probe (concurrent, bounded)   ┌──────────────┐
//! │ configured   │────────────────────────────────▶│ working-set  │
//! │ source set   │                                 │ (by priority)│
//! └──────────────┘                                 └──────┬───────┘
//!                                                         │ fetch (concurrent, bounded)
//!                                                         ▼
//!                                                  ┌──────────────┐
//!                                                  │  candidates  │──▶ arbitrate ──▶ one IpAddr
//!                                                  └──────────────┘
//! ```
//!
//! ## Arbitration
//!
//! Unanimous answers short-circuit: if every reporting source agrees, that
//! address wins regardless of priorities. On disagreement the address whose
//! best (lowest-number) reporting source is most trusted wins, even against
//! a majority of less trusted reporters. Majority voting alone is unsafe
//! here: a service proxying registry data outranks heuristic HTML scraping,
//! however many scrapers agree with each other.
//!
//! ## Ownership
//!
//! The working-set is exclusively owned by the manager and replaced
//! wholesale on every discovery pass, never mutated in place. The design
//! assumes a single orchestrator per manager; concurrent calls on one
//! manager instance are not supported.

use std::net::IpAddr;
use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use tracing::{debug, info, warn};

use crate::config::SourceFilter;
use crate::traits::{IpSource, IpVersion};

/// Diagnostics snapshot of one configured source
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceStatus {
    /// Source identifier
    pub name: &'static str,
    /// Static trust ranking (lower = more trusted)
    pub priority: u8,
    /// Whether the most recent probe succeeded
    pub working: bool,
}

/// One source's answer for the requested family during one resolve cycle.
/// Discarded after arbitration.
#[derive(Debug, Clone, Copy)]
struct Candidate {
    ip: IpAddr,
    source: &'static str,
    priority: u8,
}

/// A configured source together with its last-probe flag
struct SourceSlot {
    source: Arc<dyn IpSource>,
    working: bool,
}

/// Manages multiple IP detection sources with priority-based arbitration
pub struct SourceManager {
    /// Configured sources in registration order
    slots: Vec<SourceSlot>,

    /// Sources that passed the latest probe, ascending by priority.
    /// Replaced as a whole collection on each discovery pass.
    working: Vec<Arc<dyn IpSource>>,
}

impl SourceManager {
    /// Create a manager over the full given source set
    pub fn new(sources: Vec<Arc<dyn IpSource>>) -> Self {
        Self {
            slots: sources
                .into_iter()
                .map(|source| SourceSlot {
                    source,
                    working: false,
                })
                .collect(),
            working: Vec::new(),
        }
    }

    /// Create a manager over the sources passing the include/exclude filter
    ///
    /// An empty include list keeps everything; exclude is applied after
    /// include and wins on conflict. Names match case-insensitively.
    pub fn with_filter(sources: Vec<Arc<dyn IpSource>>, filter: &SourceFilter) -> Self {
        Self::new(
            sources
                .into_iter()
                .filter(|s| filter.allows(s.name()))
                .collect(),
        )
    }

    /// Number of configured sources after filtering
    pub fn source_count(&self) -> usize {
        self.slots.len()
    }

    /// Probe every configured source concurrently and rebuild the working-set.
    ///
    /// A source that fails, times out, or answers negatively is dropped.
    /// Survivors are sorted ascending by priority; ties keep registration
    /// order (stable sort). The previous working-set is discarded wholesale,
    /// never merged, so re-running discovery is always safe.
    ///
    /// Returns the names of the surviving sources for observability.
    pub async fn discover_working_sources(
        &mut self,
        client: &reqwest::Client,
        timeout: Duration,
    ) -> Vec<&'static str> {
        let probes = self
            .slots
            .iter()
            .map(|slot| tokio::time::timeout(timeout, slot.source.probe(client, timeout)));
        let results = join_all(probes).await;

        for (slot, result) in self.slots.iter_mut().zip(results) {
            slot.working = matches!(result, Ok(true));
            if slot.working {
                info!(
                    source = slot.source.name(),
                    priority = slot.source.priority(),
                    "source is working"
                );
            } else {
                warn!(source = slot.source.name(), "source is not reachable");
            }
        }

        let mut working: Vec<Arc<dyn IpSource>> = self
            .slots
            .iter()
            .filter(|slot| slot.working)
            .map(|slot| Arc::clone(&slot.source))
            .collect();
        working.sort_by_key(|s| s.priority());

        info!(count = working.len(), "working source discovery complete");

        self.working = working;
        self.working.iter().map(|s| s.name()).collect()
    }

    /// Resolve a single trusted address for the requested IP version.
    ///
    /// Runs `fetch` concurrently on every working source, each bounded by
    /// `timeout`; sources that fail or report nothing for the family
    /// contribute no candidate and do not abort the others. Returns `None`
    /// when no source could provide an address — a transient condition, not
    /// an error.
    pub async fn resolve(
        &mut self,
        client: &reqwest::Client,
        version: IpVersion,
        timeout: Duration,
    ) -> Option<IpAddr> {
        if self.working.is_empty() {
            self.discover_working_sources(client, timeout).await;
        }

        if self.working.is_empty() {
            warn!("no working IP sources available");
            return None;
        }

        let fetches = self
            .working
            .iter()
            .map(|source| tokio::time::timeout(timeout, source.fetch(client, timeout)));
        let results = join_all(fetches).await;

        let mut candidates = Vec::new();
        for (source, result) in self.working.iter().zip(results) {
            let report = match result {
                Ok(report) => report,
                Err(_) => {
                    warn!(source = source.name(), "fetch timed out");
                    continue;
                }
            };

            if let Some(ip) = report.get(version) {
                debug!(source = source.name(), %ip, "candidate collected");
                candidates.push(Candidate {
                    ip,
                    source: source.name(),
                    priority: source.priority(),
                });
            }
        }

        if candidates.is_empty() {
            warn!(%version, "no sources could provide an address");
            return None;
        }

        Some(arbitrate(&candidates))
    }

    /// Snapshot of every configured source for diagnostics. No side effects.
    pub fn working_sources_info(&self) -> Vec<SourceStatus> {
        self.slots
            .iter()
            .map(|slot| SourceStatus {
                name: slot.source.name(),
                priority: slot.source.priority(),
                working: slot.working,
            })
            .collect()
    }
}

/// Select one address from a non-empty candidate set.
///
/// Unanimity short-circuits priority comparison entirely. Otherwise each
/// distinct value scores the minimum priority among its reporters and the
/// smallest score wins. A score tie keeps the value first observed over the
/// working-set iteration, which is deterministic because candidates arrive
/// in working-set order (priority-sorted, stable), not completion order.
fn arbitrate(candidates: &[Candidate]) -> IpAddr {
    // Group by distinct value, preserving first-observed order
    let mut groups: Vec<(IpAddr, u8)> = Vec::new();
    for candidate in candidates {
        match groups.iter_mut().find(|(ip, _)| *ip == candidate.ip) {
            Some((_, min_priority)) => {
                *min_priority = (*min_priority).min(candidate.priority);
            }
            None => groups.push((candidate.ip, candidate.priority)),
        }
    }

    if groups.len() == 1 {
        let ip = groups[0].0;
        info!(%ip, "all sources agree");
        return ip;
    }

    warn!(
        values = ?groups.iter().map(|(ip, _)| ip.to_string()).collect::<Vec<_>>(),
        "sources disagree, selecting by priority"
    );

    let mut best = &groups[0];
    for group in &groups[1..] {
        if group.1 < best.1 {
            best = group;
        }
    }

    let reporters: Vec<&str> = candidates
        .iter()
        .filter(|c| c.ip == best.0)
        .map(|c| c.source)
        .collect();
    info!(ip = %best.0, priority = best.1, ?reporters, "address selected by priority");

    best.0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candidate(ip: &str, source: &'static str, priority: u8) -> Candidate {
        Candidate {
            ip: ip.parse().unwrap(),
            source,
            priority,
        }
    }

    #[test]
    fn unanimity_wins_regardless_of_priority() {
        let candidates = [
            candidate("203.0.113.5", "a", 9),
            candidate("203.0.113.5", "b", 0),
        ];
        assert_eq!(arbitrate(&candidates), "203.0.113.5".parse::<IpAddr>().unwrap());
    }

    #[test]
    fn most_trusted_reporter_wins() {
        let candidates = [
            candidate("1.1.1.1", "a", 0),
            candidate("2.2.2.2", "b", 5),
        ];
        assert_eq!(arbitrate(&candidates), "1.1.1.1".parse::<IpAddr>().unwrap());
    }

    #[test]
    fn single_trusted_source_beats_majority() {
        let candidates = [
            candidate("9.9.9.9", "a", 0),
            candidate("8.8.8.8", "b", 5),
            candidate("8.8.8.8", "c", 5),
        ];
        assert_eq!(arbitrate(&candidates), "9.9.9.9".parse::<IpAddr>().unwrap());
    }

    #[test]
    fn priority_tie_keeps_first_observed() {
        let candidates = [
            candidate("2.2.2.2", "a", 3),
            candidate("1.1.1.1", "b", 3),
        ];
        // Equal minimum priority: the value observed first wins
        assert_eq!(arbitrate(&candidates), "2.2.2.2".parse::<IpAddr>().unwrap());
    }

    #[test]
    fn group_minimum_counts_not_first_reporter() {
        // 5.5.5.5 is first reported by a low-trust source but a priority-1
        // source also reports it, so its score is 1 and it wins over 6.6.6.6
        let candidates = [
            candidate("5.5.5.5", "a", 7),
            candidate("6.6.6.6", "b", 2),
            candidate("5.5.5.5", "c", 1),
        ];
        assert_eq!(arbitrate(&candidates), "5.5.5.5".parse::<IpAddr>().unwrap());
    }
}
