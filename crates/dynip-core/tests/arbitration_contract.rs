//! Arbitration contract tests
//!
//! Verify the consensus rules of `SourceManager::resolve`: unanimity
//! short-circuits, the most trusted reporter beats any majority, and the
//! result is always an address some source actually reported, of exactly
//! the requested family.

mod common;

use std::net::IpAddr;

use common::{ScriptedSource, short_timeout};
use dynip_core::SourceManager;
use dynip_core::traits::IpVersion;

fn ip(s: &str) -> IpAddr {
    s.parse().unwrap()
}

#[tokio::test]
async fn unanimous_sources_win_regardless_of_priority() {
    let mut manager = SourceManager::new(vec![
        ScriptedSource::new("a", 9).with_ipv4("203.0.113.5").into_arc(),
        ScriptedSource::new("b", 3).with_ipv4("203.0.113.5").into_arc(),
        ScriptedSource::new("c", 0).with_ipv4("203.0.113.5").into_arc(),
    ]);

    let client = reqwest::Client::new();
    let resolved = manager
        .resolve(&client, IpVersion::V4, short_timeout())
        .await;

    assert_eq!(resolved, Some(ip("203.0.113.5")));
}

#[tokio::test]
async fn most_trusted_source_overrides_disagreement() {
    let mut manager = SourceManager::new(vec![
        ScriptedSource::new("a", 0).with_ipv4("1.1.1.1").into_arc(),
        ScriptedSource::new("b", 5).with_ipv4("2.2.2.2").into_arc(),
    ]);

    let client = reqwest::Client::new();
    let resolved = manager
        .resolve(&client, IpVersion::V4, short_timeout())
        .await;

    assert_eq!(resolved, Some(ip("1.1.1.1")));
}

#[tokio::test]
async fn majority_is_not_authoritative() {
    // A single priority-0 source beats a two-source majority at priority 5
    let mut manager = SourceManager::new(vec![
        ScriptedSource::new("a", 0).with_ipv4("9.9.9.9").into_arc(),
        ScriptedSource::new("b", 5).with_ipv4("8.8.8.8").into_arc(),
        ScriptedSource::new("c", 5).with_ipv4("8.8.8.8").into_arc(),
    ]);

    let client = reqwest::Client::new();
    let resolved = manager
        .resolve(&client, IpVersion::V4, short_timeout())
        .await;

    assert_eq!(resolved, Some(ip("9.9.9.9")));
}

#[tokio::test]
async fn no_candidates_resolves_to_none() {
    // Sources are reachable but have nothing to report for the family
    let mut manager = SourceManager::new(vec![
        ScriptedSource::new("a", 0).into_arc(),
        ScriptedSource::new("b", 1).into_arc(),
    ]);

    let client = reqwest::Client::new();
    let resolved = manager
        .resolve(&client, IpVersion::V4, short_timeout())
        .await;

    assert_eq!(resolved, None);
}

#[tokio::test]
async fn ipv6_answers_never_count_for_ipv4() {
    let mut manager = SourceManager::new(vec![
        ScriptedSource::new("a", 0).with_ipv6("2001:db8::1").into_arc(),
        ScriptedSource::new("b", 5).with_ipv4("203.0.113.5").into_arc(),
    ]);

    let client = reqwest::Client::new();

    // The priority-0 source only knows IPv6, so the v4 resolve must come
    // from the lower-trust source
    let v4 = manager
        .resolve(&client, IpVersion::V4, short_timeout())
        .await;
    assert_eq!(v4, Some(ip("203.0.113.5")));

    let v6 = manager
        .resolve(&client, IpVersion::V6, short_timeout())
        .await;
    assert_eq!(v6, Some(ip("2001:db8::1")));
}

#[tokio::test]
async fn family_without_any_reporter_resolves_to_none() {
    let mut manager = SourceManager::new(vec![
        ScriptedSource::new("a", 0).with_ipv4("203.0.113.5").into_arc(),
    ]);

    let client = reqwest::Client::new();
    let resolved = manager
        .resolve(&client, IpVersion::V6, short_timeout())
        .await;

    assert_eq!(resolved, None);
}

#[tokio::test]
async fn priority_tie_break_is_deterministic() {
    // Two distinct values share the minimum priority; the winner is the one
    // first observed over the working-set iteration, which follows
    // registration order on equal priorities — not task completion order.
    let sources = || {
        vec![
            ScriptedSource::new("a", 3).with_ipv4("2.2.2.2").into_arc(),
            ScriptedSource::new("b", 3).with_ipv4("1.1.1.1").into_arc(),
        ]
    };

    let client = reqwest::Client::new();
    for _ in 0..5 {
        let mut manager = SourceManager::new(sources());
        let resolved = manager
            .resolve(&client, IpVersion::V4, short_timeout())
            .await;
        assert_eq!(resolved, Some(ip("2.2.2.2")));
    }
}

#[tokio::test(start_paused = true)]
async fn hung_fetch_cannot_stall_the_cycle() {
    let mut manager = SourceManager::new(vec![
        ScriptedSource::new("slow", 0)
            .with_ipv4("1.1.1.1")
            .with_fetch_delay(std::time::Duration::from_secs(3600))
            .into_arc(),
        ScriptedSource::new("fast", 5).with_ipv4("2.2.2.2").into_arc(),
    ]);

    let client = reqwest::Client::new();
    let resolved = manager
        .resolve(&client, IpVersion::V4, short_timeout())
        .await;

    // The hung source is bounded by the timeout and contributes nothing
    assert_eq!(resolved, Some(ip("2.2.2.2")));
}

#[tokio::test]
async fn failed_fetch_does_not_abort_the_others() {
    // An unreachable source is dropped at discovery; the rest still answer
    let mut manager = SourceManager::new(vec![
        ScriptedSource::new("dead", 0).unreachable().into_arc(),
        ScriptedSource::new("alive", 5).with_ipv4("203.0.113.5").into_arc(),
    ]);

    let client = reqwest::Client::new();
    let resolved = manager
        .resolve(&client, IpVersion::V4, short_timeout())
        .await;

    assert_eq!(resolved, Some(ip("203.0.113.5")));
}
