//! Address extraction from raw service payloads
//!
//! Detection services answer in plain text, JSON, or HTML. Extraction first
//! tries a direct parse of the whole trimmed payload as an IP literal, then
//! falls back to pattern-scanning for an IPv4 dotted-quad or IPv6 colon-hex
//! token. Every scanned token must re-parse as a valid address of the
//! requested family or it is discarded, so `999.999.999.999` never leaks
//! through.

use std::net::{Ipv4Addr, Ipv6Addr};
use std::sync::LazyLock;

use regex::Regex;

static IPV4_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b(?:[0-9]{1,3}\.){3}[0-9]{1,3}\b").unwrap());

// Full (uncompressed) colon-hex form only; compressed "::" forms are caught
// by the direct-parse path when they make up the whole payload.
static IPV6_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b(?:[A-Fa-f0-9]{1,4}:){7}[A-Fa-f0-9]{1,4}\b").unwrap());

/// Extract an IPv4 address from a raw response payload
pub fn ipv4_from_response(text: &str) -> Option<Ipv4Addr> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return None;
    }

    if let Ok(ip) = trimmed.parse::<Ipv4Addr>() {
        return Some(ip);
    }

    IPV4_PATTERN
        .find_iter(trimmed)
        .find_map(|m| m.as_str().parse().ok())
}

/// Extract an IPv6 address from a raw response payload
pub fn ipv6_from_response(text: &str) -> Option<Ipv6Addr> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return None;
    }

    if let Ok(ip) = trimmed.parse::<Ipv6Addr>() {
        return Some(ip);
    }

    IPV6_PATTERN
        .find_iter(trimmed)
        .find_map(|m| m.as_str().parse().ok())
}
