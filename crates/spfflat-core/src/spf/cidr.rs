//! Exact CIDR aggregation for SPF mechanisms.
//!
//! Contiguous runs of individual addresses merge into the minimum set of
//! aligned CIDR blocks covering exactly the input, nothing more. Existing
//! CIDR blocks pass through untouched, as do non-IP mechanisms. IPv4 runs
//! over u32 arithmetic, IPv6 over u128.

use std::collections::{BTreeSet, HashSet};
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

/// Largest IPv4 network expanded to individual hosts (a /16).
const MAX_V4_EXPANSION: u64 = 65_536;
/// Largest IPv6 network expanded to individual hosts (a /118).
const MAX_V6_EXPANSION: u128 = 1_024;
/// Set size above which the oracle compares canonical CIDR forms instead
/// of individual addresses.
const DIRECT_COMPARE_LIMIT: usize = 1_000;

/// Per-domain aggregation behavior.
///
/// `v4_max_prefix` / `v6_max_prefix` bound aggregation breadth: an
/// emitted block with a numerically smaller prefix is downgraded into
/// blocks at the maximum allowed prefix (individual hosts once the limit
/// reaches the host prefix). Addresses in `preserve_ips` never end up
/// inside an aggregate.
#[derive(Debug, Clone)]
pub struct AggregationPolicy {
    pub v4_max_prefix: u8,
    pub v6_max_prefix: u8,
    pub preserve_ips: Vec<String>,
}

impl Default for AggregationPolicy {
    fn default() -> Self {
        Self {
            v4_max_prefix: 24,
            v6_max_prefix: 64,
            preserve_ips: Vec::new(),
        }
    }
}

impl AggregationPolicy {
    /// Any level of aggregation allowed; the internal default for the
    /// flatten path when the caller requests aggregation without policy.
    pub fn unrestricted() -> Self {
        Self {
            v4_max_prefix: 1,
            v6_max_prefix: 1,
            preserve_ips: Vec::new(),
        }
    }
}

/// Aggregate with the unrestricted policy.
pub fn aggregate(mechanisms: &[String]) -> Vec<String> {
    aggregate_with_policy(mechanisms, &AggregationPolicy::unrestricted())
}

/// Aggregate a mechanism list under a policy.
///
/// Individual `ip4:`/`ip6:` host addresses feed the aggregator; existing
/// CIDR blocks and non-IP mechanisms flow through unchanged.
pub fn aggregate_with_policy(mechanisms: &[String], policy: &AggregationPolicy) -> Vec<String> {
    if mechanisms.is_empty() {
        return Vec::new();
    }

    let preserve: HashSet<IpAddr> = policy
        .preserve_ips
        .iter()
        .filter_map(|s| s.parse().ok())
        .collect();

    let mut v4_hosts: Vec<Ipv4Addr> = Vec::new();
    let mut v6_hosts: Vec<Ipv6Addr> = Vec::new();
    let mut v4_blocks: Vec<String> = Vec::new();
    let mut v6_blocks: Vec<String> = Vec::new();
    let mut preserved: Vec<String> = Vec::new();
    let mut other: Vec<String> = Vec::new();

    for mech in mechanisms {
        if let Some(rest) = mech.strip_prefix("ip4:") {
            if rest.contains('/') {
                if parse_v4_cidr(rest).is_some() {
                    v4_blocks.push(mech.clone());
                }
            } else if let Ok(ip) = rest.parse::<Ipv4Addr>() {
                if preserve.contains(&IpAddr::V4(ip)) {
                    preserved.push(format!("ip4:{ip}"));
                } else {
                    v4_hosts.push(ip);
                }
            }
        } else if let Some(rest) = mech.strip_prefix("ip6:") {
            if rest.contains('/') {
                if parse_v6_cidr(rest).is_some() {
                    v6_blocks.push(mech.clone());
                }
            } else if let Ok(ip) = rest.parse::<Ipv6Addr>() {
                if preserve.contains(&IpAddr::V6(ip)) {
                    preserved.push(format!("ip6:{ip}"));
                } else {
                    v6_hosts.push(ip);
                }
            }
        } else {
            other.push(mech.clone());
        }
    }

    let mut result = aggregate_v4(&v4_hosts, policy.v4_max_prefix);
    result.extend(aggregate_v6(&v6_hosts, policy.v6_max_prefix));
    result.extend(v4_blocks);
    result.extend(v6_blocks);
    result.extend(preserved);
    result.extend(other);
    result
}

// ── IPv4 ─────────────────────────────────────────────────────────────

fn aggregate_v4(hosts: &[Ipv4Addr], max_prefix: u8) -> Vec<String> {
    let unique: BTreeSet<u32> = hosts.iter().map(|ip| u32::from(*ip)).collect();
    let mut out = Vec::new();

    let mut iter = unique.into_iter().peekable();
    while let Some(start) = iter.next() {
        let mut end = start;
        while end != u32::MAX && iter.peek() == Some(&(end + 1)) {
            end += 1;
            iter.next();
        }
        emit_v4_range(u64::from(start), u64::from(end), max_prefix, &mut out);
    }
    out
}

/// Emit the minimal aligned blocks covering `[start, end]` exactly,
/// downgrading any block broader than `max_prefix`.
fn emit_v4_range(mut start: u64, end: u64, max_prefix: u8, out: &mut Vec<String>) {
    while start <= end {
        let mut size = largest_pow2_u64(end - start + 1);
        while start % size != 0 {
            size >>= 1;
        }
        let prefix = 32 - size.trailing_zeros() as u8;
        if prefix < max_prefix {
            // Too broad for policy: re-emit as max_prefix-sized blocks
            // (individual hosts once max_prefix reaches 32).
            let sub = 1u64 << (32 - u32::from(max_prefix));
            let mut cursor = start;
            while cursor < start + size {
                push_v4(cursor as u32, max_prefix, out);
                cursor += sub;
            }
        } else {
            push_v4(start as u32, prefix, out);
        }
        start += size;
    }
}

fn push_v4(addr: u32, prefix: u8, out: &mut Vec<String>) {
    let ip = Ipv4Addr::from(addr);
    if prefix == 32 {
        // Bare form for wire compatibility.
        out.push(format!("ip4:{ip}"));
    } else {
        out.push(format!("ip4:{ip}/{prefix}"));
    }
}

fn largest_pow2_u64(v: u64) -> u64 {
    if v == 0 {
        return 1;
    }
    1u64 << (63 - v.leading_zeros())
}

// ── IPv6 ─────────────────────────────────────────────────────────────

fn aggregate_v6(hosts: &[Ipv6Addr], max_prefix: u8) -> Vec<String> {
    let unique: BTreeSet<u128> = hosts.iter().map(|ip| u128::from(*ip)).collect();
    let mut out = Vec::new();

    let mut iter = unique.into_iter().peekable();
    while let Some(start) = iter.next() {
        let mut end = start;
        while end != u128::MAX && iter.peek() == Some(&(end + 1)) {
            end += 1;
            iter.next();
        }
        emit_v6_range(start, end, max_prefix, &mut out);
    }
    out
}

fn emit_v6_range(mut start: u128, end: u128, max_prefix: u8, out: &mut Vec<String>) {
    loop {
        let span = end - start;
        let mut size = if span == u128::MAX {
            1u128 << 127
        } else {
            largest_pow2_u128(span + 1)
        };
        while start % size != 0 {
            size >>= 1;
        }
        let prefix = 128 - size.trailing_zeros() as u8;
        if prefix < max_prefix {
            let sub = 1u128 << (128 - u32::from(max_prefix));
            let mut cursor = start;
            loop {
                push_v6(cursor, max_prefix, out);
                cursor += sub;
                if cursor >= start.saturating_add(size) {
                    break;
                }
            }
        } else {
            push_v6(start, prefix, out);
        }
        match start.checked_add(size) {
            Some(next) if next <= end => start = next,
            _ => break,
        }
    }
}

fn push_v6(addr: u128, prefix: u8, out: &mut Vec<String>) {
    let ip = Ipv6Addr::from(addr);
    if prefix == 128 {
        out.push(format!("ip6:{ip}"));
    } else {
        out.push(format!("ip6:{ip}/{prefix}"));
    }
}

fn largest_pow2_u128(v: u128) -> u128 {
    if v == 0 {
        return 1;
    }
    1u128 << (127 - v.leading_zeros())
}

// ── CIDR parsing & expansion ─────────────────────────────────────────

fn parse_v4_cidr(s: &str) -> Option<(Ipv4Addr, u8)> {
    let (addr, prefix) = s.split_once('/')?;
    let addr: Ipv4Addr = addr.parse().ok()?;
    let prefix: u8 = prefix.parse().ok()?;
    (prefix <= 32).then_some((addr, prefix))
}

fn parse_v6_cidr(s: &str) -> Option<(Ipv6Addr, u8)> {
    let (addr, prefix) = s.split_once('/')?;
    let addr: Ipv6Addr = addr.parse().ok()?;
    let prefix: u8 = prefix.parse().ok()?;
    (prefix <= 128).then_some((addr, prefix))
}

/// Expand an IPv4 network to its hosts; refuses networks over the cap.
fn expand_v4(addr: Ipv4Addr, prefix: u8) -> Option<Vec<Ipv4Addr>> {
    let count = 1u64 << (32 - u32::from(prefix));
    if count > MAX_V4_EXPANSION {
        return None;
    }
    let mask = if prefix == 0 { 0 } else { u32::MAX << (32 - u32::from(prefix)) };
    let base = u64::from(u32::from(addr) & mask);
    Some((0..count).map(|i| Ipv4Addr::from((base + i) as u32)).collect())
}

/// Expand an IPv6 network to its hosts; refuses networks over the cap.
fn expand_v6(addr: Ipv6Addr, prefix: u8) -> Option<Vec<Ipv6Addr>> {
    if prefix < 118 {
        return None;
    }
    let count = 1u128 << (128 - u32::from(prefix));
    if count > MAX_V6_EXPANSION {
        return None;
    }
    let mask = if prefix == 0 {
        0
    } else {
        u128::MAX << (128 - u32::from(prefix))
    };
    let base = u128::from(addr) & mask;
    Some((0..count).map(|i| Ipv6Addr::from(base + i)).collect())
}

/// Expand a single `ip4:`/`ip6:` mechanism to canonical host strings.
/// Oversized networks and malformed inputs expand to nothing.
pub(crate) fn expand_mechanism(mech: &str) -> Vec<String> {
    if let Some(rest) = mech.strip_prefix("ip4:") {
        if rest.contains('/') {
            if let Some((addr, prefix)) = parse_v4_cidr(rest) {
                if let Some(hosts) = expand_v4(addr, prefix) {
                    return hosts.iter().map(|ip| ip.to_string()).collect();
                }
            }
            return Vec::new();
        }
        return rest
            .parse::<Ipv4Addr>()
            .map(|ip| vec![ip.to_string()])
            .unwrap_or_default();
    }
    if let Some(rest) = mech.strip_prefix("ip6:") {
        if rest.contains('/') {
            if let Some((addr, prefix)) = parse_v6_cidr(rest) {
                if let Some(hosts) = expand_v6(addr, prefix) {
                    return hosts.iter().map(|ip| ip.to_string()).collect();
                }
            }
            return Vec::new();
        }
        return rest
            .parse::<Ipv6Addr>()
            .map(|ip| vec![ip.to_string()])
            .unwrap_or_default();
    }
    Vec::new()
}

// ── Semantic-equivalence oracle ──────────────────────────────────────

/// Whether two SPF records authorize different IP sets.
///
/// Only `ip4:`/`ip6:` tokens participate: two records that differ solely
/// in `include:` targets compare as equal here. Callers combine this with
/// normalized-string comparison.
pub fn records_semantically_differ(old: &str, new: &str) -> bool {
    !ip_sets_equal(&record_ip_set(old), &record_ip_set(new))
}

fn record_ip_set(record: &str) -> HashSet<String> {
    let mut set = HashSet::new();
    for token in record.split_whitespace() {
        if token.starts_with("ip4:") || token.starts_with("ip6:") {
            set.extend(expand_mechanism(token));
        }
    }
    set
}

fn ip_sets_equal(a: &HashSet<String>, b: &HashSet<String>) -> bool {
    if a.len() != b.len() {
        return false;
    }
    if a.len() <= DIRECT_COMPARE_LIMIT {
        return a == b;
    }
    // Large sets: compare canonical CIDR forms instead of host lists.
    canonical_form(a) == canonical_form(b)
}

fn canonical_form(set: &HashSet<String>) -> Vec<String> {
    let mechanisms: Vec<String> = set
        .iter()
        .filter_map(|ip| {
            ip.parse::<IpAddr>().ok().map(|parsed| match parsed {
                IpAddr::V4(v4) => format!("ip4:{v4}"),
                IpAddr::V6(v6) => format!("ip6:{v6}"),
            })
        })
        .collect();
    let mut canonical = aggregate(&mechanisms);
    canonical.sort_unstable();
    canonical
}
