//! Recursive SPF flattening and RFC 7208 lookup accounting.
//!
//! A `Flattener` owns the per-run TXT cache shared by `count_lookups` and
//! `flatten`; it lives for one pipeline invocation and is never shared
//! across domains, so no locking is involved. Expansion is bounded by a
//! recursion depth of 10 and a per-path cycle check.

use std::collections::{BTreeSet, HashMap};
use std::future::Future;
use std::net::IpAddr;
use std::pin::Pin;

use crate::dns::DnsResolver;
use crate::error::CoreError;
use crate::spf::cidr;

const MAX_DEPTH: usize = 10;
/// RFC 7208 §4.6.4: evaluating a record may cost at most 10 DNS lookups.
pub const MAX_DNS_LOOKUPS: u32 = 10;

/// Result of a threshold-gated flatten.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlattenOutcome {
    pub original: String,
    pub flattened: String,
    pub lookup_count: u32,
    pub was_flattened: bool,
}

pub struct Flattener<'a, R: DnsResolver> {
    resolver: &'a R,
    txt_cache: HashMap<String, Vec<String>>,
    policy: cidr::AggregationPolicy,
}

impl<'a, R: DnsResolver> Flattener<'a, R> {
    /// A flattener with the unrestricted aggregation policy.
    pub fn new(resolver: &'a R) -> Self {
        Self::with_policy(resolver, cidr::AggregationPolicy::unrestricted())
    }

    /// A flattener applying per-domain aggregation knobs.
    pub fn with_policy(resolver: &'a R, policy: cidr::AggregationPolicy) -> Self {
        Self {
            resolver,
            txt_cache: HashMap::new(),
            policy,
        }
    }

    // ── TXT cache ────────────────────────────────────────────────────

    async fn cached_txt(&mut self, domain: &str) -> Result<Vec<String>, CoreError> {
        if let Some(records) = self.txt_cache.get(domain) {
            return Ok(records.clone());
        }
        let records = self
            .resolver
            .lookup_txt(domain)
            .await
            .map_err(|source| CoreError::Dns {
                domain: domain.to_string(),
                source,
            })?;
        self.txt_cache.insert(domain.to_string(), records.clone());
        Ok(records)
    }

    // ── Lookup accounting ────────────────────────────────────────────

    /// Count the DNS lookups needed to evaluate `domain`'s record as
    /// written. Duplicates along the expansion tree count every time;
    /// RFC 7208's accounting does not dedupe.
    pub async fn count_lookups(&mut self, domain: &str) -> Result<u32, CoreError> {
        let mut count = 1; // the apex TXT fetch
        let records = self.cached_txt(domain).await?;
        let Some(record) = find_spf(&records) else {
            return Ok(count);
        };
        self.count_mechanisms(&record, domain, 0, &mut count).await?;
        Ok(count)
    }

    fn count_mechanisms<'b>(
        &'b mut self,
        record: &'b str,
        current: &'b str,
        depth: usize,
        count: &'b mut u32,
    ) -> Pin<Box<dyn Future<Output = Result<(), CoreError>> + Send + 'b>> {
        Box::pin(async move {
            if depth > MAX_DEPTH {
                return Err(CoreError::DepthExceeded {
                    domain: current.to_string(),
                });
            }
            for token in record.split_whitespace() {
                if let Some(include) = token.strip_prefix("include:") {
                    *count += 1;
                    let records = self.cached_txt(include).await?;
                    for rec in records.iter().filter(|r| r.starts_with("v=spf1")) {
                        let rec = rec.clone();
                        self.count_mechanisms(&rec, include, depth + 1, count)
                            .await?;
                    }
                } else if token == "a" || token == "mx" {
                    *count += 1;
                } else if token.starts_with("a:") || token.starts_with("mx:") {
                    *count += 1;
                }
                // ip4:/ip6:, qualifiers, redirect= and exp= cost nothing.
            }
            Ok(())
        })
    }

    // ── Flattening ───────────────────────────────────────────────────

    /// Resolve `domain`'s SPF record into concrete `ip4:`/`ip6:`
    /// mechanisms. Returns `(original, flattened)`; a record with no
    /// resolvable IPs (modifiers only) comes back unchanged.
    pub async fn flatten(
        &mut self,
        domain: &str,
        aggregate: bool,
    ) -> Result<(String, String), CoreError> {
        let records = self.cached_txt(domain).await?;
        let original = find_spf(&records).ok_or_else(|| CoreError::NoSpfRecord {
            domain: domain.to_string(),
        })?;

        let mut ips = BTreeSet::new();
        let mut stack = Vec::new();
        self.collect_ips(&original, domain, 0, &mut stack, &mut ips)
            .await?;

        if ips.is_empty() {
            return Ok((original.clone(), original));
        }

        let mut mechanisms: Vec<String> = ips.into_iter().collect();
        if aggregate {
            mechanisms = cidr::aggregate_with_policy(&mechanisms, &self.policy);
        }
        mechanisms.sort_unstable();

        let flattened = format!("v=spf1 {} ~all", mechanisms.join(" "));
        Ok((original, flattened))
    }

    fn collect_ips<'b>(
        &'b mut self,
        record: &'b str,
        current: &'b str,
        depth: usize,
        stack: &'b mut Vec<String>,
        ips: &'b mut BTreeSet<String>,
    ) -> Pin<Box<dyn Future<Output = Result<(), CoreError>> + Send + 'b>> {
        Box::pin(async move {
            if depth > MAX_DEPTH {
                return Err(CoreError::DepthExceeded {
                    domain: current.to_string(),
                });
            }
            if stack.iter().any(|d| d == current) {
                return Err(CoreError::RecursionDetected {
                    domain: current.to_string(),
                });
            }
            stack.push(current.to_string());

            let result = self.collect_ips_inner(record, current, depth, stack, ips).await;
            stack.pop();
            result
        })
    }

    async fn collect_ips_inner(
        &mut self,
        record: &str,
        current: &str,
        depth: usize,
        stack: &mut Vec<String>,
        ips: &mut BTreeSet<String>,
    ) -> Result<(), CoreError> {
        for token in record.split_whitespace() {
            if let Some(include) = token.strip_prefix("include:") {
                let records = self.cached_txt(include).await?;
                for rec in records
                    .iter()
                    .filter(|r| r.starts_with("v=spf1"))
                    .cloned()
                    .collect::<Vec<_>>()
                {
                    self.collect_ips(&rec, include, depth + 1, stack, ips)
                        .await?;
                }
            } else if token.starts_with("ip4:") || token.starts_with("ip6:") {
                // CIDR notation preserved verbatim.
                ips.insert(token.to_string());
            } else if token == "a" || token.starts_with("a:") {
                let target = token.strip_prefix("a:").unwrap_or(current);
                self.add_host_ips(target, ips).await;
            } else if token == "mx" || token.starts_with("mx:") {
                let target = token.strip_prefix("mx:").unwrap_or(current);
                let Ok(hosts) = self.resolver.lookup_mx(target).await else {
                    continue;
                };
                for mx in hosts {
                    self.add_host_ips(&mx.host, ips).await;
                }
            }
            // ptr is dropped by policy; qualifiers and modifiers
            // (redirect=, exp=, exists:) contribute no addresses.
        }
        Ok(())
    }

    /// A/AAAA lookup for one host; unresolvable hosts are skipped, the
    /// remaining mechanisms still flatten.
    async fn add_host_ips(&mut self, host: &str, ips: &mut BTreeSet<String>) {
        let Ok(addrs) = self.resolver.lookup_ip(host).await else {
            return;
        };
        for addr in addrs {
            match addr {
                IpAddr::V4(v4) => ips.insert(format!("ip4:{v4}")),
                IpAddr::V6(v6) => ips.insert(format!("ip6:{v6}")),
            };
        }
    }

    // ── Threshold gate ───────────────────────────────────────────────

    /// Flatten only when the record exceeds the RFC 7208 lookup budget,
    /// or when `force` is set.
    pub async fn flatten_with_threshold(
        &mut self,
        domain: &str,
        aggregate: bool,
        force: bool,
    ) -> Result<FlattenOutcome, CoreError> {
        let lookup_count = self.count_lookups(domain).await?;

        let records = self.cached_txt(domain).await?;
        let original = find_spf(&records).ok_or_else(|| CoreError::NoSpfRecord {
            domain: domain.to_string(),
        })?;

        if lookup_count <= MAX_DNS_LOOKUPS && !force {
            return Ok(FlattenOutcome {
                flattened: original.clone(),
                original,
                lookup_count,
                was_flattened: false,
            });
        }

        let (original, flattened) = self.flatten(domain, aggregate).await?;
        Ok(FlattenOutcome {
            original,
            flattened,
            lookup_count,
            was_flattened: true,
        })
    }
}

/// The first TXT record that is an SPF policy.
fn find_spf(records: &[String]) -> Option<String> {
    records.iter().find(|r| r.starts_with("v=spf1")).cloned()
}
