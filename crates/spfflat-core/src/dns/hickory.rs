//! hickory-resolver backed implementations of `DnsResolver`.
//!
//! `SystemResolver` delegates to the OS stub configuration.
//! `StaticResolver` queries an explicit server list and falls back to the
//! system resolver when the configured servers cannot answer; both hold a
//! single reusable resolver for the lifetime of the process.

use std::net::{IpAddr, SocketAddr};

use hickory_resolver::config::{NameServerConfigGroup, ResolverConfig};
use hickory_resolver::name_server::TokioConnectionProvider;
use hickory_resolver::{ResolveError, TokioResolver};
use tracing::debug;

use super::{
    validate_ip_addresses, validate_mx_hosts, validate_txt_records, DnsError, DnsResolver, MxHost,
};

fn map_resolve_error(e: ResolveError) -> DnsError {
    if e.is_nx_domain() {
        DnsError::NxDomain
    } else {
        let text = e.to_string();
        if text.contains("timed out") || text.contains("timeout") {
            DnsError::Timeout
        } else {
            DnsError::Other(text)
        }
    }
}

async fn txt_lookup(resolver: &TokioResolver, name: &str) -> Result<Vec<String>, DnsError> {
    let lookup = resolver
        .txt_lookup(name)
        .await
        .map_err(map_resolve_error)?;
    // Multi-string TXT records are concatenated into one logical record.
    let records = lookup.iter().map(|txt| txt.to_string()).collect();
    Ok(validate_txt_records(records))
}

async fn ip_lookup(resolver: &TokioResolver, name: &str) -> Result<Vec<IpAddr>, DnsError> {
    let v4 = resolver.ipv4_lookup(name).await;
    let v6 = resolver.ipv6_lookup(name).await;

    let mut ips: Vec<IpAddr> = Vec::new();
    match (&v4, &v6) {
        (Err(e4), Err(_)) => return Err(map_resolve_error(e4.clone())),
        _ => {
            if let Ok(lookup) = v4 {
                ips.extend(lookup.iter().map(|a| IpAddr::V4(a.0)));
            }
            if let Ok(lookup) = v6 {
                ips.extend(lookup.iter().map(|a| IpAddr::V6(a.0)));
            }
        }
    }
    Ok(validate_ip_addresses(ips))
}

async fn mx_lookup(resolver: &TokioResolver, name: &str) -> Result<Vec<MxHost>, DnsError> {
    let lookup = resolver.mx_lookup(name).await.map_err(map_resolve_error)?;
    let hosts = lookup
        .iter()
        .map(|mx| MxHost {
            host: mx.exchange().to_utf8(),
            pref: mx.preference(),
        })
        .collect();
    Ok(validate_mx_hosts(hosts))
}

// ── System resolver ──────────────────────────────────────────────────

/// Delegates every lookup to the OS-configured resolver.
#[derive(Clone)]
pub struct SystemResolver {
    resolver: TokioResolver,
}

impl SystemResolver {
    pub fn new() -> Result<Self, DnsError> {
        let builder = TokioResolver::builder_tokio()
            .map_err(|e| DnsError::Other(format!("failed to read system DNS config: {e}")))?;
        Ok(Self {
            resolver: builder.build(),
        })
    }
}

impl DnsResolver for SystemResolver {
    async fn lookup_txt(&self, name: &str) -> Result<Vec<String>, DnsError> {
        txt_lookup(&self.resolver, name).await
    }

    async fn lookup_ip(&self, name: &str) -> Result<Vec<IpAddr>, DnsError> {
        ip_lookup(&self.resolver, name).await
    }

    async fn lookup_mx(&self, name: &str) -> Result<Vec<MxHost>, DnsError> {
        mx_lookup(&self.resolver, name).await
    }
}

// ── Explicit-servers resolver ────────────────────────────────────────

/// Queries a fixed list of `IP:port` servers (port 53 assumed when
/// absent), falling back to the system resolver if the configured
/// servers fail or return no usable answer.
#[derive(Clone)]
pub struct StaticResolver {
    primary: TokioResolver,
    fallback: SystemResolver,
}

impl StaticResolver {
    pub fn new(servers: &[String]) -> Result<Self, DnsError> {
        let mut group = NameServerConfigGroup::new();
        for server in servers {
            let addr = parse_server_addr(server)?;
            group.merge(NameServerConfigGroup::from_ips_clear(
                &[addr.ip()],
                addr.port(),
                true,
            ));
        }
        if group.is_empty() {
            return Err(DnsError::Other("no DNS servers configured".into()));
        }

        let config = ResolverConfig::from_parts(None, Vec::new(), group);
        let primary =
            TokioResolver::builder_with_config(config, TokioConnectionProvider::default()).build();

        Ok(Self {
            primary,
            fallback: SystemResolver::new()?,
        })
    }
}

/// Parse `"ip"` or `"ip:port"`; bare IPv6 addresses are accepted without
/// a port.
fn parse_server_addr(server: &str) -> Result<SocketAddr, DnsError> {
    if let Ok(addr) = server.parse::<SocketAddr>() {
        return Ok(addr);
    }
    if let Ok(ip) = server.parse::<IpAddr>() {
        return Ok(SocketAddr::new(ip, 53));
    }
    Err(DnsError::Other(format!("invalid DNS server address: {server}")))
}

impl DnsResolver for StaticResolver {
    // A non-success answer from the configured servers (including
    // NXDOMAIN) falls through to the system resolver, matching the
    // rcode handling of the configured-server loop this replaces.
    async fn lookup_txt(&self, name: &str) -> Result<Vec<String>, DnsError> {
        match txt_lookup(&self.primary, name).await {
            Ok(records) if !records.is_empty() => Ok(records),
            _ => {
                debug!("configured DNS servers failed TXT {name}, falling back to system");
                txt_lookup(&self.fallback.resolver, name).await
            }
        }
    }

    async fn lookup_ip(&self, name: &str) -> Result<Vec<IpAddr>, DnsError> {
        match ip_lookup(&self.primary, name).await {
            Ok(ips) if !ips.is_empty() => Ok(ips),
            _ => {
                debug!("configured DNS servers failed A/AAAA {name}, falling back to system");
                ip_lookup(&self.fallback.resolver, name).await
            }
        }
    }

    async fn lookup_mx(&self, name: &str) -> Result<Vec<MxHost>, DnsError> {
        match mx_lookup(&self.primary, name).await {
            Ok(hosts) if !hosts.is_empty() => Ok(hosts),
            _ => {
                debug!("configured DNS servers failed MX {name}, falling back to system");
                mx_lookup(&self.fallback.resolver, name).await
            }
        }
    }
}
