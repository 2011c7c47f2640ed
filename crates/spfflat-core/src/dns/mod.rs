//! DNS lookup abstraction for SPF resolution.
//!
//! The `DnsResolver` trait covers the three lookups SPF expansion needs
//! (TXT, A/AAAA, MX); every response passes through the validation rules
//! here before the resolver returns it. Caching is the flattener's
//! responsibility, not the resolver's.

use std::future::Future;
use std::net::IpAddr;

use thiserror::Error;

pub mod hickory;
pub mod mock;

pub use hickory::{StaticResolver, SystemResolver};
pub use mock::MockResolver;

/// Upper bound on a single TXT record; longer responses are dropped.
const MAX_TXT_RECORD_LEN: usize = 4096;
/// Standard DNS domain name limit.
const MAX_HOSTNAME_LEN: usize = 253;

#[derive(Debug, Clone, Error)]
pub enum DnsError {
    #[error("name does not exist")]
    NxDomain,
    #[error("server failure")]
    ServFail,
    #[error("lookup timed out")]
    Timeout,
    #[error("{0}")]
    Other(String),
}

impl DnsError {
    /// Timeouts and SERVFAIL are worth retrying; NXDOMAIN and malformed
    /// responses are not.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Timeout | Self::ServFail)
    }
}

/// An MX target as returned by `lookup_mx`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MxHost {
    pub host: String,
    pub pref: u16,
}

pub trait DnsResolver: Clone + Send + Sync {
    /// TXT records for `name`, post-validation.
    fn lookup_txt(
        &self,
        name: &str,
    ) -> impl Future<Output = Result<Vec<String>, DnsError>> + Send;

    /// A and AAAA records for `name`, post-validation.
    fn lookup_ip(&self, name: &str) -> impl Future<Output = Result<Vec<IpAddr>, DnsError>> + Send;

    /// MX records for `name`, post-validation.
    fn lookup_mx(&self, name: &str)
        -> impl Future<Output = Result<Vec<MxHost>, DnsError>> + Send;
}

/// Config-selected resolver: system stub, or an explicit server list.
#[derive(Clone)]
pub enum AnyResolver {
    System(SystemResolver),
    Static(StaticResolver),
}

impl AnyResolver {
    /// A resolver for the given `IP[:port]` list; empty list means the
    /// system resolver.
    pub fn from_servers(servers: &[String]) -> Result<Self, DnsError> {
        if servers.is_empty() {
            Ok(Self::System(SystemResolver::new()?))
        } else {
            Ok(Self::Static(StaticResolver::new(servers)?))
        }
    }
}

impl DnsResolver for AnyResolver {
    async fn lookup_txt(&self, name: &str) -> Result<Vec<String>, DnsError> {
        match self {
            Self::System(r) => r.lookup_txt(name).await,
            Self::Static(r) => r.lookup_txt(name).await,
        }
    }

    async fn lookup_ip(&self, name: &str) -> Result<Vec<IpAddr>, DnsError> {
        match self {
            Self::System(r) => r.lookup_ip(name).await,
            Self::Static(r) => r.lookup_ip(name).await,
        }
    }

    async fn lookup_mx(&self, name: &str) -> Result<Vec<MxHost>, DnsError> {
        match self {
            Self::System(r) => r.lookup_mx(name).await,
            Self::Static(r) => r.lookup_mx(name).await,
        }
    }
}

// ── Response validation ──────────────────────────────────────────────

/// Keep only TXT records that are printable ASCII and within length bounds.
pub(crate) fn validate_txt_records(records: Vec<String>) -> Vec<String> {
    records
        .into_iter()
        .filter(|r| r.len() <= MAX_TXT_RECORD_LEN && is_printable_ascii(r))
        .collect()
}

/// Drop nil and unspecified addresses (`0.0.0.0`, `::`).
pub(crate) fn validate_ip_addresses(ips: Vec<IpAddr>) -> Vec<IpAddr> {
    ips.into_iter().filter(|ip| !ip.is_unspecified()).collect()
}

/// Drop MX entries with empty, overlong, or malformed hostnames.
pub(crate) fn validate_mx_hosts(hosts: Vec<MxHost>) -> Vec<MxHost> {
    hosts
        .into_iter()
        .filter(|mx| is_valid_mx_hostname(&mx.host))
        .collect()
}

fn is_printable_ascii(s: &str) -> bool {
    s.bytes().all(|b| (32..=126).contains(&b))
}

fn is_valid_mx_hostname(hostname: &str) -> bool {
    let hostname = hostname.trim_end_matches('.');
    if hostname.is_empty() || hostname.len() > MAX_HOSTNAME_LEN {
        return false;
    }
    hostname
        .bytes()
        .all(|b| b.is_ascii_alphanumeric() || b == b'.' || b == b'-')
}
