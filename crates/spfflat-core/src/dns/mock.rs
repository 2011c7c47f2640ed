//! In-memory resolver for tests.

use std::collections::HashMap;
use std::net::IpAddr;
use std::sync::{Arc, RwLock};

use super::{DnsError, DnsResolver, MxHost};

/// Map-backed resolver; missing names answer NXDOMAIN. Lookups are
/// case-insensitive on the queried name, as real resolvers are.
#[derive(Clone, Default)]
pub struct MockResolver {
    txt: Arc<RwLock<HashMap<String, Vec<String>>>>,
    ips: Arc<RwLock<HashMap<String, Vec<IpAddr>>>>,
    mx: Arc<RwLock<HashMap<String, Vec<MxHost>>>>,
}

impl MockResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_txt(&self, name: &str, records: Vec<&str>) {
        self.txt.write().unwrap().insert(
            name.to_lowercase(),
            records.into_iter().map(String::from).collect(),
        );
    }

    pub fn add_ips(&self, name: &str, addrs: Vec<&str>) {
        self.ips.write().unwrap().insert(
            name.to_lowercase(),
            addrs.into_iter().map(|a| a.parse().unwrap()).collect(),
        );
    }

    pub fn add_mx(&self, name: &str, hosts: Vec<(&str, u16)>) {
        self.mx.write().unwrap().insert(
            name.to_lowercase(),
            hosts
                .into_iter()
                .map(|(host, pref)| MxHost { host: host.into(), pref })
                .collect(),
        );
    }
}

impl DnsResolver for MockResolver {
    async fn lookup_txt(&self, name: &str) -> Result<Vec<String>, DnsError> {
        self.txt
            .read()
            .unwrap()
            .get(&name.to_lowercase())
            .cloned()
            .ok_or(DnsError::NxDomain)
    }

    async fn lookup_ip(&self, name: &str) -> Result<Vec<IpAddr>, DnsError> {
        self.ips
            .read()
            .unwrap()
            .get(&name.to_lowercase())
            .cloned()
            .ok_or(DnsError::NxDomain)
    }

    async fn lookup_mx(&self, name: &str) -> Result<Vec<MxHost>, DnsError> {
        self.mx
            .read()
            .unwrap()
            .get(&name.to_lowercase())
            .cloned()
            .ok_or(DnsError::NxDomain)
    }
}
