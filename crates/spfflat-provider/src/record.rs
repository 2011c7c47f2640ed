//! Provider-side record and response types.
//!
//! `ProviderRecord` is the typed shape the rest of the workspace consumes.
//! The `wire` module holds the raw JSON shapes providers actually return
//! (Porkbun serializes TTL and priority as strings); each client converts
//! at its own boundary.

use serde::{Deserialize, Serialize};

/// A DNS record as known to the provider.
///
/// `id` is opaque and provider-assigned. `name` is the FQDN as returned
/// by the provider; callers normalize (trailing-dot strip, apex → `"@"`)
/// where required.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderRecord {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub record_type: String,
    pub content: String,
    pub ttl: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl ProviderRecord {
    /// Record name with any trailing dot removed.
    pub fn normalized_name(&self) -> &str {
        self.name.trim_end_matches('.')
    }
}

/// Fields for a record create/update call. `name` is the host part
/// relative to the zone (`""` or omitted for the apex).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecordPayload {
    pub name: String,
    pub record_type: String,
    pub content: String,
    pub ttl: u32,
    pub priority: Option<u16>,
    pub notes: Option<String>,
}

impl RecordPayload {
    pub fn txt(name: impl Into<String>, content: impl Into<String>, ttl: u32) -> Self {
        Self {
            name: name.into(),
            record_type: "TXT".into(),
            content: content.into(),
            ttl,
            priority: None,
            notes: None,
        }
    }
}

/// Result of a credential/reachability check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PingOutcome {
    pub status: String,
    /// The caller's public IP as observed by the provider.
    pub observed_ip: String,
}

impl PingOutcome {
    pub fn is_success(&self) -> bool {
        self.status == "SUCCESS"
    }
}

/// Raw JSON response shapes, per provider.
pub mod wire {
    use super::*;

    /// Porkbun `POST /ping` response.
    #[derive(Debug, Deserialize)]
    pub struct PingResponse {
        pub status: String,
        #[serde(rename = "yourIp", default)]
        pub your_ip: String,
    }

    /// Porkbun `POST /dns/retrieve/{domain}` response.
    #[derive(Debug, Deserialize)]
    pub struct RetrieveResponse {
        pub status: String,
        #[serde(default)]
        pub records: Vec<RetrievedRecord>,
    }

    /// Porkbun serializes numeric fields as strings.
    #[derive(Debug, Deserialize)]
    pub struct RetrievedRecord {
        pub id: String,
        pub name: String,
        #[serde(rename = "type")]
        pub record_type: String,
        pub content: String,
        #[serde(default)]
        pub ttl: String,
        #[serde(default)]
        pub prio: String,
        #[serde(default)]
        pub notes: Option<String>,
    }

    impl From<RetrievedRecord> for ProviderRecord {
        fn from(r: RetrievedRecord) -> Self {
            ProviderRecord {
                id: r.id,
                name: r.name,
                record_type: r.record_type,
                content: r.content,
                // Porkbun's zone default when the field is absent or garbled.
                ttl: r.ttl.parse().unwrap_or(600),
                priority: r.prio.parse().ok().filter(|p| *p > 0),
                notes: r.notes.filter(|n| !n.is_empty()),
            }
        }
    }

    /// Porkbun `POST /dns/create/{domain}` response.
    #[derive(Debug, Deserialize)]
    pub struct CreateResponse {
        pub status: String,
        #[serde(default)]
        pub id: Option<i64>,
        #[serde(default)]
        pub message: Option<String>,
    }

    /// Shared shape for edit/delete acknowledgements.
    #[derive(Debug, Deserialize)]
    pub struct StatusResponse {
        pub status: String,
        #[serde(default)]
        pub message: Option<String>,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn retrieved_record_conversion_parses_string_fields() {
        let raw = wire::RetrievedRecord {
            id: "106926652".into(),
            name: "spf0.example.com".into(),
            record_type: "TXT".into(),
            content: "v=spf1 ip4:192.0.2.1 ~all".into(),
            ttl: "600".into(),
            prio: "0".into(),
            notes: Some(String::new()),
        };
        let rec = ProviderRecord::from(raw);
        assert_eq!(rec.ttl, 600);
        assert_eq!(rec.priority, None);
        assert_eq!(rec.notes, None);
    }

    #[test]
    fn unparseable_ttl_falls_back_to_default() {
        let raw = wire::RetrievedRecord {
            id: "1".into(),
            name: "example.com".into(),
            record_type: "MX".into(),
            content: "mail.example.com".into(),
            ttl: String::new(),
            prio: "10".into(),
            notes: None,
        };
        let rec = ProviderRecord::from(raw);
        assert_eq!(rec.ttl, 600);
        assert_eq!(rec.priority, Some(10));
    }

    #[test]
    fn normalized_name_strips_trailing_dot() {
        let rec = ProviderRecord {
            id: "1".into(),
            name: "spf1.example.com.".into(),
            record_type: "TXT".into(),
            content: String::new(),
            ttl: 600,
            priority: None,
            notes: None,
        };
        assert_eq!(rec.normalized_name(), "spf1.example.com");
    }
}
