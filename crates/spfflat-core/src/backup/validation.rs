//! Type-aware DNS record validation for backup and import.

use std::collections::HashSet;
use std::net::{IpAddr, Ipv4Addr};

use crate::backup::types::{BackupRecord, RecordSet};
use crate::error::CoreError;

/// Closed allowlist of record types backup understands.
pub const VALID_RECORD_TYPES: &[&str] = &[
    "A", "AAAA", "CNAME", "MX", "TXT", "NS", "SOA", "SRV", "PTR", "CAA", "DNSKEY", "DS", "RRSIG",
    "NSEC", "NSEC3", "NSEC3PARAM",
];

const MIN_TTL: u32 = 1;
const MAX_TTL: u32 = 86_400;

/// Uppercase and check a record type against the allowlist.
pub fn normalize_record_type(record_type: &str) -> Result<String, CoreError> {
    let normalized = record_type.to_uppercase();
    if VALID_RECORD_TYPES.contains(&normalized.as_str()) {
        Ok(normalized)
    } else {
        Err(CoreError::InvalidRecordType(record_type.to_string()))
    }
}

/// Validate and dedupe a user-supplied record-type filter list.
pub fn validate_record_types(record_types: &[String]) -> Result<Vec<String>, CoreError> {
    let mut seen = HashSet::new();
    let mut normalized = Vec::new();
    for record_type in record_types {
        let rt = normalize_record_type(record_type)?;
        if seen.insert(rt.clone()) {
            normalized.push(rt);
        }
    }
    Ok(normalized)
}

/// Accumulated findings from validating a record or record set.
#[derive(Debug, Default)]
pub struct ValidationReport {
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

impl ValidationReport {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    fn error(&mut self, message: impl Into<String>) {
        self.errors.push(message.into());
    }

    fn warn(&mut self, message: impl Into<String>) {
        self.warnings.push(message.into());
    }
}

/// Validate a single record against DNS standards.
pub fn validate_record(record: &BackupRecord) -> ValidationReport {
    let mut report = ValidationReport::default();

    if record.name.is_empty() {
        report.error("record name is required");
    }
    if record.record_type.is_empty() {
        report.error("record type is required");
    }
    if record.content.is_empty() {
        report.error("record content is required");
    }
    if normalize_record_type(&record.record_type).is_err() && !record.record_type.is_empty() {
        report.error(format!("invalid record type: {}", record.record_type));
    }
    if !(MIN_TTL..=MAX_TTL).contains(&record.ttl) {
        report.error(format!(
            "invalid TTL: {} (must be between {MIN_TTL} and {MAX_TTL} seconds)",
            record.ttl
        ));
    }

    match record.record_type.to_uppercase().as_str() {
        "A" => validate_a(record, &mut report),
        "AAAA" => validate_aaaa(record, &mut report),
        "CNAME" => validate_cname(record, &mut report),
        "MX" => validate_mx(record, &mut report),
        "TXT" => validate_txt(record, &mut report),
        "NS" | "PTR" => validate_domain_content(record, &mut report),
        "SOA" => validate_soa(record, &mut report),
        "SRV" => validate_srv(record, &mut report),
        "CAA" => validate_caa(record, &mut report),
        _ => {}
    }

    if record.name != "@"
        && !is_valid_domain_name(&record.name)
        && !is_valid_service_name(&record.name, &record.record_type)
    {
        report.error(format!("invalid domain name format: {}", record.name));
    }

    report
}

/// Validate a whole record set; an empty set is an error the export path
/// downgrades to a warning.
pub fn validate_record_set(set: &RecordSet) -> ValidationReport {
    let mut report = ValidationReport::default();

    if set.domain.is_empty() {
        report.error("record set domain is required");
    }
    if set.provider.is_empty() {
        report.error("record set provider is required");
    }
    if set.records.is_empty() {
        report.error("record set must contain at least one record");
    }

    for (i, record) in set.records.iter().enumerate() {
        let inner = validate_record(record);
        for err in inner.errors {
            report.error(format!(
                "record {} ({} {}): {err}",
                i + 1,
                record.name,
                record.record_type
            ));
        }
        for warning in inner.warnings {
            report.warn(format!(
                "record {} ({} {}): {warning}",
                i + 1,
                record.name,
                record.record_type
            ));
        }
    }

    check_duplicates(set, &mut report);
    report
}

// ── Per-type checks ──────────────────────────────────────────────────

fn validate_a(record: &BackupRecord, report: &mut ValidationReport) {
    if record.content.parse::<Ipv4Addr>().is_err() {
        report.error(format!("invalid IPv4 address: {}", record.content));
    }
}

fn validate_aaaa(record: &BackupRecord, report: &mut ValidationReport) {
    match record.content.parse::<IpAddr>() {
        Ok(IpAddr::V6(v6)) if v6.to_ipv4_mapped().is_none() => {}
        _ => report.error(format!("invalid IPv6 address: {}", record.content)),
    }
}

fn validate_cname(record: &BackupRecord, report: &mut ValidationReport) {
    if record.name == "@" {
        report.error("CNAME records cannot be used for the domain root (@)");
    }
    if !is_valid_domain_name(&record.content) {
        report.error(format!("invalid CNAME target: {}", record.content));
    }
}

fn validate_mx(record: &BackupRecord, report: &mut ValidationReport) {
    match record.priority {
        Some(p) if p >= 1 => {}
        _ => report.error("invalid MX priority: must be between 1 and 65535"),
    }
    if !is_valid_domain_name(&record.content) {
        report.error(format!("invalid MX mail server: {}", record.content));
    }
}

fn validate_txt(record: &BackupRecord, report: &mut ValidationReport) {
    if record.content.len() > 255 {
        report.warn(format!(
            "TXT record content is very long ({} characters); consider splitting into multiple records",
            record.content.len()
        ));
    }
    if record.content.starts_with("v=spf1") {
        validate_spf_content(&record.content, report);
    }
}

fn validate_spf_content(content: &str, report: &mut ValidationReport) {
    if content.contains("include:_spf.google.com")
        && !content.contains("~all")
        && !content.contains("-all")
    {
        report.warn("SPF record with Google include should end with ~all or -all");
    }
    if content.len() > 450 {
        report.warn("SPF record is very long; consider using include mechanisms to reduce length");
    }
}

fn validate_domain_content(record: &BackupRecord, report: &mut ValidationReport) {
    if !is_valid_domain_name(&record.content) {
        report.error(format!(
            "invalid {} target: {}",
            record.record_type, record.content
        ));
    }
}

fn validate_soa(record: &BackupRecord, report: &mut ValidationReport) {
    let parts: Vec<&str> = record.content.split_whitespace().collect();
    if parts.len() != 7 {
        report.error("SOA record must have exactly 7 fields: MNAME RNAME SERIAL REFRESH RETRY EXPIRE MINIMUM");
        return;
    }
    if !is_valid_domain_name(parts[0]) {
        report.error(format!("invalid SOA MNAME (primary nameserver): {}", parts[0]));
    }
    if !is_valid_soa_rname(parts[1]) {
        report.error(format!("invalid SOA RNAME (admin email): {}", parts[1]));
    }
    let field_names = ["SERIAL", "REFRESH", "RETRY", "EXPIRE", "MINIMUM"];
    for (i, field) in parts[2..].iter().enumerate() {
        if field.parse::<i32>().is_err() {
            report.error(format!("invalid SOA {}: {field}", field_names[i]));
        }
    }
}

fn validate_srv(record: &BackupRecord, report: &mut ValidationReport) {
    let parts: Vec<&str> = record.content.split_whitespace().collect();
    if parts.len() != 4 {
        report.error("SRV record must have exactly 4 fields: priority weight port target");
        return;
    }
    let field_names = ["priority", "weight", "port"];
    for (i, field) in parts[..3].iter().enumerate() {
        if field.parse::<u16>().is_err() {
            report.error(format!("invalid SRV {}: {field}", field_names[i]));
        }
    }
    if !is_valid_domain_name(parts[3]) {
        report.error(format!("invalid SRV target: {}", parts[3]));
    }
}

fn validate_caa(record: &BackupRecord, report: &mut ValidationReport) {
    let parts: Vec<&str> = record.content.split_whitespace().collect();
    if parts.len() != 3 {
        report.error("CAA record must have exactly 3 fields: flags tag value");
        return;
    }
    if !matches!(parts[1], "issue" | "issuewild" | "iodef") {
        report.error(format!(
            "invalid CAA tag: {} (must be 'issue', 'issuewild', or 'iodef')",
            parts[1]
        ));
    }
}

// ── Domain-name validation (RFC 1035 / RFC 1123) ─────────────────────

/// Validate a DNS name: total length <= 253, labels 1-63 chars starting
/// and ending alphanumeric, `[A-Za-z0-9-]` inside. Labels prefixed with
/// `_` (service labels like `_dmarc`) are additionally accepted and may
/// contain `_`.
pub fn is_valid_domain_name(domain: &str) -> bool {
    if domain == "@" {
        return true;
    }
    let domain = domain.trim_end_matches('.');
    if domain.is_empty() || domain.len() > 253 {
        return false;
    }
    domain.split('.').all(is_valid_label)
}

fn is_valid_label(label: &str) -> bool {
    let bytes = label.as_bytes();
    if bytes.is_empty() || bytes.len() > 63 {
        return false;
    }
    if bytes[0] == b'_' {
        return bytes.len() > 1
            && bytes[1..]
                .iter()
                .all(|b| b.is_ascii_alphanumeric() || *b == b'-' || *b == b'_');
    }
    bytes[0].is_ascii_alphanumeric()
        && bytes[bytes.len() - 1].is_ascii_alphanumeric()
        && bytes.iter().all(|b| b.is_ascii_alphanumeric() || *b == b'-')
}

/// SRV owner names follow `_service._protocol[.rest]`.
fn is_valid_service_name(name: &str, record_type: &str) -> bool {
    if !record_type.eq_ignore_ascii_case("SRV") {
        return false;
    }
    let mut labels = name.split('.');
    let (Some(service), Some(protocol)) = (labels.next(), labels.next()) else {
        return false;
    };
    let underscore_label = |l: &str| {
        l.len() > 1
            && l.starts_with('_')
            && l[1..].bytes().all(|b| b.is_ascii_alphanumeric() || b == b'-')
    };
    underscore_label(service) && underscore_label(protocol)
}

/// SOA RNAME encodes the admin mailbox with dots (`user.domain.tld`).
fn is_valid_soa_rname(rname: &str) -> bool {
    rname.contains('.')
        && rname.bytes().all(|b| {
            b.is_ascii_alphanumeric() || matches!(b, b'.' | b'_' | b'%' | b'+' | b'-')
        })
}

fn check_duplicates(set: &RecordSet, report: &mut ValidationReport) {
    let mut seen = HashSet::new();
    for (i, record) in set.records.iter().enumerate() {
        let key = format!("{}:{}:{}", record.name, record.record_type, record.content);
        if !seen.insert(key) {
            report.warn(format!(
                "duplicate record found at position {}: {} {} -> {}",
                i + 1,
                record.name,
                record.record_type,
                record.content
            ));
        }
    }
}
