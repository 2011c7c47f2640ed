use thiserror::Error;

use crate::dns::DnsError;

/// Unified error type for the core crate.
///
/// Per-domain failures (SPF resolution, validation) carry the domain so
/// the scheduler can attribute them to the right task report without
/// extra bookkeeping.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── SPF resolution ──────────────────────────────────────────────
    /// No TXT record beginning with `v=spf1` was published.
    #[error("no SPF record found for {domain}")]
    NoSpfRecord { domain: String },

    /// A domain appeared twice on the current include-expansion path.
    #[error("recursion detected for domain {domain}")]
    RecursionDetected { domain: String },

    /// Include expansion exceeded the depth cap of 10.
    #[error("recursion depth exceeded for {domain}")]
    DepthExceeded { domain: String },

    /// DNS lookup failure while resolving an SPF record.
    #[error("DNS lookup failed for {domain}: {source}")]
    Dns {
        domain: String,
        #[source]
        source: DnsError,
    },

    /// A record failed SPF syntax requirements (missing `v=spf1`, empty).
    #[error("invalid SPF record: {0}")]
    InvalidSpf(String),

    // ── Provider ────────────────────────────────────────────────────
    #[error(transparent)]
    Provider(#[from] spfflat_provider::Error),

    /// A provider operation still failed after the retry budget.
    #[error("{operation} failed after {attempts} attempts")]
    RetriesExhausted {
        operation: String,
        attempts: u32,
        #[source]
        source: Box<CoreError>,
    },

    // ── Backup / validation ─────────────────────────────────────────
    /// One or more records were rejected by validation.
    #[error("validation failed for {domain}: {}", errors.join("; "))]
    Validation {
        domain: String,
        errors: Vec<String>,
    },

    /// A record type outside the supported allowlist was requested.
    #[error("invalid DNS record type: {0}")]
    InvalidRecordType(String),

    /// A backup payload could not be serialized or parsed.
    #[error("backup format error: {0}")]
    BackupFormat(String),

    /// Import ran with the abort strategy and hit an existing record.
    #[error("import conflict for {domain}: {message}")]
    ImportConflict { domain: String, message: String },

    /// The provider answered a ping with a non-SUCCESS status.
    #[error("provider ping returned non-success status: {status}")]
    PingFailed { status: String },

    // ── Control flow ────────────────────────────────────────────────
    /// The operation was cancelled; partial results may exist.
    #[error("operation cancelled")]
    Cancelled,
}

impl CoreError {
    /// Whether the retry wrapper should attempt this operation again.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Provider(e) => e.is_rate_limited() || e.is_transient(),
            Self::Dns { source, .. } => source.is_transient(),
            _ => false,
        }
    }
}
