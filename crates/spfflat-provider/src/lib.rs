//! DNS provider API clients for spfflat.
//!
//! The `ProviderClient` trait defines the capability set (CRUD + bulk ops
//! over a zone's records, credential ping, attribution); `PorkbunClient`
//! is the first concrete backend. New providers implement the trait and
//! plug in at config-load time.

pub mod client;
pub mod error;
pub mod porkbun;
pub mod record;
pub mod transport;

// ── Primary re-exports ──────────────────────────────────────────────
pub use client::ProviderClient;
pub use error::{redact_secrets, Error};
pub use porkbun::PorkbunClient;
pub use record::{PingOutcome, ProviderRecord, RecordPayload};
pub use transport::TransportConfig;
