// spfflat-core: SPF flattening, CIDR aggregation, reconciliation, and
// the backup/restore engine. Sits between the provider clients
// (spfflat-provider) and consumers (the CLI).

pub mod backup;
pub mod dns;
pub mod error;
pub mod limiter;
pub mod reconcile;
pub mod retry;
pub mod schedule;
pub mod spf;
pub mod task;

#[cfg(test)]
mod testing;

// ── Primary re-exports ──────────────────────────────────────────────
pub use error::CoreError;
pub use limiter::RateLimiter;
pub use reconcile::{DomainReport, MutationPlan, ReconcileEngine};
pub use retry::{with_retry, RetryPolicy};
pub use schedule::{group_by_provider, run_bounded, ProviderGroup, DEFAULT_WORKER_LIMIT};
pub use task::{DomainTask, TaskOptions, DEFAULT_TTL};

pub use backup::{
    BackupEngine, BackupFormat, BackupRecord, ConflictStrategy, ExportOptions, ImportOptions,
    ImportReport, RecordSet,
};
pub use backup::validation::is_valid_domain_name;
pub use dns::{AnyResolver, DnsResolver, MockResolver, StaticResolver, SystemResolver};
pub use spf::{AggregationPolicy, FlattenOutcome, Flattener};
