//! DNS record backup and restore.
//!
//! Export pings the provider, retrieves the zone through the retry
//! wrapper, validates, and hands back a `RecordSet` ready for
//! serialization. Import validates up front, then walks the payload
//! under a conflict-resolution strategy, reporting per-record outcomes.

pub mod format;
pub mod types;
pub mod validation;

use std::sync::Arc;

use chrono::Utc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use spfflat_provider::{ProviderClient, ProviderRecord, RecordPayload};

use crate::error::CoreError;
use crate::limiter::RateLimiter;
use crate::retry::{with_retry, RetryPolicy};

pub use format::BackupFormat;
pub use types::{
    BackupRecord, Conflict, ConflictStrategy, ExportOptions, ImportOptions, ImportReport,
    RecordSet, BACKUP_VERSION,
};
pub use validation::{validate_record, validate_record_set, ValidationReport};

const EMPTY_SET_ERROR: &str = "record set must contain at least one record";

/// Hostname part of `fqdn` relative to `domain`: `www.example.com` →
/// `www`, the apex → `@`, anything else unchanged.
pub fn hostname_from_fqdn(fqdn: &str, domain: &str) -> String {
    let fqdn = fqdn.trim_end_matches('.');
    if fqdn == domain {
        return "@".to_string();
    }
    fqdn.strip_suffix(&format!(".{domain}"))
        .unwrap_or(fqdn)
        .to_string()
}

pub struct BackupEngine {
    client: Arc<dyn ProviderClient>,
    limiter: Arc<RateLimiter>,
    retry: RetryPolicy,
    cancel: CancellationToken,
    dry_run: bool,
}

impl BackupEngine {
    pub fn new(
        client: Arc<dyn ProviderClient>,
        limiter: Arc<RateLimiter>,
        retry: RetryPolicy,
        cancel: CancellationToken,
        dry_run: bool,
    ) -> Self {
        Self {
            client,
            limiter,
            retry,
            cancel,
            dry_run,
        }
    }

    // ── Export ───────────────────────────────────────────────────────

    /// Export all (optionally type-filtered) records of `domain`.
    pub async fn export(
        &self,
        domain: &str,
        provider_tag: &str,
        options: &ExportOptions,
    ) -> Result<RecordSet, CoreError> {
        let type_filter = validation::validate_record_types(&options.record_types)?;

        self.ping_gate().await?;

        let records = self.fetch_records(domain).await?;
        info!(domain, count = records.len(), "retrieved records for export");

        let mut backup_records: Vec<BackupRecord> =
            records.into_iter().map(BackupRecord::from).collect();
        if !type_filter.is_empty() {
            backup_records.retain(|r| type_filter.contains(&r.record_type.to_uppercase()));
            debug!(domain, count = backup_records.len(), "applied record-type filter");
        }

        let set = RecordSet {
            domain: domain.to_string(),
            provider: provider_tag.to_string(),
            version: BACKUP_VERSION.to_string(),
            exported_at: Utc::now(),
            records: backup_records,
            attribution: Some(self.client.attribution().to_string()),
        };

        let report = validation::validate_record_set(&set);
        for warning in &report.warnings {
            warn!(domain, "{warning}");
        }
        if !report.is_valid() {
            // An empty zone is legal for export; anything else aborts.
            let hard_errors: Vec<String> = report
                .errors
                .iter()
                .filter(|e| *e != EMPTY_SET_ERROR)
                .cloned()
                .collect();
            if hard_errors.is_empty() {
                warn!(domain, "zone contains no records");
            } else {
                return Err(CoreError::Validation {
                    domain: domain.to_string(),
                    errors: hard_errors,
                });
            }
        }

        Ok(set)
    }

    // ── Import ───────────────────────────────────────────────────────

    /// Import a backup payload under the configured conflict strategy.
    pub async fn import(
        &self,
        set: &RecordSet,
        options: &ImportOptions,
    ) -> Result<ImportReport, CoreError> {
        let type_filter = validation::validate_record_types(&options.record_types)?;

        let mut records: Vec<BackupRecord> = set.records.clone();
        if !type_filter.is_empty() {
            records.retain(|r| type_filter.contains(&r.record_type.to_uppercase()));
        }
        if records.is_empty() {
            return Err(CoreError::BackupFormat(format!(
                "no records to import for {} after filtering",
                set.domain
            )));
        }

        // All records must validate before the first mutation.
        let filtered_set = RecordSet {
            records: records.clone(),
            ..set.clone()
        };
        let validation = validation::validate_record_set(&filtered_set);
        if !validation.is_valid() {
            return Err(CoreError::Validation {
                domain: set.domain.clone(),
                errors: validation.errors,
            });
        }

        let mut report = ImportReport {
            domain: set.domain.clone(),
            total: records.len(),
            ..ImportReport::default()
        };
        for warning in validation.warnings {
            report.conflicts.push(Conflict {
                existing: None,
                imported: records[0].clone(),
                kind: "validation_warning".into(),
                resolution: warning,
            });
        }

        let dry_run = self.dry_run || options.dry_run;
        let mut current: Vec<BackupRecord> = self
            .fetch_records(&set.domain)
            .await?
            .into_iter()
            .map(BackupRecord::from)
            .collect();

        for record in &records {
            if self.cancel.is_cancelled() {
                report.cancelled = true;
                break;
            }

            let hostname = hostname_from_fqdn(&record.name, &set.domain);
            let same_triple = current.iter().find(|c| {
                hostname_from_fqdn(&c.name, &set.domain) == hostname
                    && c.record_type.eq_ignore_ascii_case(&record.record_type)
                    && c.content == record.content
            });
            let same_name_type = current.iter().find(|c| {
                hostname_from_fqdn(&c.name, &set.domain) == hostname
                    && c.record_type.eq_ignore_ascii_case(&record.record_type)
            });

            if dry_run {
                report.skipped += 1;
                info!(
                    domain = %set.domain,
                    name = %record.name,
                    record_type = %record.record_type,
                    "dry-run: would import record"
                );
                continue;
            }

            match options.strategy {
                ConflictStrategy::Skip | ConflictStrategy::Merge => {
                    if let Some(existing) = same_triple {
                        report.skipped += 1;
                        report.conflicts.push(Conflict {
                            existing: Some(existing.clone()),
                            imported: record.clone(),
                            kind: "existing_record".into(),
                            resolution: "skipped".into(),
                        });
                        continue;
                    }
                    self.create_one(&set.domain, record, &hostname, &mut report, &mut current)
                        .await;
                }
                ConflictStrategy::Replace => {
                    if let Some(existing) = same_name_type.cloned() {
                        match self
                            .update_one(&set.domain, &existing.id, record, &hostname)
                            .await
                        {
                            Ok(()) => {
                                report.updated += 1;
                                if let Some(slot) =
                                    current.iter_mut().find(|c| c.id == existing.id)
                                {
                                    slot.content = record.content.clone();
                                    slot.ttl = record.ttl;
                                }
                                report.conflicts.push(Conflict {
                                    existing: Some(existing),
                                    imported: record.clone(),
                                    kind: "existing_record".into(),
                                    resolution: "replaced".into(),
                                });
                            }
                            Err(e) => {
                                report.failed += 1;
                                report.errors.push(format!(
                                    "failed to replace {} {}: {e}",
                                    record.name, record.record_type
                                ));
                            }
                        }
                        continue;
                    }
                    self.create_one(&set.domain, record, &hostname, &mut report, &mut current)
                        .await;
                }
                ConflictStrategy::Abort => {
                    if same_name_type.is_some() {
                        return Err(CoreError::ImportConflict {
                            domain: set.domain.clone(),
                            message: format!(
                                "record {} {} already exists",
                                record.name, record.record_type
                            ),
                        });
                    }
                    self.create_one(&set.domain, record, &hostname, &mut report, &mut current)
                        .await;
                }
            }
        }

        info!(
            domain = %report.domain,
            created = report.created,
            updated = report.updated,
            skipped = report.skipped,
            failed = report.failed,
            "import finished"
        );
        Ok(report)
    }

    // ── Provider plumbing ────────────────────────────────────────────

    async fn ping_gate(&self) -> Result<(), CoreError> {
        let client = Arc::clone(&self.client);
        let outcome = with_retry(&self.retry, &self.limiter, &self.cancel, "ping", move || {
            let client = Arc::clone(&client);
            async move { client.ping().await.map_err(CoreError::from) }
        })
        .await?;
        if !outcome.is_success() {
            return Err(CoreError::PingFailed {
                status: outcome.status,
            });
        }
        debug!(observed_ip = %outcome.observed_ip, "provider connectivity verified");
        Ok(())
    }

    async fn fetch_records(&self, domain: &str) -> Result<Vec<ProviderRecord>, CoreError> {
        let client = Arc::clone(&self.client);
        let domain = domain.to_string();
        with_retry(
            &self.retry,
            &self.limiter,
            &self.cancel,
            "retrieve records",
            move || {
                let client = Arc::clone(&client);
                let domain = domain.clone();
                async move { client.list_records(&domain).await.map_err(CoreError::from) }
            },
        )
        .await
    }

    async fn create_one(
        &self,
        domain: &str,
        record: &BackupRecord,
        hostname: &str,
        report: &mut ImportReport,
        current: &mut Vec<BackupRecord>,
    ) {
        match self.create_record(domain, record, hostname).await {
            Ok(id) => {
                report.created += 1;
                // Keep the local view current so later payload entries
                // see this record during conflict checks.
                current.push(BackupRecord {
                    id,
                    ..record.clone()
                });
            }
            Err(e) => {
                report.failed += 1;
                report.errors.push(format!(
                    "failed to import {} {}: {e}",
                    record.name, record.record_type
                ));
                report.conflicts.push(Conflict {
                    existing: None,
                    imported: record.clone(),
                    kind: "import_failure".into(),
                    resolution: String::new(),
                });
            }
        }
    }

    async fn create_record(
        &self,
        domain: &str,
        record: &BackupRecord,
        hostname: &str,
    ) -> Result<String, CoreError> {
        let client = Arc::clone(&self.client);
        let domain = domain.to_string();
        let payload = payload_for(record, hostname);
        with_retry(
            &self.retry,
            &self.limiter,
            &self.cancel,
            "create record",
            move || {
                let client = Arc::clone(&client);
                let (domain, payload) = (domain.clone(), payload.clone());
                async move {
                    client
                        .create_record(&domain, &payload)
                        .await
                        .map_err(CoreError::from)
                }
            },
        )
        .await
    }

    async fn update_one(
        &self,
        domain: &str,
        record_id: &str,
        record: &BackupRecord,
        hostname: &str,
    ) -> Result<(), CoreError> {
        let client = Arc::clone(&self.client);
        let (domain, record_id) = (domain.to_string(), record_id.to_string());
        let payload = payload_for(record, hostname);
        with_retry(
            &self.retry,
            &self.limiter,
            &self.cancel,
            "update record",
            move || {
                let client = Arc::clone(&client);
                let (domain, record_id, payload) =
                    (domain.clone(), record_id.clone(), payload.clone());
                async move {
                    client
                        .update_record(&domain, &record_id, &payload)
                        .await
                        .map_err(CoreError::from)
                }
            },
        )
        .await
    }
}

fn payload_for(record: &BackupRecord, hostname: &str) -> RecordPayload {
    RecordPayload {
        // The provider API addresses the apex with an empty host.
        name: if hostname == "@" {
            String::new()
        } else {
            hostname.to_string()
        },
        record_type: record.record_type.clone(),
        content: record.content.clone(),
        ttl: record.ttl,
        priority: record.priority,
        notes: record.notes.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FakeProvider;
    use chrono::Utc;

    fn engine(provider: Arc<FakeProvider>, dry_run: bool) -> BackupEngine {
        BackupEngine::new(
            provider,
            Arc::new(RateLimiter::new(10_000.0, 10)),
            RetryPolicy {
                base_delay: std::time::Duration::from_millis(1),
                jitter: false,
                ..RetryPolicy::default()
            },
            CancellationToken::new(),
            dry_run,
        )
    }

    fn backup_record(name: &str, record_type: &str, content: &str) -> BackupRecord {
        BackupRecord {
            id: String::new(),
            name: name.into(),
            record_type: record_type.into(),
            content: content.into(),
            ttl: 3600,
            priority: None,
            notes: None,
        }
    }

    fn record_set(records: Vec<BackupRecord>) -> RecordSet {
        RecordSet {
            domain: "example.com".into(),
            provider: "porkbun".into(),
            version: BACKUP_VERSION.into(),
            exported_at: Utc::now(),
            records,
            attribution: None,
        }
    }

    #[test]
    fn hostnames_normalize_against_the_zone() {
        assert_eq!(hostname_from_fqdn("example.com", "example.com"), "@");
        assert_eq!(hostname_from_fqdn("www.example.com", "example.com"), "www");
        assert_eq!(hostname_from_fqdn("www.example.com.", "example.com"), "www");
        assert_eq!(hostname_from_fqdn("other.org", "example.com"), "other.org");
    }

    #[tokio::test]
    async fn export_retrieves_and_filters_by_type() {
        let provider = Arc::new(FakeProvider::new(
            "example.com",
            vec![
                ("example.com", "A", "192.0.2.1"),
                ("www.example.com", "CNAME", "example.com"),
                ("example.com", "TXT", "v=spf1 -all"),
            ],
        ));
        let engine = engine(Arc::clone(&provider), false);

        let all = engine
            .export("example.com", "porkbun", &ExportOptions::default())
            .await
            .unwrap();
        assert_eq!(all.records.len(), 3);
        assert_eq!(all.version, BACKUP_VERSION);
        assert!(all.attribution.is_some());

        let filtered = engine
            .export(
                "example.com",
                "porkbun",
                &ExportOptions {
                    record_types: vec!["txt".into()],
                },
            )
            .await
            .unwrap();
        assert_eq!(filtered.records.len(), 1);
        assert_eq!(filtered.records[0].record_type, "TXT");
    }

    #[tokio::test]
    async fn export_of_empty_zone_is_a_warning_not_an_error() {
        let provider = Arc::new(FakeProvider::new("example.com", vec![]));
        let engine = engine(provider, false);
        let set = engine
            .export("example.com", "porkbun", &ExportOptions::default())
            .await
            .unwrap();
        assert!(set.records.is_empty());
    }

    #[tokio::test]
    async fn export_rejects_unknown_type_filters() {
        let provider = Arc::new(FakeProvider::new("example.com", vec![]));
        let engine = engine(provider, false);
        let err = engine
            .export(
                "example.com",
                "porkbun",
                &ExportOptions {
                    record_types: vec!["ALIAS".into()],
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::InvalidRecordType(_)));
    }

    #[tokio::test]
    async fn import_skip_strategy_skips_existing_triples() {
        let provider = Arc::new(FakeProvider::new(
            "example.com",
            vec![("www.example.com", "A", "192.0.2.1")],
        ));
        let engine = engine(Arc::clone(&provider), false);

        let set = record_set(vec![
            backup_record("www.example.com", "A", "192.0.2.1"),
            backup_record("mail.example.com", "A", "192.0.2.2"),
        ]);
        let report = engine.import(&set, &ImportOptions::default()).await.unwrap();

        assert_eq!(report.total, 2);
        assert_eq!(report.skipped, 1);
        assert_eq!(report.created, 1);
        assert_eq!(report.failed, 0);
        assert_eq!(report.conflicts.len(), 1);
        assert_eq!(report.conflicts[0].resolution, "skipped");
        assert!(provider.names().contains(&"mail.example.com".to_string()));
    }

    #[tokio::test]
    async fn import_replace_strategy_overwrites_in_place() {
        let provider = Arc::new(FakeProvider::new(
            "example.com",
            vec![("www.example.com", "A", "192.0.2.1")],
        ));
        let engine = engine(Arc::clone(&provider), false);

        let set = record_set(vec![backup_record("www.example.com", "A", "198.51.100.9")]);
        let options = ImportOptions {
            strategy: ConflictStrategy::Replace,
            ..ImportOptions::default()
        };
        let report = engine.import(&set, &options).await.unwrap();

        assert_eq!(report.updated, 1);
        assert_eq!(report.created, 0);
        assert_eq!(
            provider.content_of("www.example.com").unwrap(),
            "198.51.100.9"
        );
    }

    #[tokio::test]
    async fn import_abort_strategy_fails_on_first_conflict() {
        let provider = Arc::new(FakeProvider::new(
            "example.com",
            vec![("www.example.com", "A", "192.0.2.1")],
        ));
        let engine = engine(provider, false);

        let set = record_set(vec![backup_record("www.example.com", "A", "198.51.100.9")]);
        let options = ImportOptions {
            strategy: ConflictStrategy::Abort,
            ..ImportOptions::default()
        };
        let err = engine.import(&set, &options).await.unwrap_err();
        assert!(matches!(err, CoreError::ImportConflict { .. }));
    }

    #[tokio::test]
    async fn import_validates_everything_before_mutating() {
        let provider = Arc::new(FakeProvider::new("example.com", vec![]));
        let engine = engine(Arc::clone(&provider), false);

        let set = record_set(vec![
            backup_record("good.example.com", "A", "192.0.2.1"),
            backup_record("bad.example.com", "A", "not-an-ip"),
        ]);
        let err = engine.import(&set, &ImportOptions::default()).await.unwrap_err();
        assert!(matches!(err, CoreError::Validation { .. }));
        // Nothing was created.
        assert!(provider.names().is_empty());
    }

    #[tokio::test]
    async fn import_dry_run_counts_but_never_mutates() {
        let provider = Arc::new(FakeProvider::new("example.com", vec![]));
        let engine = engine(Arc::clone(&provider), false);

        let set = record_set(vec![backup_record("www.example.com", "A", "192.0.2.1")]);
        let options = ImportOptions {
            dry_run: true,
            ..ImportOptions::default()
        };
        let report = engine.import(&set, &options).await.unwrap();
        assert_eq!(report.skipped, 1);
        assert_eq!(report.created, 0);
        assert!(provider.names().is_empty());
    }

    #[tokio::test]
    async fn cancelled_import_reports_partial_progress() {
        let provider = Arc::new(FakeProvider::new("example.com", vec![]));
        let cancel = CancellationToken::new();
        // Cancel mid-run: the first create succeeds, then the loop
        // observes the token and stops.
        let trigger = cancel.clone();
        provider.set_create_hook(move || trigger.cancel());

        let engine = BackupEngine::new(
            Arc::clone(&provider) as Arc<dyn ProviderClient>,
            Arc::new(RateLimiter::new(10_000.0, 10)),
            RetryPolicy::default(),
            cancel,
            false,
        );

        let set = record_set(vec![
            backup_record("a.example.com", "A", "192.0.2.1"),
            backup_record("b.example.com", "A", "192.0.2.2"),
        ]);
        let report = engine.import(&set, &ImportOptions::default()).await.unwrap();
        assert!(report.cancelled);
        assert_eq!(report.created, 1);
        assert_eq!(provider.names(), vec!["a.example.com".to_string()]);
    }
}
