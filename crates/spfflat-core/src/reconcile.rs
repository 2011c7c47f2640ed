//! Reconciliation: desired SPF record set vs. what the provider
//! currently publishes.
//!
//! The engine resolves the target record (threshold-gated), rebuilds the
//! currently published aggregate by walking `spfN.<domain>` continuation
//! chains, diffs the two, and turns the difference into an ordered
//! mutation plan: deletes first (freeing name collisions), then creates,
//! then updates. The `spf-unflat.<domain>` source record is never
//! touched.

use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use spfflat_provider::{ProviderClient, ProviderRecord, RecordPayload};

use crate::dns::DnsResolver;
use crate::error::CoreError;
use crate::limiter::RateLimiter;
use crate::retry::{with_retry, RetryPolicy};
use crate::spf::cidr::records_semantically_differ;
use crate::spf::flatten::Flattener;
use crate::spf::normalize::{is_terminal_all, mechanism_set, normalize};
use crate::spf::split::split_and_chain;
use crate::task::DomainTask;

// ── Managed-record discovery ─────────────────────────────────────────

/// `spfN.<domain>` for a non-negative integer N.
fn is_continuation_name(name: &str, domain: &str) -> bool {
    let Some(rest) = name.strip_suffix(domain) else {
        return false;
    };
    let Some(prefix) = rest.strip_suffix('.') else {
        return false;
    };
    let Some(digits) = prefix.strip_prefix("spf") else {
        return false;
    };
    !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit())
}

/// Records reconciliation owns: the apex TXT iff its content is an SPF
/// policy, plus every `spfN.<domain>` TXT. Keys are lowercased names.
fn managed_records(
    records: &[ProviderRecord],
    domain: &str,
) -> BTreeMap<String, ProviderRecord> {
    let mut managed = BTreeMap::new();
    for record in records {
        if record.record_type != "TXT" {
            continue;
        }
        let name = record.normalized_name().to_lowercase();
        let owned = if name == domain {
            record.content.starts_with("v=spf1")
        } else {
            is_continuation_name(&name, domain)
        };
        if owned {
            managed.entry(name).or_insert_with(|| record.clone());
        }
    }
    managed
}

/// Rebuild the currently published aggregate by inlining managed
/// continuation chains. Non-managed `include:` targets stay as
/// mechanisms; each include is followed at most once.
fn current_aggregate(
    managed: &BTreeMap<String, ProviderRecord>,
    domain: &str,
) -> Option<String> {
    let root = managed.get(domain)?;
    let mut mechanisms: Vec<String> = Vec::new();
    let mut seen: HashSet<String> = HashSet::new();
    let mut pending = vec![root.content.clone()];

    while let Some(content) = pending.pop() {
        for token in content.split_whitespace() {
            if token.starts_with("v=spf1") || is_terminal_all(token) {
                continue;
            }
            if let Some(target) = token.strip_prefix("include:") {
                if !seen.insert(target.to_lowercase()) {
                    continue;
                }
                if is_continuation_name(&target.to_lowercase(), domain) {
                    if let Some(next) = managed.get(&target.to_lowercase()) {
                        pending.push(next.content.clone());
                    } else {
                        mechanisms.push(token.to_string());
                    }
                } else {
                    mechanisms.push(token.to_string());
                }
            } else {
                mechanisms.push(token.to_string());
            }
        }
    }

    normalize(&format!("v=spf1 {} ~all", mechanisms.join(" "))).ok()
}

// ── Mutation plan ────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedDelete {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedCreate {
    pub name: String,
    /// Host part relative to the zone; empty for the apex.
    pub host: String,
    pub content: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedUpdate {
    pub id: String,
    pub name: String,
    pub host: String,
    pub content: String,
}

/// Ordered set of provider mutations for one domain.
#[derive(Debug, Clone, Default)]
pub struct MutationPlan {
    pub deletes: Vec<PlannedDelete>,
    pub creates: Vec<PlannedCreate>,
    pub updates: Vec<PlannedUpdate>,
}

impl MutationPlan {
    pub fn is_empty(&self) -> bool {
        self.deletes.is_empty() && self.creates.is_empty() && self.updates.is_empty()
    }

    /// Compute the plan for `desired` against the zone's current records.
    pub fn build(
        domain: &str,
        unflat_name: &str,
        desired: &BTreeMap<String, String>,
        current: &[ProviderRecord],
    ) -> Self {
        let mut plan = MutationPlan::default();
        let to_host = |name: &str| {
            if name == domain {
                String::new()
            } else {
                name.strip_suffix(&format!(".{domain}"))
                    .unwrap_or(name)
                    .to_string()
            }
        };

        for (name, content) in desired {
            if name == unflat_name {
                // Caller-owned source record: never emitted, never touched.
                continue;
            }
            match find_existing_txt(current, name, domain) {
                Some(existing) if existing.normalized_name() == name => {
                    plan.updates.push(PlannedUpdate {
                        id: existing.id.clone(),
                        name: name.clone(),
                        host: to_host(name),
                        content: content.clone(),
                    });
                }
                Some(existing) => {
                    // Hostname-encoding drift: replace rather than edit.
                    plan.deletes.push(PlannedDelete {
                        id: existing.id.clone(),
                        name: existing.normalized_name().to_string(),
                    });
                    plan.creates.push(PlannedCreate {
                        name: name.clone(),
                        host: to_host(name),
                        content: content.clone(),
                    });
                }
                None => {
                    plan.creates.push(PlannedCreate {
                        name: name.clone(),
                        host: to_host(name),
                        content: content.clone(),
                    });
                }
            }
        }

        for (name, record) in managed_records(current, domain) {
            if !desired.contains_key(&name) && name != unflat_name {
                plan.deletes.push(PlannedDelete {
                    id: record.id.clone(),
                    name,
                });
            }
        }

        plan
    }

    /// Human-readable mutation lines, apex rendered as `@`.
    pub fn describe(&self, domain: &str) -> Vec<String> {
        let display = |name: &str| {
            if name == domain {
                "@".to_string()
            } else {
                name.to_string()
            }
        };
        let mut lines = Vec::new();
        for d in &self.deletes {
            lines.push(format!("DELETE {}", display(&d.name)));
        }
        for c in &self.creates {
            lines.push(format!("CREATE {}: {}", display(&c.name), c.content));
        }
        for u in &self.updates {
            lines.push(format!("UPDATE {}: {}", display(&u.name), u.content));
        }
        lines
    }
}

/// Find the TXT record occupying `name`. For the apex only SPF-content
/// records count, so unrelated verification TXTs are left alone. Matching
/// is case-insensitive; the caller compares exact names to detect drift.
fn find_existing_txt<'r>(
    records: &'r [ProviderRecord],
    name: &str,
    domain: &str,
) -> Option<&'r ProviderRecord> {
    records.iter().find(|r| {
        r.record_type == "TXT"
            && r.normalized_name().eq_ignore_ascii_case(name)
            && (name != domain || r.content.starts_with("v=spf1"))
    })
}

// ── Change summary ───────────────────────────────────────────────────

/// Render the added/removed mechanism summary shown to the user.
fn summarize_changes(current: Option<&str>, desired: &str) -> String {
    let new_set = mechanism_set(desired);
    let old_set = current.map(mechanism_set).unwrap_or_default();

    let mut added: Vec<&String> = new_set.difference(&old_set).collect();
    let mut removed: Vec<&String> = old_set.difference(&new_set).collect();
    added.sort();
    removed.sort();

    let mut summary = String::new();
    if !added.is_empty() {
        summary.push_str(&format!(
            "Added: {}. ",
            added.iter().map(|s| s.as_str()).collect::<Vec<_>>().join(", ")
        ));
    }
    if !removed.is_empty() {
        summary.push_str(&format!(
            "Removed: {}. ",
            removed.iter().map(|s| s.as_str()).collect::<Vec<_>>().join(", ")
        ));
    }
    if summary.is_empty() {
        summary.push_str("No functional change to SPF mechanisms.");
    }
    summary.trim_end().to_string()
}

// ── Engine ───────────────────────────────────────────────────────────

/// Per-domain reconciliation outcome, collected by the scheduler.
#[derive(Debug)]
pub struct DomainReport {
    pub domain: String,
    pub original: String,
    pub flattened: String,
    pub current_aggregate: Option<String>,
    pub lookup_count: u32,
    pub was_flattened: bool,
    pub changed: bool,
    pub change_summary: String,
    /// Desired record set; empty when no change was planned.
    pub desired_records: BTreeMap<String, String>,
    pub plan: MutationPlan,
    /// False in dry-run mode or when nothing needed changing.
    pub applied: bool,
    pub attribution: String,
}

pub struct ReconcileEngine {
    pub client: Arc<dyn ProviderClient>,
    pub limiter: Arc<RateLimiter>,
    pub retry: RetryPolicy,
    pub cancel: CancellationToken,
    pub dry_run: bool,
}

impl ReconcileEngine {
    /// Run the full §per-domain pipeline: resolve, fetch, diff, plan,
    /// and (outside dry-run) apply.
    pub async fn reconcile<R: DnsResolver>(
        &self,
        resolver: &R,
        task: &DomainTask,
    ) -> Result<DomainReport, CoreError> {
        let mut flattener =
            Flattener::with_policy(resolver, task.options.aggregation.clone());
        let outcome = flattener
            .flatten_with_threshold(
                &task.spf_source_name(),
                task.options.aggregate,
                task.options.force,
            )
            .await?;

        let current = self.fetch_current(&task.name).await?;
        let managed = managed_records(&current, &task.name);
        let aggregate_now = current_aggregate(&managed, &task.name);

        let desired_normalized = normalize(&outcome.flattened)?;
        let equal = match aggregate_now.as_deref() {
            Some(current_norm) => {
                current_norm == desired_normalized
                    || (task.options.aggregate
                        && !records_semantically_differ(current_norm, &outcome.flattened))
            }
            None => false,
        };

        if equal && !task.options.force {
            debug!(domain = %task.name, "records already up to date");
            return Ok(DomainReport {
                domain: task.name.clone(),
                original: outcome.original,
                flattened: outcome.flattened,
                current_aggregate: aggregate_now,
                lookup_count: outcome.lookup_count,
                was_flattened: outcome.was_flattened,
                changed: false,
                change_summary: "No functional change to SPF mechanisms.".into(),
                desired_records: BTreeMap::new(),
                plan: MutationPlan::default(),
                applied: false,
                attribution: self.client.attribution().to_string(),
            });
        }

        let desired = split_and_chain(&outcome.flattened, &task.name);
        let change_summary = if equal {
            "No functional change to SPF mechanisms (forced update).".to_string()
        } else {
            summarize_changes(aggregate_now.as_deref(), &outcome.flattened)
        };
        let plan = MutationPlan::build(
            &task.name,
            &task.unflat_record_name(),
            &desired,
            &current,
        );

        let applied = if self.dry_run || plan.is_empty() {
            false
        } else {
            self.apply(task, &plan).await?;
            true
        };

        Ok(DomainReport {
            domain: task.name.clone(),
            original: outcome.original,
            flattened: outcome.flattened,
            current_aggregate: aggregate_now,
            lookup_count: outcome.lookup_count,
            was_flattened: outcome.was_flattened,
            changed: true,
            change_summary,
            desired_records: desired,
            plan,
            applied,
            attribution: self.client.attribution().to_string(),
        })
    }

    async fn fetch_current(&self, domain: &str) -> Result<Vec<ProviderRecord>, CoreError> {
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

    /// Execute the plan in delete → create → update order; every call
    /// passes through the provider's rate limiter and retry wrapper.
    async fn apply(&self, task: &DomainTask, plan: &MutationPlan) -> Result<(), CoreError> {
        for delete in &plan.deletes {
            info!(domain = %task.name, record = %delete.name, "deleting stale SPF record");
            let client = Arc::clone(&self.client);
            let (domain, id) = (task.name.clone(), delete.id.clone());
            with_retry(
                &self.retry,
                &self.limiter,
                &self.cancel,
                "delete record",
                move || {
                    let client = Arc::clone(&client);
                    let (domain, id) = (domain.clone(), id.clone());
                    async move { client.delete_record(&domain, &id).await.map_err(CoreError::from) }
                },
            )
            .await?;
        }

        for create in &plan.creates {
            info!(domain = %task.name, record = %create.name, "creating SPF record");
            let client = Arc::clone(&self.client);
            let domain = task.name.clone();
            let payload = RecordPayload::txt(&create.host, &create.content, task.ttl);
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
                            .map(|_| ())
                            .map_err(CoreError::from)
                    }
                },
            )
            .await?;
        }

        for update in &plan.updates {
            info!(domain = %task.name, record = %update.name, "updating SPF record");
            let client = Arc::clone(&self.client);
            let (domain, id) = (task.name.clone(), update.id.clone());
            let payload = RecordPayload::txt(&update.host, &update.content, task.ttl);
            with_retry(
                &self.retry,
                &self.limiter,
                &self.cancel,
                "update record",
                move || {
                    let client = Arc::clone(&client);
                    let (domain, id, payload) = (domain.clone(), id.clone(), payload.clone());
                    async move {
                        client
                            .update_record(&domain, &id, &payload)
                            .await
                            .map_err(CoreError::from)
                    }
                },
            )
            .await?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dns::MockResolver;
    use crate::task::{TaskOptions, DEFAULT_TTL};
    use crate::testing::FakeProvider;
    use secrecy::SecretString;

    fn engine(provider: Arc<FakeProvider>, dry_run: bool) -> ReconcileEngine {
        ReconcileEngine {
            client: provider,
            limiter: Arc::new(RateLimiter::new(10_000.0, 10)),
            retry: RetryPolicy {
                base_delay: std::time::Duration::from_millis(1),
                jitter: false,
                ..RetryPolicy::default()
            },
            cancel: CancellationToken::new(),
            dry_run,
        }
    }

    fn task(options: TaskOptions) -> DomainTask {
        DomainTask {
            name: "example.com".into(),
            provider: "porkbun".into(),
            api_key: SecretString::from("pk".to_string()),
            secret_key: SecretString::from("sk".to_string()),
            ttl: DEFAULT_TTL,
            options,
        }
    }

    fn forced() -> TaskOptions {
        TaskOptions {
            force: true,
            ..TaskOptions::default()
        }
    }

    // ── Discovery & aggregate rebuild ───────────────────────────────

    #[test]
    fn continuation_names_require_integer_suffix() {
        assert!(is_continuation_name("spf0.example.com", "example.com"));
        assert!(is_continuation_name("spf12.example.com", "example.com"));
        assert!(!is_continuation_name("spf-unflat.example.com", "example.com"));
        assert!(!is_continuation_name("spf.example.com", "example.com"));
        assert!(!is_continuation_name("spf0.other.com", "example.com"));
        assert!(!is_continuation_name("example.com", "example.com"));
    }

    #[test]
    fn aggregate_rebuild_walks_continuation_chain() {
        let records = vec![
            ProviderRecord {
                id: "1".into(),
                name: "example.com".into(),
                record_type: "TXT".into(),
                content: "v=spf1 include:spf0.example.com ~all".into(),
                ttl: 600,
                priority: None,
                notes: None,
            },
            ProviderRecord {
                id: "2".into(),
                name: "spf0.example.com".into(),
                record_type: "TXT".into(),
                content: "v=spf1 ip4:192.0.2.1 include:spf1.example.com ~all".into(),
                ttl: 600,
                priority: None,
                notes: None,
            },
            ProviderRecord {
                id: "3".into(),
                name: "spf1.example.com".into(),
                record_type: "TXT".into(),
                content: "v=spf1 ip4:192.0.2.2 ~all".into(),
                ttl: 600,
                priority: None,
                notes: None,
            },
        ];
        let managed = managed_records(&records, "example.com");
        assert_eq!(managed.len(), 3);
        let aggregate = current_aggregate(&managed, "example.com").unwrap();
        assert_eq!(aggregate, "v=spf1 ip4:192.0.2.1 ip4:192.0.2.2 ~all");
    }

    #[test]
    fn apex_without_spf_content_is_not_managed() {
        let records = vec![ProviderRecord {
            id: "1".into(),
            name: "example.com".into(),
            record_type: "TXT".into(),
            content: "google-site-verification=abc".into(),
            ttl: 600,
            priority: None,
            notes: None,
        }];
        let managed = managed_records(&records, "example.com");
        assert!(managed.is_empty());
    }

    // ── End-to-end reconciliation ───────────────────────────────────

    #[tokio::test]
    async fn empty_zone_gets_records_created_then_reconverges() {
        let dns = MockResolver::new();
        // 12 lookups: over budget, so the gate flattens without force.
        let includes: Vec<String> =
            (0..11).map(|i| format!("include:i{i}.partner.example")).collect();
        dns.add_txt(
            "example.com",
            vec![&format!("v=spf1 {} ~all", includes.join(" "))],
        );
        for i in 0..11 {
            dns.add_txt(
                &format!("i{i}.partner.example"),
                vec![&format!("v=spf1 ip4:198.51.100.{i} ~all")],
            );
        }

        let provider = Arc::new(FakeProvider::new("example.com", vec![]));
        let engine = engine(Arc::clone(&provider), false);
        let task = task(TaskOptions::default());

        let report = engine.reconcile(&dns, &task).await.unwrap();
        assert!(report.was_flattened);
        assert!(report.changed);
        assert!(report.applied);
        let apex = provider.content_of("example.com").unwrap();
        assert!(apex.contains("ip4:198.51.100.0"));
        assert!(!apex.contains("include:i0"));

        // Property: applying the plan, then recomputing, yields a no-op.
        let again = engine.reconcile(&dns, &task).await.unwrap();
        assert!(!again.changed, "unexpected plan: {:?}", again.plan);
        assert!(again.plan.is_empty());
    }

    #[tokio::test]
    async fn drifted_apex_content_is_updated_in_place() {
        let dns = MockResolver::new();
        dns.add_txt("example.com", vec!["v=spf1 ip4:192.0.2.9 ~all"]);

        let provider = Arc::new(FakeProvider::new(
            "example.com",
            vec![("example.com", "TXT", "v=spf1 ip4:192.0.2.1 ~all")],
        ));
        let engine = engine(Arc::clone(&provider), false);

        let report = engine.reconcile(&dns, &task(forced())).await.unwrap();
        assert!(report.changed);
        assert_eq!(report.plan.updates.len(), 1);
        assert!(report.plan.deletes.is_empty());
        assert_eq!(
            provider.content_of("example.com").unwrap(),
            "v=spf1 ip4:192.0.2.9 ~all"
        );
        assert!(report.change_summary.contains("Added: ip4:192.0.2.9."));
        assert!(report.change_summary.contains("Removed: ip4:192.0.2.1."));
    }

    #[tokio::test]
    async fn stale_continuations_are_deleted_but_unflat_survives() {
        let dns = MockResolver::new();
        dns.add_txt("spf-unflat.example.com", vec!["v=spf1 ip4:192.0.2.5 ~all"]);

        let provider = Arc::new(FakeProvider::new(
            "example.com",
            vec![
                ("example.com", "TXT", "v=spf1 include:spf0.example.com ~all"),
                ("spf0.example.com", "TXT", "v=spf1 ip4:198.51.100.1 ~all"),
                ("spf1.example.com", "TXT", "v=spf1 ip4:198.51.100.2 ~all"),
                ("spf-unflat.example.com", "TXT", "v=spf1 ip4:192.0.2.5 ~all"),
            ],
        ));
        let engine = engine(Arc::clone(&provider), false);
        let options = TaskOptions {
            force: true,
            use_unflat_source: true,
            ..TaskOptions::default()
        };

        let report = engine.reconcile(&dns, &task(options)).await.unwrap();
        assert!(report.applied);

        let names = provider.names();
        assert!(names.contains(&"spf-unflat.example.com".to_string()));
        assert!(!names.contains(&"spf0.example.com".to_string()));
        assert!(!names.contains(&"spf1.example.com".to_string()));
        assert!(report.plan.deletes.iter().all(|d| d.name != "spf-unflat.example.com"));
        assert_eq!(
            provider.content_of("example.com").unwrap(),
            "v=spf1 ip4:192.0.2.5 ~all"
        );
    }

    #[tokio::test]
    async fn aggregate_mode_suppresses_semantically_equal_update() {
        let dns = MockResolver::new();
        dns.add_txt("example.com", vec!["v=spf1 ip4:192.168.1.0/30 ~all"]);

        let seed = vec![(
            "example.com",
            "TXT",
            "v=spf1 ip4:192.168.1.0 ip4:192.168.1.1 ip4:192.168.1.2 ip4:192.168.1.3 ~all",
        )];

        // aggregate = true: textually different, semantically equal.
        let provider = Arc::new(FakeProvider::new("example.com", seed.clone()));
        let engine_eq = engine(Arc::clone(&provider), false);
        let options = TaskOptions {
            aggregate: true,
            ..TaskOptions::default()
        };
        let report = engine_eq.reconcile(&dns, &task(options)).await.unwrap();
        assert!(!report.changed);
        assert!(report.plan.is_empty());

        // aggregate = false: string comparison only, update planned.
        let provider = Arc::new(FakeProvider::new("example.com", seed));
        let engine_ne = engine(Arc::clone(&provider), true);
        let report = engine_ne
            .reconcile(&dns, &task(TaskOptions::default()))
            .await
            .unwrap();
        assert!(report.changed);
        assert_eq!(report.plan.updates.len(), 1);
    }

    #[tokio::test]
    async fn forced_noop_reports_forced_update_summary() {
        let dns = MockResolver::new();
        dns.add_txt("example.com", vec!["v=spf1 ip4:192.0.2.1 ~all"]);

        let provider = Arc::new(FakeProvider::new(
            "example.com",
            vec![("example.com", "TXT", "v=spf1 ip4:192.0.2.1 ~all")],
        ));
        let engine = engine(Arc::clone(&provider), false);

        let report = engine.reconcile(&dns, &task(forced())).await.unwrap();
        assert!(report.changed);
        assert_eq!(
            report.change_summary,
            "No functional change to SPF mechanisms (forced update)."
        );
    }

    #[tokio::test]
    async fn dry_run_plans_but_never_mutates() {
        let dns = MockResolver::new();
        dns.add_txt("example.com", vec!["v=spf1 ip4:192.0.2.77 ~all"]);

        let provider = Arc::new(FakeProvider::new(
            "example.com",
            vec![("example.com", "TXT", "v=spf1 ip4:192.0.2.1 ~all")],
        ));
        let engine = engine(Arc::clone(&provider), true);

        let report = engine.reconcile(&dns, &task(forced())).await.unwrap();
        assert!(report.changed);
        assert!(!report.applied);
        assert_eq!(
            provider.content_of("example.com").unwrap(),
            "v=spf1 ip4:192.0.2.1 ~all"
        );
    }

    #[tokio::test]
    async fn long_records_chain_and_apex_points_at_spf0() {
        let dns = MockResolver::new();
        let mechanisms: Vec<String> =
            (0..40).map(|i| format!("ip4:198.51.100.{i}")).collect();
        dns.add_txt(
            "example.com",
            vec![&format!("v=spf1 {} ~all", mechanisms.join(" "))],
        );

        let provider = Arc::new(FakeProvider::new("example.com", vec![]));
        let engine = engine(Arc::clone(&provider), false);

        let report = engine.reconcile(&dns, &task(forced())).await.unwrap();
        assert!(report.applied);
        assert_eq!(
            provider.content_of("example.com").unwrap(),
            "v=spf1 include:spf0.example.com ~all"
        );
        assert!(provider.names().iter().any(|n| n == "spf0.example.com"));

        // Converged: a second pass plans nothing.
        let again = engine
            .reconcile(&dns, &task(TaskOptions::default()))
            .await
            .unwrap();
        assert!(!again.changed, "chain did not converge: {:?}", again.plan);
    }

    #[test]
    fn summary_with_no_current_record_lists_only_additions() {
        let summary = summarize_changes(None, "v=spf1 ip4:192.0.2.1 ~all");
        assert_eq!(summary, "Added: ip4:192.0.2.1, ~all.");
    }
}
