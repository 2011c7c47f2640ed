//! Per-run domain task: one immutable unit of work for the scheduler.

use secrecy::SecretString;

use crate::spf::cidr::AggregationPolicy;

/// Default TTL for managed TXT records.
pub const DEFAULT_TTL: u32 = 600;

/// Everything the pipeline needs to process one domain. Built when the
/// configuration is loaded; immutable for the rest of the run.
#[derive(Clone, Debug)]
pub struct DomainTask {
    /// FQDN of the managed zone.
    pub name: String,
    /// Provider tag, matched case-insensitively for grouping.
    pub provider: String,
    pub api_key: SecretString,
    pub secret_key: SecretString,
    pub ttl: u32,
    pub options: TaskOptions,
}

#[derive(Debug, Clone, Default)]
pub struct TaskOptions {
    /// Run the flattened IP set through the CIDR aggregator.
    pub aggregate: bool,
    /// Apply updates even when no functional change is detected.
    pub force: bool,
    /// Resolve from `spf-unflat.<domain>` instead of the apex.
    pub use_unflat_source: bool,
    /// Aggregation breadth limits and the preserve list.
    pub aggregation: AggregationPolicy,
}

impl DomainTask {
    /// The name SPF resolution starts from: the apex, or the protected
    /// `spf-unflat` source record when configured.
    pub fn spf_source_name(&self) -> String {
        if self.options.use_unflat_source {
            format!("spf-unflat.{}", self.name)
        } else {
            self.name.clone()
        }
    }

    /// The `spf-unflat.<domain>` record name, which reconciliation must
    /// never touch.
    pub fn unflat_record_name(&self) -> String {
        format!("spf-unflat.{}", self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn task(use_unflat_source: bool) -> DomainTask {
        DomainTask {
            name: "example.com".into(),
            provider: "porkbun".into(),
            api_key: SecretString::from("pk1_test".to_string()),
            secret_key: SecretString::from("sk1_test".to_string()),
            ttl: DEFAULT_TTL,
            options: TaskOptions {
                use_unflat_source,
                ..TaskOptions::default()
            },
        }
    }

    #[test]
    fn source_name_follows_unflat_option() {
        assert_eq!(task(false).spf_source_name(), "example.com");
        assert_eq!(task(true).spf_source_name(), "spf-unflat.example.com");
    }
}
