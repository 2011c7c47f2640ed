//! YAML configuration: declarative domain list, DNS servers, and
//! per-domain aggregation settings.
//!
//! Credentials absent from the file fall back to the
//! `SPF_FLATTENER_API_KEY` / `SPF_FLATTENER_SECRET_KEY` environment
//! variables. This module is the single boundary where config types
//! cross into `spfflat_core` task types.

use std::path::Path;

use figment::{
    providers::{Env, Format, Yaml},
    Figment,
};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};

use spfflat_core::{
    is_valid_domain_name, AggregationPolicy, DomainTask, TaskOptions, DEFAULT_TTL,
};

use crate::error::CliError;

pub const ENV_API_KEY: &str = "SPF_FLATTENER_API_KEY";
pub const ENV_SECRET_KEY: &str = "SPF_FLATTENER_SECRET_KEY";

// ── YAML structs ─────────────────────────────────────────────────────

#[derive(Debug, Deserialize, Serialize)]
pub struct Config {
    /// Default provider tag applied to domains without an override.
    pub provider: String,

    /// Explicit DNS servers for SPF resolution (system stub when empty).
    #[serde(default)]
    pub dns: Vec<DnsServer>,

    pub domains: Vec<DomainConfig>,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct DnsServer {
    pub name: String,
    /// `IP` or `IP:port`; port 53 assumed when absent.
    pub ip: String,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct DomainConfig {
    pub name: String,

    /// Per-domain provider override.
    #[serde(default)]
    pub provider: Option<String>,

    #[serde(default)]
    pub api_key: Option<String>,

    #[serde(default)]
    pub secret_key: Option<String>,

    #[serde(default)]
    pub ttl: Option<u32>,

    #[serde(default)]
    pub aggregation: Option<AggregationConfig>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AggregationConfig {
    #[serde(default)]
    pub enabled: bool,

    #[serde(default = "default_v4_max_prefix")]
    pub ipv4_max_prefix: u8,

    #[serde(default = "default_v6_max_prefix")]
    pub ipv6_max_prefix: u8,

    /// Addresses that must never appear inside a CIDR aggregate.
    #[serde(default)]
    pub preserve_individual: Vec<String>,
}

fn default_v4_max_prefix() -> u8 {
    24
}
fn default_v6_max_prefix() -> u8 {
    64
}

impl Default for AggregationConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            ipv4_max_prefix: default_v4_max_prefix(),
            ipv6_max_prefix: default_v6_max_prefix(),
            preserve_individual: Vec::new(),
        }
    }
}

impl From<AggregationConfig> for AggregationPolicy {
    fn from(cfg: AggregationConfig) -> Self {
        Self {
            v4_max_prefix: cfg.ipv4_max_prefix,
            v6_max_prefix: cfg.ipv6_max_prefix,
            preserve_ips: cfg.preserve_individual,
        }
    }
}

// ── Loading & validation ─────────────────────────────────────────────

/// Load and validate the configuration file.
pub fn load_config(path: &Path) -> Result<Config, CliError> {
    if !path.exists() {
        return Err(CliError::ConfigNotFound {
            path: path.display().to_string(),
        });
    }

    let config: Config = Figment::new()
        .merge(Yaml::file(path))
        .merge(Env::prefixed("SPFFLAT_").only(&["provider"]))
        .extract()?;
    validate(&config)?;
    Ok(config)
}

fn validate(config: &Config) -> Result<(), CliError> {
    if config.provider.trim().is_empty() {
        return Err(CliError::Config {
            message: "provider is required".into(),
        });
    }
    if config.domains.is_empty() {
        return Err(CliError::Config {
            message: "at least one domain is required".into(),
        });
    }
    for domain in &config.domains {
        if !is_valid_domain_name(&domain.name) || domain.name == "@" {
            return Err(CliError::InvalidDomain {
                name: domain.name.clone(),
            });
        }
    }
    Ok(())
}

/// The server list for the explicit-servers resolver; entries are `IP`
/// or `IP:port` strings, resolved to port 53 when no port is given.
pub fn dns_server_list(config: &Config) -> Vec<String> {
    config.dns.iter().map(|s| s.ip.clone()).collect()
}

/// Run-wide flags mapped onto every task.
#[derive(Debug, Clone, Copy, Default)]
pub struct RunFlags {
    pub aggregate: bool,
    pub force: bool,
    pub use_unflat_source: bool,
}

/// Turn the declarative config into immutable per-run tasks, resolving
/// credentials through the fallback chain.
pub fn build_tasks(config: &Config, flags: RunFlags) -> Result<Vec<DomainTask>, CliError> {
    config
        .domains
        .iter()
        .map(|domain| {
            let provider = domain
                .provider
                .clone()
                .filter(|p| !p.is_empty())
                .unwrap_or_else(|| config.provider.clone());

            let api_key = resolve_credential(domain.api_key.as_deref(), ENV_API_KEY)
                .ok_or_else(|| CliError::NoCredentials {
                    domain: domain.name.clone(),
                })?;
            let secret_key = resolve_credential(domain.secret_key.as_deref(), ENV_SECRET_KEY)
                .ok_or_else(|| CliError::NoCredentials {
                    domain: domain.name.clone(),
                })?;

            let aggregation = domain.aggregation.clone().unwrap_or_default();
            Ok(DomainTask {
                name: domain.name.clone(),
                provider,
                api_key,
                secret_key,
                ttl: domain.ttl.unwrap_or(DEFAULT_TTL),
                options: TaskOptions {
                    aggregate: flags.aggregate || aggregation.enabled,
                    force: flags.force,
                    use_unflat_source: flags.use_unflat_source,
                    aggregation: aggregation.into(),
                },
            })
        })
        .collect()
}

fn resolve_credential(configured: Option<&str>, env_var: &str) -> Option<SecretString> {
    match configured {
        Some(value) if !value.is_empty() => Some(SecretString::from(value.to_string())),
        _ => std::env::var(env_var)
            .ok()
            .filter(|v| !v.is_empty())
            .map(SecretString::from),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use figment::Jail;

    const SAMPLE: &str = r#"
provider: porkbun
dns:
  - name: Cloudflare
    ip: 1.1.1.1
domains:
  - name: example.com
    api_key: pk1_a
    secret_key: sk1_a
    ttl: 300
  - name: other.org
    api_key: pk1_b
    secret_key: sk1_b
    aggregation:
      enabled: true
      ipv4_max_prefix: 28
      preserve_individual: ["192.0.2.7"]
"#;

    #[test]
    fn loads_and_validates_sample_config() {
        Jail::expect_with(|jail| {
            jail.create_file("config.yaml", SAMPLE)?;
            let config = load_config(Path::new("config.yaml")).unwrap();
            assert_eq!(config.provider, "porkbun");
            assert_eq!(config.domains.len(), 2);
            assert_eq!(config.dns.len(), 1);

            let tasks = build_tasks(&config, RunFlags::default()).unwrap();
            assert_eq!(tasks[0].ttl, 300);
            assert_eq!(tasks[1].ttl, DEFAULT_TTL);
            assert!(!tasks[0].options.aggregate);
            assert!(tasks[1].options.aggregate);
            assert_eq!(tasks[1].options.aggregation.v4_max_prefix, 28);
            assert_eq!(tasks[1].options.aggregation.v6_max_prefix, 64);
            assert_eq!(
                tasks[1].options.aggregation.preserve_ips,
                vec!["192.0.2.7".to_string()]
            );
            Ok(())
        });
    }

    #[test]
    fn missing_file_is_a_config_error() {
        let err = load_config(Path::new("/definitely/not/here.yaml")).unwrap_err();
        assert!(matches!(err, CliError::ConfigNotFound { .. }));
    }

    #[test]
    fn invalid_domain_names_are_rejected() {
        Jail::expect_with(|jail| {
            jail.create_file(
                "config.yaml",
                "provider: porkbun\ndomains:\n  - name: \"-bad-.com\"\n    api_key: k\n    secret_key: s\n",
            )?;
            let err = load_config(Path::new("config.yaml")).unwrap_err();
            assert!(matches!(err, CliError::InvalidDomain { .. }));
            Ok(())
        });
    }

    #[test]
    fn env_variables_supply_missing_credentials() {
        Jail::expect_with(|jail| {
            jail.create_file(
                "config.yaml",
                "provider: porkbun\ndomains:\n  - name: example.com\n",
            )?;
            jail.set_env(ENV_API_KEY, "pk1_env");
            jail.set_env(ENV_SECRET_KEY, "sk1_env");
            let config = load_config(Path::new("config.yaml")).unwrap();
            let tasks = build_tasks(&config, RunFlags::default()).unwrap();
            assert_eq!(tasks.len(), 1);
            Ok(())
        });
    }

    #[test]
    fn missing_credentials_everywhere_is_an_error() {
        Jail::expect_with(|jail| {
            jail.create_file(
                "config.yaml",
                "provider: porkbun\ndomains:\n  - name: example.com\n",
            )?;
            let config = load_config(Path::new("config.yaml")).unwrap();
            let err = build_tasks(&config, RunFlags::default()).unwrap_err();
            assert!(matches!(err, CliError::NoCredentials { .. }));
            Ok(())
        });
    }

    #[test]
    fn per_domain_provider_overrides_global() {
        Jail::expect_with(|jail| {
            jail.create_file(
                "config.yaml",
                "provider: porkbun\ndomains:\n  - name: example.com\n    provider: cloudflare\n    api_key: k\n    secret_key: s\n",
            )?;
            let config = load_config(Path::new("config.yaml")).unwrap();
            let tasks = build_tasks(&config, RunFlags::default()).unwrap();
            assert_eq!(tasks[0].provider, "cloudflare");
            Ok(())
        });
    }
}
