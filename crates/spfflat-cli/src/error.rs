//! CLI error types with miette diagnostics.
//!
//! Maps `CoreError` variants into user-facing errors with actionable
//! help text, and assigns each failure to an exit-code family.

use miette::Diagnostic;
use thiserror::Error;

use spfflat_core::CoreError;

/// Exit-code families: config, auth, provider, and validation failures
/// each get their own code; anything else is a general error.
pub mod exit_code {
    pub const SUCCESS: i32 = 0;
    pub const GENERAL: i32 = 1;
    pub const CONFIG: i32 = 2;
    pub const AUTH: i32 = 3;
    pub const PROVIDER: i32 = 4;
    pub const VALIDATION: i32 = 5;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Configuration ────────────────────────────────────────────────
    #[error("Configuration file not found: {path}")]
    #[diagnostic(
        code(spfflat::no_config),
        help("Pass --config <path> or create config.yaml in the working directory.")
    )]
    ConfigNotFound { path: String },

    #[error("Invalid configuration: {message}")]
    #[diagnostic(code(spfflat::config))]
    Config { message: String },

    #[error("Invalid domain name in configuration: {name}")]
    #[diagnostic(
        code(spfflat::invalid_domain),
        help("Domain names follow RFC 1035: labels of 1-63 alphanumeric/hyphen characters.")
    )]
    InvalidDomain { name: String },

    #[error("No credentials configured for domain '{domain}'")]
    #[diagnostic(
        code(spfflat::no_credentials),
        help(
            "Set api_key/secret_key in the config file, or export\n\
             SPF_FLATTENER_API_KEY and SPF_FLATTENER_SECRET_KEY."
        )
    )]
    NoCredentials { domain: String },

    #[error("No API client available for provider '{provider}'")]
    #[diagnostic(
        code(spfflat::unsupported_provider),
        help("Supported providers: porkbun")
    )]
    UnsupportedProvider { provider: String },

    // ── Authentication ───────────────────────────────────────────────
    #[error("Provider authentication failed: {message}")]
    #[diagnostic(
        code(spfflat::auth_failed),
        help("Verify the API key pair with: spfflat ping")
    )]
    AuthFailed { message: String },

    // ── Task aggregation ─────────────────────────────────────────────
    #[error("{failed} of {total} domain tasks failed")]
    #[diagnostic(code(spfflat::tasks_failed))]
    TasksFailed { failed: usize, total: usize },

    // ── Engine errors ────────────────────────────────────────────────
    #[error(transparent)]
    #[diagnostic(code(spfflat::core))]
    Core(CoreError),

    // ── IO / serialization ───────────────────────────────────────────
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("Invalid JSON payload: {0}")]
    #[diagnostic(code(spfflat::json))]
    Json(#[from] serde_json::Error),
}

impl From<figment::Error> for CliError {
    fn from(err: figment::Error) -> Self {
        Self::Config {
            message: err.to_string(),
        }
    }
}

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::Provider(spfflat_provider::Error::Authentication { message }) => {
                Self::AuthFailed { message }
            }
            other => Self::Core(other),
        }
    }
}

impl CliError {
    /// Route a raw provider error through the core mapping.
    pub fn from_provider(err: spfflat_provider::Error) -> Self {
        Self::from(CoreError::from(err))
    }

    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::ConfigNotFound { .. }
            | Self::Config { .. }
            | Self::InvalidDomain { .. }
            | Self::NoCredentials { .. }
            | Self::UnsupportedProvider { .. } => exit_code::CONFIG,

            Self::AuthFailed { .. } => exit_code::AUTH,

            Self::Core(core) => match core {
                CoreError::Provider(_) | CoreError::RetriesExhausted { .. } => {
                    exit_code::PROVIDER
                }
                CoreError::PingFailed { .. } => exit_code::AUTH,
                CoreError::Validation { .. }
                | CoreError::InvalidRecordType(_)
                | CoreError::ImportConflict { .. }
                | CoreError::BackupFormat(_) => exit_code::VALIDATION,
                _ => exit_code::GENERAL,
            },

            _ => exit_code::GENERAL,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exit_codes_follow_error_families() {
        assert_eq!(
            CliError::ConfigNotFound { path: "x".into() }.exit_code(),
            exit_code::CONFIG
        );
        assert_eq!(
            CliError::AuthFailed { message: "x".into() }.exit_code(),
            exit_code::AUTH
        );
        assert_eq!(
            CliError::Core(CoreError::Provider(spfflat_provider::Error::Api {
                message: "x".into()
            }))
            .exit_code(),
            exit_code::PROVIDER
        );
        assert_eq!(
            CliError::Core(CoreError::InvalidRecordType("SPF".into())).exit_code(),
            exit_code::VALIDATION
        );
        assert_eq!(
            CliError::Core(CoreError::NoSpfRecord {
                domain: "example.com".into()
            })
            .exit_code(),
            exit_code::GENERAL
        );
    }

    #[test]
    fn provider_auth_errors_map_to_auth_family() {
        let core = CoreError::Provider(spfflat_provider::Error::Authentication {
            message: "bad keys".into(),
        });
        let cli = CliError::from(core);
        assert_eq!(cli.exit_code(), exit_code::AUTH);
    }
}
