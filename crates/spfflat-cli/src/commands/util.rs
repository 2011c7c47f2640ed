//! Shared helpers for command handlers.

use std::path::Path;
use std::sync::Arc;

use secrecy::SecretString;

use spfflat_provider::{PorkbunClient, ProviderClient, TransportConfig};

use crate::error::CliError;

/// Build the provider client for a task's provider tag.
pub fn make_client(
    provider: &str,
    api_key: SecretString,
    secret_key: SecretString,
) -> Result<Arc<dyn ProviderClient>, CliError> {
    match provider.to_lowercase().as_str() {
        "porkbun" => {
            let client = PorkbunClient::new(api_key, secret_key, &TransportConfig::default())
                .map_err(spfflat_core::CoreError::from)?;
            Ok(Arc::new(client))
        }
        other => Err(CliError::UnsupportedProvider {
            provider: other.to_string(),
        }),
    }
}

/// Write `content` to `path`, or to stdout when no path was given.
pub fn emit_output(path: Option<&Path>, content: &str, quiet: bool) -> Result<(), CliError> {
    match path {
        Some(path) => {
            std::fs::write(path, content)?;
            Ok(())
        }
        None => {
            if !quiet {
                print!("{content}");
            }
            Ok(())
        }
    }
}
