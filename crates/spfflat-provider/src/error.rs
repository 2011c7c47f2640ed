use thiserror::Error;

/// Top-level error type for the `spfflat-provider` crate.
///
/// Every provider call resolves into one of three recovery classes:
/// rate-limit (retry after backoff), transient (retry), or permanent
/// (fail immediately). `spfflat-core`'s retry wrapper keys off the
/// `is_rate_limited` / `is_transient` predicates below.
#[derive(Debug, Error)]
pub enum Error {
    // ── Rate limiting ───────────────────────────────────────────────
    /// HTTP 429 or 503 from the provider.
    #[error("Provider rate limit hit (HTTP {status}): {message}")]
    RateLimited { status: u16, message: String },

    // ── Transport ───────────────────────────────────────────────────
    /// HTTP transport error (connection refused, DNS failure, timeout).
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// URL parsing error.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    // ── Provider API ────────────────────────────────────────────────
    /// The provider answered with a non-SUCCESS status string.
    /// `message` has already been run through secret redaction.
    #[error("Provider API error: {message}")]
    Api { message: String },

    /// Non-rate-limit 4xx/5xx response.
    #[error("Provider HTTP error (HTTP {status}): {message}")]
    Http { status: u16, message: String },

    /// Credential rejection.
    #[error("Provider authentication failed: {message}")]
    Authentication { message: String },

    // ── Data ────────────────────────────────────────────────────────
    /// JSON deserialization failed, with the (redacted) body for debugging.
    #[error("Failed to parse provider response: {message}")]
    Deserialization { message: String, body: String },
}

impl Error {
    /// Returns `true` if the provider asked us to slow down.
    pub fn is_rate_limited(&self) -> bool {
        matches!(self, Self::RateLimited { .. })
    }

    /// Returns `true` if this is a transient network error worth retrying.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Transport(e) => e.is_timeout() || e.is_connect(),
            _ => false,
        }
    }

    /// Returns `true` for errors that retrying cannot fix.
    pub fn is_permanent(&self) -> bool {
        !self.is_rate_limited() && !self.is_transient()
    }
}

/// Replace credential field names with `[REDACTED]` before an error
/// message is logged or surfaced.
///
/// The Porkbun API echoes request bodies back in some error responses;
/// the `secretapikey` substitution must run before the `apikey` one so
/// the longer literal is not partially consumed.
pub fn redact_secrets(input: &str) -> String {
    input
        .replace("secretapikey", "[REDACTED]")
        .replace("apikey", "[REDACTED]")
}
