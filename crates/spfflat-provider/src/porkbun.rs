// Porkbun API v3 client.
//
// Wraps `reqwest::Client` with Porkbun-specific URL construction and
// envelope unwrapping. Every endpoint is a JSON POST carrying the API key
// pair in the body; the response envelope's `status` field must read
// "SUCCESS". All error text is run through secret redaction before it can
// reach a log line or a caller.

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::debug;
use url::Url;

use crate::client::ProviderClient;
use crate::error::{redact_secrets, Error};
use crate::record::{wire, PingOutcome, ProviderRecord, RecordPayload};
use crate::transport::TransportConfig;

const DEFAULT_BASE_URL: &str = "https://api.porkbun.com/api/json/v3";

/// Client for the Porkbun DNS API.
pub struct PorkbunClient {
    http: reqwest::Client,
    base_url: Url,
    api_key: SecretString,
    secret_key: SecretString,
}

impl PorkbunClient {
    /// Create a client against the production API.
    pub fn new(
        api_key: SecretString,
        secret_key: SecretString,
        transport: &TransportConfig,
    ) -> Result<Self, Error> {
        Self::with_base_url(api_key, secret_key, DEFAULT_BASE_URL, transport)
    }

    /// Create a client against an explicit base URL (mock servers in tests).
    pub fn with_base_url(
        api_key: SecretString,
        secret_key: SecretString,
        base_url: &str,
        transport: &TransportConfig,
    ) -> Result<Self, Error> {
        Ok(Self {
            http: transport.build_client()?,
            base_url: Url::parse(base_url)?,
            api_key,
            secret_key,
        })
    }

    // ── Request plumbing ─────────────────────────────────────────────

    fn api_url(&self, path: &str) -> Result<Url, Error> {
        let full = format!(
            "{}/{}",
            self.base_url.as_str().trim_end_matches('/'),
            path.trim_start_matches('/')
        );
        Ok(Url::parse(&full)?)
    }

    /// POST a JSON body and deserialize the response.
    ///
    /// HTTP 429/503 surface as rate-limit errors, auth rejections as
    /// authentication errors, any other non-2xx as a permanent HTTP error.
    async fn post<T: DeserializeOwned>(
        &self,
        path: &str,
        body: &impl Serialize,
    ) -> Result<T, Error> {
        let url = self.api_url(path)?;
        debug!("POST {}", url);

        let resp = self
            .http
            .post(url)
            .json(body)
            .send()
            .await
            .map_err(Error::Transport)?;

        let status = resp.status();
        let text = resp.text().await.map_err(Error::Transport)?;

        if status == reqwest::StatusCode::TOO_MANY_REQUESTS
            || status == reqwest::StatusCode::SERVICE_UNAVAILABLE
        {
            return Err(Error::RateLimited {
                status: status.as_u16(),
                message: redact_secrets(&text),
            });
        }
        if status == reqwest::StatusCode::UNAUTHORIZED
            || status == reqwest::StatusCode::FORBIDDEN
        {
            return Err(Error::Authentication {
                message: redact_secrets(&text),
            });
        }
        if !status.is_success() {
            return Err(Error::Http {
                status: status.as_u16(),
                message: redact_secrets(&text),
            });
        }

        serde_json::from_str(&text).map_err(|e| Error::Deserialization {
            message: e.to_string(),
            body: redact_secrets(&text),
        })
    }

    fn auth_body(&self) -> AuthBody<'_> {
        AuthBody {
            apikey: self.api_key.expose_secret(),
            secretapikey: self.secret_key.expose_secret(),
        }
    }

    fn record_body<'a>(&'a self, payload: &'a RecordPayload) -> RecordBody<'a> {
        RecordBody {
            apikey: self.api_key.expose_secret(),
            secretapikey: self.secret_key.expose_secret(),
            name: &payload.name,
            record_type: &payload.record_type,
            content: &payload.content,
            ttl: (payload.ttl > 0).then(|| payload.ttl.to_string()),
            prio: payload.priority.map(|p| p.to_string()),
            notes: payload.notes.as_deref(),
        }
    }
}

/// Fail with a permanent API error when the envelope status is not SUCCESS.
fn ensure_success(status: &str, message: Option<&str>, context: &str) -> Result<(), Error> {
    if status == "SUCCESS" {
        return Ok(());
    }
    let rendered = match message {
        Some(msg) if !msg.is_empty() => format!("{context}: {status} - {msg}"),
        _ => format!("{context}: {status}"),
    };
    Err(Error::Api {
        message: redact_secrets(&rendered),
    })
}

#[derive(Serialize)]
struct AuthBody<'a> {
    apikey: &'a str,
    secretapikey: &'a str,
}

#[derive(Serialize)]
struct RecordBody<'a> {
    apikey: &'a str,
    secretapikey: &'a str,
    #[serde(skip_serializing_if = "str::is_empty")]
    name: &'a str,
    #[serde(rename = "type")]
    record_type: &'a str,
    content: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    ttl: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    prio: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    notes: Option<&'a str>,
}

#[async_trait]
impl ProviderClient for PorkbunClient {
    async fn ping(&self) -> Result<PingOutcome, Error> {
        let resp: wire::PingResponse = self.post("ping", &self.auth_body()).await?;
        Ok(PingOutcome {
            status: resp.status,
            observed_ip: resp.your_ip,
        })
    }

    async fn list_records(&self, domain: &str) -> Result<Vec<ProviderRecord>, Error> {
        let resp: wire::RetrieveResponse = self
            .post(&format!("dns/retrieve/{domain}"), &self.auth_body())
            .await?;
        ensure_success(&resp.status, None, "retrieving records")?;
        Ok(resp.records.into_iter().map(ProviderRecord::from).collect())
    }

    async fn create_record(
        &self,
        domain: &str,
        payload: &RecordPayload,
    ) -> Result<String, Error> {
        let resp: wire::CreateResponse = self
            .post(&format!("dns/create/{domain}"), &self.record_body(payload))
            .await?;
        ensure_success(&resp.status, resp.message.as_deref(), "creating record")?;
        Ok(resp.id.map(|id| id.to_string()).unwrap_or_default())
    }

    async fn update_record(
        &self,
        domain: &str,
        record_id: &str,
        payload: &RecordPayload,
    ) -> Result<(), Error> {
        let resp: wire::StatusResponse = self
            .post(
                &format!("dns/edit/{domain}/{record_id}"),
                &self.record_body(payload),
            )
            .await?;
        ensure_success(&resp.status, resp.message.as_deref(), "updating record")
    }

    async fn delete_record(&self, domain: &str, record_id: &str) -> Result<(), Error> {
        let resp: wire::StatusResponse = self
            .post(&format!("dns/delete/{domain}/{record_id}"), &self.auth_body())
            .await?;
        ensure_success(&resp.status, resp.message.as_deref(), "deleting record")
    }

    async fn delete_by_name_type(
        &self,
        domain: &str,
        record_type: &str,
        subdomain: &str,
    ) -> Result<(), Error> {
        let path = if subdomain.is_empty() {
            format!("dns/deleteByNameType/{domain}/{record_type}")
        } else {
            format!("dns/deleteByNameType/{domain}/{record_type}/{subdomain}")
        };
        let resp: wire::StatusResponse = self.post(&path, &self.auth_body()).await?;
        ensure_success(
            &resp.status,
            resp.message.as_deref(),
            "deleting records by name/type",
        )
    }

    fn attribution(&self) -> &'static str {
        "Data provided by Porkbun, LLC. Learn more at https://porkbun.com"
    }
}
