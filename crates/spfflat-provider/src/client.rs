//! The `ProviderClient` trait: the capability set every DNS provider
//! backend implements.
//!
//! Callers program only to this interface; concrete clients carry their
//! own credential shape. The trait is object-safe so the engine can hold
//! an `Arc<dyn ProviderClient>` chosen at config-load time.

use async_trait::async_trait;

use crate::error::Error;
use crate::record::{PingOutcome, ProviderRecord, RecordPayload};

#[async_trait]
pub trait ProviderClient: Send + Sync {
    /// Credential and reachability check.
    async fn ping(&self) -> Result<PingOutcome, Error>;

    /// All records in the domain's zone, every type. Callers filter.
    async fn list_records(&self, domain: &str) -> Result<Vec<ProviderRecord>, Error>;

    /// Create a record; returns the provider-assigned id.
    async fn create_record(&self, domain: &str, payload: &RecordPayload)
        -> Result<String, Error>;

    /// Replace the identified record's fields in place.
    async fn update_record(
        &self,
        domain: &str,
        record_id: &str,
        payload: &RecordPayload,
    ) -> Result<(), Error>;

    /// Delete a record by provider id.
    async fn delete_record(&self, domain: &str, record_id: &str) -> Result<(), Error>;

    /// Delete every record matching `(record_type, subdomain)`;
    /// an empty subdomain targets the apex.
    async fn delete_by_name_type(
        &self,
        domain: &str,
        record_type: &str,
        subdomain: &str,
    ) -> Result<(), Error>;

    /// Create records one by one; the first failure aborts and propagates.
    async fn bulk_create(&self, domain: &str, payloads: &[RecordPayload]) -> Result<(), Error> {
        for payload in payloads {
            self.create_record(domain, payload).await?;
        }
        Ok(())
    }

    /// Update records one by one; the first failure aborts and propagates.
    async fn bulk_update(
        &self,
        domain: &str,
        updates: &[(String, RecordPayload)],
    ) -> Result<(), Error> {
        for (id, payload) in updates {
            self.update_record(domain, id, payload).await?;
        }
        Ok(())
    }

    /// Delete records one by one; the first failure aborts and propagates.
    async fn bulk_delete(&self, domain: &str, record_ids: &[String]) -> Result<(), Error> {
        for id in record_ids {
            self.delete_record(domain, id).await?;
        }
        Ok(())
    }

    /// Human-readable provider notice appended to user-facing reports.
    fn attribution(&self) -> &'static str;
}
