//! In-memory `ProviderClient` for engine tests.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use spfflat_provider::{
    Error as ProviderError, PingOutcome, ProviderClient, ProviderRecord, RecordPayload,
};

type Hook = Box<dyn FnMut() + Send>;

/// Map-backed provider; mutations operate on a single in-memory zone.
pub(crate) struct FakeProvider {
    zone: String,
    records: Mutex<Vec<ProviderRecord>>,
    next_id: AtomicU32,
    create_hook: Mutex<Option<Hook>>,
}

impl FakeProvider {
    pub fn new(zone: &str, seed: Vec<(&str, &str, &str)>) -> Self {
        let records = seed
            .into_iter()
            .enumerate()
            .map(|(i, (name, ty, content))| ProviderRecord {
                id: format!("seed-{i}"),
                name: name.to_string(),
                record_type: ty.to_string(),
                content: content.to_string(),
                ttl: 600,
                priority: None,
                notes: None,
            })
            .collect();
        Self {
            zone: zone.to_string(),
            records: Mutex::new(records),
            next_id: AtomicU32::new(1),
            create_hook: Mutex::new(None),
        }
    }

    /// Run `hook` at the start of every `create_record` call.
    pub fn set_create_hook(&self, hook: impl FnMut() + Send + 'static) {
        *self.create_hook.lock().unwrap() = Some(Box::new(hook));
    }

    pub fn names(&self) -> Vec<String> {
        self.records
            .lock()
            .unwrap()
            .iter()
            .map(|r| r.name.clone())
            .collect()
    }

    pub fn content_of(&self, name: &str) -> Option<String> {
        self.records
            .lock()
            .unwrap()
            .iter()
            .find(|r| r.name == name)
            .map(|r| r.content.clone())
    }
}

#[async_trait]
impl ProviderClient for FakeProvider {
    async fn ping(&self) -> Result<PingOutcome, ProviderError> {
        Ok(PingOutcome {
            status: "SUCCESS".into(),
            observed_ip: "203.0.113.1".into(),
        })
    }

    async fn list_records(&self, _domain: &str) -> Result<Vec<ProviderRecord>, ProviderError> {
        Ok(self.records.lock().unwrap().clone())
    }

    async fn create_record(
        &self,
        _domain: &str,
        payload: &RecordPayload,
    ) -> Result<String, ProviderError> {
        if let Some(hook) = self.create_hook.lock().unwrap().as_mut() {
            hook();
        }
        let id = format!("rec-{}", self.next_id.fetch_add(1, Ordering::SeqCst));
        let name = if payload.name.is_empty() {
            self.zone.clone()
        } else {
            format!("{}.{}", payload.name, self.zone)
        };
        self.records.lock().unwrap().push(ProviderRecord {
            id: id.clone(),
            name,
            record_type: payload.record_type.clone(),
            content: payload.content.clone(),
            ttl: payload.ttl,
            priority: payload.priority,
            notes: payload.notes.clone(),
        });
        Ok(id)
    }

    async fn update_record(
        &self,
        _domain: &str,
        record_id: &str,
        payload: &RecordPayload,
    ) -> Result<(), ProviderError> {
        let mut records = self.records.lock().unwrap();
        let record = records
            .iter_mut()
            .find(|r| r.id == record_id)
            .ok_or_else(|| ProviderError::Api {
                message: "no such record".into(),
            })?;
        record.content = payload.content.clone();
        record.ttl = payload.ttl;
        Ok(())
    }

    async fn delete_record(&self, _domain: &str, record_id: &str) -> Result<(), ProviderError> {
        self.records.lock().unwrap().retain(|r| r.id != record_id);
        Ok(())
    }

    async fn delete_by_name_type(
        &self,
        _domain: &str,
        record_type: &str,
        subdomain: &str,
    ) -> Result<(), ProviderError> {
        let name = if subdomain.is_empty() {
            self.zone.clone()
        } else {
            format!("{subdomain}.{}", self.zone)
        };
        self.records
            .lock()
            .unwrap()
            .retain(|r| !(r.record_type == record_type && r.name == name));
        Ok(())
    }

    fn attribution(&self) -> &'static str {
        "Test data, no attribution required"
    }
}
