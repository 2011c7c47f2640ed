//! Backup serialization: machine-readable JSON and human-readable text.

use std::collections::BTreeMap;
use std::path::Path;

use crate::backup::types::RecordSet;
use crate::error::CoreError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackupFormat {
    Json,
    Text,
}

impl BackupFormat {
    pub fn from_name(name: &str) -> Result<Self, CoreError> {
        match name.to_lowercase().as_str() {
            "json" => Ok(Self::Json),
            "txt" | "text" => Ok(Self::Text),
            other => Err(CoreError::BackupFormat(format!(
                "unknown backup format '{other}' (expected json or txt)"
            ))),
        }
    }

    /// Pick the format from a backup file's extension.
    pub fn from_path(path: &Path) -> Result<Self, CoreError> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .ok_or_else(|| {
                CoreError::BackupFormat(format!(
                    "cannot determine backup format of {}",
                    path.display()
                ))
            })?;
        Self::from_name(ext)
    }

    pub fn extension(&self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::Text => "txt",
        }
    }

    pub fn serialize(&self, set: &RecordSet) -> Result<String, CoreError> {
        match self {
            Self::Json => serde_json::to_string_pretty(set)
                .map_err(|e| CoreError::BackupFormat(e.to_string())),
            Self::Text => Ok(render_text(set)),
        }
    }

    /// Parse a backup payload. Only JSON payloads are machine-readable;
    /// the text form is for human review.
    pub fn deserialize(&self, data: &str) -> Result<RecordSet, CoreError> {
        match self {
            Self::Json => {
                serde_json::from_str(data).map_err(|e| CoreError::BackupFormat(e.to_string()))
            }
            Self::Text => Err(CoreError::BackupFormat(
                "text backups are write-only; import requires the JSON format".into(),
            )),
        }
    }
}

/// Human-readable rendering grouped by record type.
fn render_text(set: &RecordSet) -> String {
    let mut grouped: BTreeMap<&str, Vec<&crate::backup::types::BackupRecord>> = BTreeMap::new();
    for record in &set.records {
        grouped.entry(&record.record_type).or_default().push(record);
    }

    let mut out = String::new();
    out.push_str(&format!("DNS Records for {}\n", set.domain));
    out.push_str(&format!(
        "Exported: {}\n",
        set.exported_at.format("%Y-%m-%dT%H:%M:%SZ")
    ));
    out.push_str(&format!("Provider: {}\n", set.provider));
    out.push_str(&format!("Version: {}\n", set.version));
    out.push_str(&format!("Total records: {}\n", set.records.len()));

    for (record_type, records) in grouped {
        out.push_str(&format!("\n{record_type} Records:\n"));
        for record in records {
            out.push_str(&format!(
                "  {} -> {} (ttl: {}",
                record.name, record.content, record.ttl
            ));
            if let Some(priority) = record.priority {
                out.push_str(&format!(", priority: {priority}"));
            }
            out.push(')');
            if let Some(notes) = &record.notes {
                out.push_str(&format!(" # {notes}"));
            }
            out.push('\n');
        }
    }

    if let Some(attribution) = &set.attribution {
        out.push_str(&format!("\n{attribution}\n"));
    }
    out
}
