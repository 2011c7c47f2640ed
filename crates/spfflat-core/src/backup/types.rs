//! Backup data model: record sets, options, and import results.

use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use spfflat_provider::ProviderRecord;

use crate::error::CoreError;

/// Backup file format version.
pub const BACKUP_VERSION: &str = "1.0";

/// A DNS record as stored in a backup payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackupRecord {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub record_type: String,
    pub content: String,
    pub ttl: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl From<ProviderRecord> for BackupRecord {
    fn from(r: ProviderRecord) -> Self {
        Self {
            id: r.id,
            name: r.name,
            record_type: r.record_type,
            content: r.content,
            ttl: r.ttl,
            priority: r.priority,
            notes: r.notes,
        }
    }
}

/// A complete exported record set for one domain.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordSet {
    pub domain: String,
    pub provider: String,
    pub version: String,
    pub exported_at: DateTime<Utc>,
    pub records: Vec<BackupRecord>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attribution: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct ExportOptions {
    /// Restrict the export to these record types (empty = all).
    pub record_types: Vec<String>,
}

/// How import handles a record that already exists at the provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConflictStrategy {
    /// Skip existing records, import only new ones.
    #[default]
    Skip,
    /// Overwrite existing records with the backup version.
    Replace,
    /// Additive union: create what is missing, leave the rest.
    Merge,
    /// Fail on the first conflict.
    Abort,
}

impl FromStr for ConflictStrategy {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "skip" => Ok(Self::Skip),
            "replace" => Ok(Self::Replace),
            "merge" => Ok(Self::Merge),
            "abort" => Ok(Self::Abort),
            other => Err(CoreError::BackupFormat(format!(
                "unknown conflict strategy '{other}' (expected skip, replace, merge, or abort)"
            ))),
        }
    }
}

impl std::fmt::Display for ConflictStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Skip => "skip",
            Self::Replace => "replace",
            Self::Merge => "merge",
            Self::Abort => "abort",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Default)]
pub struct ImportOptions {
    pub record_types: Vec<String>,
    pub strategy: ConflictStrategy,
    pub dry_run: bool,
}

/// One logged conflict between an existing and an imported record.
#[derive(Debug, Clone)]
pub struct Conflict {
    pub existing: Option<BackupRecord>,
    pub imported: BackupRecord,
    pub kind: String,
    pub resolution: String,
}

/// Outcome counts for one import run. Partial progress is reported
/// honestly when the run is cancelled midway.
#[derive(Debug, Default)]
pub struct ImportReport {
    pub domain: String,
    pub total: usize,
    pub created: usize,
    pub updated: usize,
    pub skipped: usize,
    pub failed: usize,
    pub conflicts: Vec<Conflict>,
    pub errors: Vec<String>,
    pub cancelled: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strategy_parses_case_insensitively() {
        assert_eq!(
            "REPLACE".parse::<ConflictStrategy>().unwrap(),
            ConflictStrategy::Replace
        );
        assert_eq!(
            "skip".parse::<ConflictStrategy>().unwrap(),
            ConflictStrategy::Skip
        );
        assert!("overwrite".parse::<ConflictStrategy>().is_err());
    }
}
