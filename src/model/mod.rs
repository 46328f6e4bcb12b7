// cloudsql-restore-resource/src/model/mod.rs
pub mod time;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// Operation kind produced by `restoreBackup`.
pub const RESTORE_VOLUME: &str = "RESTORE_VOLUME";

/// Lifecycle state of a remote operation.
///
/// A missing or UNSPECIFIED status maps to `Unspecified`; any other value
/// besides PENDING, RUNNING and DONE is kept verbatim in `Other`. Both are
/// failed terminal states.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum OperationStatus {
    Pending,
    Running,
    Done,
    #[default]
    Unspecified,
    Other(String),
}

impl OperationStatus {
    pub fn as_str(&self) -> &str {
        match self {
            OperationStatus::Pending => "PENDING",
            OperationStatus::Running => "RUNNING",
            OperationStatus::Done => "DONE",
            OperationStatus::Unspecified => "SQL_OPERATION_STATUS_UNSPECIFIED",
            OperationStatus::Other(s) => s,
        }
    }
}

impl From<&str> for OperationStatus {
    fn from(value: &str) -> Self {
        match value {
            "PENDING" => OperationStatus::Pending,
            "RUNNING" => OperationStatus::Running,
            "DONE" => OperationStatus::Done,
            "" | "SQL_OPERATION_STATUS_UNSPECIFIED" => OperationStatus::Unspecified,
            other => OperationStatus::Other(other.to_string()),
        }
    }
}

impl fmt::Display for OperationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for OperationStatus {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = Option::<String>::deserialize(deserializer)?;
        Ok(raw.as_deref().map(OperationStatus::from).unwrap_or_default())
    }
}

impl Serialize for OperationStatus {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BackupContext {
    #[serde(default, deserialize_with = "string_or_number")]
    pub backup_id: String,
    #[serde(default)]
    pub kind: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct OperationErrorEntry {
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct OperationError {
    #[serde(default)]
    pub errors: Vec<OperationErrorEntry>,
}

/// Snapshot of one Cloud SQL admin operation as returned by the API.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Operation {
    #[serde(default)]
    pub status: OperationStatus,
    #[serde(rename = "name", default)]
    pub operation_id: String,
    #[serde(default)]
    pub operation_type: String,
    #[serde(default)]
    pub target_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_project: Option<String>,
    #[serde(default)]
    pub insert_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub start_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub end_time: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub backup_context: Option<BackupContext>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<OperationError>,
}

impl Operation {
    pub fn is_restore(&self) -> bool {
        self.operation_type == RESTORE_VOLUME
    }

    /// Backup id from `backupContext`, empty when the operation has none.
    pub fn backup_id(&self) -> &str {
        self.backup_context
            .as_ref()
            .map(|ctx| ctx.backup_id.as_str())
            .unwrap_or_default()
    }

    /// Messages from the operation's `error` block, if any.
    pub fn error_messages(&self) -> Vec<String> {
        self.error
            .iter()
            .flat_map(|e| e.errors.iter())
            .map(|entry| match (&entry.code, &entry.message) {
                (Some(code), Some(message)) => format!("{code}: {message}"),
                (None, Some(message)) => message.clone(),
                (Some(code), None) => code.clone(),
                (None, None) => "unknown error".to_string(),
            })
            .collect()
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OperationsList {
    #[serde(default)]
    pub items: Vec<Operation>,
    #[serde(default)]
    pub next_page_token: Option<String>,
}

/// A restorable backup run of an instance.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BackupItem {
    #[serde(rename = "id", default, deserialize_with = "string_or_number")]
    pub backup_id: String,
    #[serde(default)]
    pub enqueued_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub status: String,
    #[serde(rename = "type", default)]
    pub backup_type: String,
    #[serde(default)]
    pub instance: String,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub kind: Option<String>,
    #[serde(default)]
    pub start_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub end_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub window_start_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub self_link: Option<String>,
    #[serde(default)]
    pub backup_kind: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BackupRunsList {
    #[serde(default)]
    pub items: Vec<BackupItem>,
    #[serde(default)]
    pub next_page_token: Option<String>,
}

/// The protocol's version: one operation id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Version {
    pub operation_id: String,
}

impl Version {
    pub fn new(operation_id: impl Into<String>) -> Self {
        Version {
            operation_id: operation_id.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MetadataField {
    pub name: String,
    pub value: String,
}

impl MetadataField {
    pub fn new(name: &str, value: impl Into<String>) -> Self {
        MetadataField {
            name: name.to_string(),
            value: value.into(),
        }
    }
}

/// Document printed by `in` and `out`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResourceOutput {
    pub version: Version,
    pub metadata: Vec<MetadataField>,
}

#[cfg(test)]
impl ResourceOutput {
    pub fn metadata_value(&self, name: &str) -> Option<&str> {
        self.metadata
            .iter()
            .find(|field| field.name == name)
            .map(|field| field.value.as_str())
    }
}

// Google encodes int64 ids as JSON strings; records written by other tools may not.
fn string_or_number<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Text(String),
        Number(serde_json::Number),
        Null(()),
    }

    Ok(match Raw::deserialize(deserializer)? {
        Raw::Text(s) => s,
        Raw::Number(n) => n.to_string(),
        Raw::Null(()) => String::new(),
    })
}
