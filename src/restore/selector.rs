// cloudsql-restore-resource/src/restore/selector.rs
use std::fs;
use std::path::Path;
use tracing::info;

use crate::config::InstanceRef;
use crate::errors::{ResourceError, Result};
use crate::model::BackupItem;
use crate::sqladmin::SqlAdminClient;

/// Picks the backup with the latest `enqueuedTime`.
pub fn latest_backup(backups: Vec<BackupItem>, source: &InstanceRef) -> Result<BackupItem> {
    backups
        .into_iter()
        .max_by(|a, b| a.enqueued_time.cmp(&b.enqueued_time))
        .ok_or_else(|| ResourceError::EmptyBackupSet {
            project: source.project.clone(),
            instance: source.instance.clone(),
        })
}

/// Loads a backup record persisted by a prior step instead of querying the API.
pub fn load_pinned_backup(path: &Path) -> Result<BackupItem> {
    let raw = fs::read_to_string(path)?;
    let backup: BackupItem = serde_json::from_str(&raw).map_err(|e| ResourceError::decode("pinned backup record", e))?;
    if backup.backup_id.is_empty() {
        return Err(ResourceError::Config(format!(
            "pinned backup record {} has no id",
            path.display()
        )));
    }
    Ok(backup)
}

pub async fn select_backup(
    client: &SqlAdminClient,
    source: &InstanceRef,
    pinned: Option<&Path>,
) -> Result<BackupItem> {
    match pinned {
        Some(path) => {
            let backup = load_pinned_backup(path)?;
            info!("Imported backup ID: {}", backup.backup_id);
            Ok(backup)
        }
        None => {
            let backup = latest_backup(client.list_backup_runs(source).await?, source)?;
            info!("Latest backup ID: {}", backup.backup_id);
            Ok(backup)
        }
    }
}
