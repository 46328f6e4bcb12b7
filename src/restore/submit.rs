// cloudsql-restore-resource/src/restore/submit.rs
//! Submits a restore unless one is already running.
//!
//! The in-flight check and the POST are two separate calls, so two `out`
//! steps racing on one instance can still both submit. Closing that gap
//! needs an idempotency token on the remote submit request.
use tracing::info;

use crate::config::InstanceRef;
use crate::errors::Result;
use crate::model::time::format_display_time;
use crate::model::{BackupItem, MetadataField, Operation, OperationStatus, ResourceOutput, Version};
use crate::operations;
use crate::sqladmin::SqlAdminClient;

#[derive(Debug, Clone, PartialEq)]
pub enum SubmitOutcome {
    /// The newest restore on the instance is still RUNNING; nothing was posted.
    InFlight(Operation),
    /// A new restore was posted for `backup_id`.
    Submitted { operation: Operation, backup_id: String },
}

impl SubmitOutcome {
    pub fn operation(&self) -> &Operation {
        match self {
            SubmitOutcome::InFlight(operation) => operation,
            SubmitOutcome::Submitted { operation, .. } => operation,
        }
    }

    pub fn to_output(&self) -> ResourceOutput {
        let operation = self.operation();
        let mut metadata = Vec::with_capacity(5);
        if let SubmitOutcome::Submitted { backup_id, .. } = self {
            metadata.push(MetadataField::new("backup-id", backup_id.clone()));
        }
        metadata.extend([
            MetadataField::new("status", operation.status.to_string()),
            MetadataField::new("insert-time", format_display_time(operation.insert_time)),
            MetadataField::new("type", operation.operation_type.clone()),
            MetadataField::new("target-instance", operation.target_id.clone()),
        ]);
        ResourceOutput {
            version: Version::new(operation.operation_id.clone()),
            metadata,
        }
    }
}

pub async fn submit_restore(
    client: &SqlAdminClient,
    target: &InstanceRef,
    backup_source: &InstanceRef,
    backup: &BackupItem,
) -> Result<SubmitOutcome> {
    if let Some(latest) = operations::latest_restore(client, target).await? {
        if latest.status == OperationStatus::Running {
            info!("Current instance state: {}", latest.status);
            return Ok(SubmitOutcome::InFlight(latest));
        }
    }

    let operation = client.restore_backup(target, backup_source, &backup.backup_id).await?;
    info!("Submitted restore {} of backup {}", operation.operation_id, backup.backup_id);
    Ok(SubmitOutcome::Submitted {
        operation,
        backup_id: backup.backup_id.clone(),
    })
}
