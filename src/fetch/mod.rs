// cloudsql-restore-resource/src/fetch/mod.rs
pub(crate) mod poller;

use anyhow::{Context, Result};
use std::fs;
use std::path::Path;
use tracing::info;

use crate::config::AppConfig;
use crate::model::time::format_display_time;
use crate::model::{MetadataField, Operation, ResourceOutput, Version};
use crate::sqladmin::SqlAdminClient;
use poller::{Delay, OperationPoller};

pub const OPERATION_RECORD_FILE: &str = "operation.json";
pub const OPERATION_ID_FILE: &str = "operation_id";

/// Public entry point for the in verb.
/// Polls the requested restore operation until it finishes and describes the result.
pub async fn run_in_flow(app_config: &AppConfig, client: &SqlAdminClient, delay: &dyn Delay) -> Result<ResourceOutput> {
    let in_config = match &app_config.operation {
        Some(crate::config::OperationConfig::In(cfg)) => cfg,
        _ => anyhow::bail!("In operation selected but no in configuration found."),
    };

    let target = &app_config.source.target;
    let poller = OperationPoller::new(client, delay, app_config.source.poll.clone());
    let operation = poller
        .wait_until_done(target, &in_config.operation_id)
        .await
        .with_context(|| format!("Restore operation {} on {} did not complete", in_config.operation_id, target))?;

    if let Some(destination) = &in_config.destination {
        write_operation_record(destination, &operation)?;
    }
    Ok(completed_output(&operation))
}

pub fn completed_output(operation: &Operation) -> ResourceOutput {
    ResourceOutput {
        version: Version::new(operation.operation_id.clone()),
        metadata: vec![
            MetadataField::new("backup-id", operation.backup_id()),
            MetadataField::new("status", operation.status.to_string()),
            MetadataField::new("end-time", format_display_time(operation.end_time)),
            MetadataField::new("type", operation.operation_type.clone()),
            MetadataField::new("target-instance", operation.target_id.clone()),
        ],
    }
}

fn write_operation_record(destination: &Path, operation: &Operation) -> Result<()> {
    fs::create_dir_all(destination)
        .with_context(|| format!("Failed to create destination directory: {}", destination.display()))?;

    let record_path = destination.join(OPERATION_RECORD_FILE);
    let record = serde_json::to_string_pretty(operation).context("Failed to encode operation record")?;
    fs::write(&record_path, record)
        .with_context(|| format!("Failed to write operation record: {}", record_path.display()))?;

    let id_path = destination.join(OPERATION_ID_FILE);
    fs::write(&id_path, &operation.operation_id)
        .with_context(|| format!("Failed to write operation id: {}", id_path.display()))?;

    info!("Wrote {} to {}", OPERATION_RECORD_FILE, destination.display());
    Ok(())
}
