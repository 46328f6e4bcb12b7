pub(crate) mod selector; // Chooses which backup run to restore
pub(crate) mod submit; // In-flight guard and restoreBackup submission

use anyhow::{Context, Result};
use crate::config::AppConfig;
use crate::model::ResourceOutput;
use crate::sqladmin::SqlAdminClient;

/// Public entry point for the out verb.
/// Selects a backup, then restores it onto the target unless a restore is already running.
pub async fn run_out_flow(app_config: &AppConfig, client: &SqlAdminClient) -> Result<ResourceOutput> {
    let out_config = match &app_config.operation {
        Some(crate::config::OperationConfig::Out(cfg)) => cfg,
        _ => anyhow::bail!("Out operation selected but no out configuration found."),
    };
    let target = &app_config.source.target;

    let backup = selector::select_backup(client, &out_config.backup_source, out_config.pinned_backup.as_deref())
        .await
        .with_context(|| format!("Failed to select a backup of {}", out_config.backup_source))?;

    let outcome = submit::submit_restore(client, target, &out_config.backup_source, &backup)
        .await
        .with_context(|| format!("Failed to restore backup {} onto {}", backup.backup_id, target))?;

    Ok(outcome.to_output())
}
