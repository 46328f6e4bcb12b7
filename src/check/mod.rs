// cloudsql-restore-resource/src/check/mod.rs
pub(crate) mod logic;

use anyhow::{Context, Result};
use crate::config::AppConfig;
use crate::model::Version;
use crate::sqladmin::SqlAdminClient;

/// Public entry point for the check verb.
/// Returns the restore operations of the target instance as versions, oldest-ended first.
pub async fn run_check_flow(app_config: &AppConfig, client: &SqlAdminClient) -> Result<Vec<Version>> {
    let check_config = match &app_config.operation {
        Some(crate::config::OperationConfig::Check(cfg)) => cfg,
        _ => anyhow::bail!("Check operation selected but no check configuration found."),
    };

    let versions = logic::version_stream(client, &app_config.source.target, check_config.operation_id.as_deref())
        .await
        .with_context(|| format!("Failed to list restore operations for {}", app_config.source.target))?;
    Ok(versions.collect())
}
