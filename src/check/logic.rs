use tracing::info;

use crate::config::InstanceRef;
use crate::errors::Result;
use crate::model::Version;
use crate::operations::{self, OperationOrder};
use crate::sqladmin::SqlAdminClient;

/// Builds the versions `check` reports.
///
/// When `current` is given, that operation is fetched first so a missing id
/// fails the check. The fetched record is not used: the result is always the
/// full restore history ordered by ascending end time.
pub async fn version_stream(
    client: &SqlAdminClient,
    instance: &InstanceRef,
    current: Option<&str>,
) -> Result<impl Iterator<Item = Version> + use<>> {
    if let Some(operation_id) = current {
        let confirmed = operations::fetch_operation(client, instance, operation_id).await?;
        info!("Current version {} is {}", confirmed.operation_id, confirmed.status);
    }

    let restores = operations::restore_operations(client, instance, OperationOrder::OldestEndedFirst).await?;
    Ok(restores.into_iter().map(|op| Version::new(op.operation_id)))
}
