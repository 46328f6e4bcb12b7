// cloudsql-restore-resource/src/operations/mod.rs
use tracing::debug;

use crate::config::InstanceRef;
use crate::errors::Result;
use crate::model::Operation;
use crate::sqladmin::SqlAdminClient;

/// How a caller wants restore operations ordered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationOrder {
    /// Descending `insertTime`, used to find the latest or in-flight restore.
    NewestInsertedFirst,
    /// Ascending `endTime`, used for the stable version history.
    OldestEndedFirst,
}

/// Keeps only RESTORE_VOLUME operations, preserving their relative order.
pub fn filter_restores(operations: Vec<Operation>) -> Vec<Operation> {
    operations.into_iter().filter(Operation::is_restore).collect()
}

/// Stable sort; absent timestamps order before present ones.
pub fn sort_operations(operations: &mut [Operation], order: OperationOrder) {
    match order {
        OperationOrder::NewestInsertedFirst => operations.sort_by(|a, b| b.insert_time.cmp(&a.insert_time)),
        OperationOrder::OldestEndedFirst => operations.sort_by(|a, b| a.end_time.cmp(&b.end_time)),
    }
}

pub async fn restore_operations(
    client: &SqlAdminClient,
    instance: &InstanceRef,
    order: OperationOrder,
) -> Result<Vec<Operation>> {
    let mut restores = filter_restores(client.list_operations(instance).await?);
    sort_operations(&mut restores, order);
    debug!(count = restores.len(), ?order, "restore operations");
    Ok(restores)
}

pub async fn latest_restore(client: &SqlAdminClient, instance: &InstanceRef) -> Result<Option<Operation>> {
    Ok(restore_operations(client, instance, OperationOrder::NewestInsertedFirst)
        .await?
        .into_iter()
        .next())
}

pub async fn fetch_operation(client: &SqlAdminClient, instance: &InstanceRef, operation_id: &str) -> Result<Operation> {
    client.get_operation(instance, operation_id).await
}
