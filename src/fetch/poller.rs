// cloudsql-restore-resource/src/fetch/poller.rs
use async_trait::async_trait;
use std::time::{Duration, Instant};
use tracing::{info, warn};

use crate::config::{InstanceRef, PollConfig};
use crate::errors::{ResourceError, Result};
use crate::model::{Operation, OperationStatus};
use crate::operations;
use crate::sqladmin::SqlAdminClient;

/// Pause between polls.
#[async_trait]
pub trait Delay: Send + Sync {
    async fn wait(&self, duration: Duration);
}

pub struct TokioDelay;

#[async_trait]
impl Delay for TokioDelay {
    async fn wait(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// What one fetched snapshot means for the poll loop.
#[derive(Debug, PartialEq)]
enum PollStep {
    Continue,
    Finished,
    Failed,
}

fn classify(status: &OperationStatus) -> PollStep {
    match status {
        OperationStatus::Done => PollStep::Finished,
        OperationStatus::Pending | OperationStatus::Running => PollStep::Continue,
        OperationStatus::Unspecified | OperationStatus::Other(_) => PollStep::Failed,
    }
}

pub struct OperationPoller<'a> {
    client: &'a SqlAdminClient,
    delay: &'a dyn Delay,
    policy: PollConfig,
}

impl<'a> OperationPoller<'a> {
    pub fn new(client: &'a SqlAdminClient, delay: &'a dyn Delay, policy: PollConfig) -> Self {
        OperationPoller { client, delay, policy }
    }

    /// Fetches `operation_id` until it is DONE.
    ///
    /// PENDING and RUNNING wait one interval and poll again. Any other status
    /// stops immediately with [`ResourceError::UnexpectedStatus`].
    pub async fn wait_until_done(&self, instance: &InstanceRef, operation_id: &str) -> Result<Operation> {
        let started = Instant::now();
        let mut attempts: u32 = 0;
        loop {
            let operation = operations::fetch_operation(self.client, instance, operation_id).await?;
            attempts += 1;

            match classify(&operation.status) {
                PollStep::Finished => {
                    info!("Restore successful!");
                    for message in operation.error_messages() {
                        warn!("Operation {} reported: {}", operation.operation_id, message);
                    }
                    return Ok(operation);
                }
                PollStep::Failed => {
                    return Err(ResourceError::UnexpectedStatus {
                        operation_id: operation_id.to_string(),
                        status: operation.status.to_string(),
                    });
                }
                PollStep::Continue => {
                    info!("Restore state: {}", operation.status);
                }
            }

            if self.policy.max_attempts.is_some_and(|max| attempts >= max)
                || self
                    .policy
                    .deadline
                    .is_some_and(|deadline| started.elapsed() + self.policy.interval > deadline)
            {
                return Err(ResourceError::PollExhausted {
                    operation_id: operation_id.to_string(),
                    attempts,
                });
            }
            self.delay.wait(self.policy.interval).await;
        }
    }
}
