// cloudsql-restore-resource/src/sqladmin/mod.rs
pub(crate) mod auth;
pub(crate) mod transport;
#[cfg(test)]
pub(crate) mod testing;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::json;
use tracing::debug;
use url::Url;

use crate::config::{InstanceRef, SourceConfig};
use crate::errors::{ResourceError, Result};
use crate::model::{BackupItem, BackupRunsList, Operation, OperationsList};

pub use auth::ServiceAccountAuthenticator;
pub use transport::ReqwestTransport;

/// Yields a bearer token for each API call.
#[async_trait]
pub trait Authenticator: Send + Sync {
    async fn bearer_token(&self) -> Result<String>;
}

#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

pub type Headers = Vec<(&'static str, String)>;

/// Raw HTTP capability used by [`SqlAdminClient`].
#[async_trait]
pub trait Transport: Send + Sync {
    async fn get(&self, url: &Url, headers: &Headers) -> Result<HttpResponse>;
    async fn post(&self, url: &Url, headers: &Headers, body: &serde_json::Value) -> Result<HttpResponse>;
}

/// Typed access to the four Cloud SQL Admin endpoints this resource needs.
pub struct SqlAdminClient {
    base_url: Url,
    auth: Box<dyn Authenticator>,
    transport: Box<dyn Transport>,
}

impl SqlAdminClient {
    pub fn new(base_url: Url, auth: Box<dyn Authenticator>, transport: Box<dyn Transport>) -> Self {
        SqlAdminClient {
            base_url,
            auth,
            transport,
        }
    }

    /// Builds the production client: service-account credentials over reqwest.
    pub fn from_source(source: &SourceConfig) -> Result<Self> {
        let auth = ServiceAccountAuthenticator::from_json(&source.private_key, source.request_timeout)?;
        let transport = ReqwestTransport::new(source.request_timeout)?;
        Ok(Self::new(source.api_endpoint.clone(), Box::new(auth), Box::new(transport)))
    }

    pub async fn list_operations(&self, instance: &InstanceRef) -> Result<Vec<Operation>> {
        let mut operations = Vec::new();
        let mut page_token: Option<String> = None;
        loop {
            let mut query = vec![("instance", instance.instance.as_str())];
            if let Some(token) = page_token.as_deref() {
                query.push(("pageToken", token));
            }
            let url = self.endpoint(&["projects", instance.project.as_str(), "operations"], &query)?;
            let page: OperationsList = self.get_json(&url, "operations list").await?;
            operations.extend(page.items);
            match page.next_page_token.filter(|t| !t.is_empty()) {
                Some(next) => page_token = Some(next),
                None => break,
            }
        }
        debug!(count = operations.len(), instance = %instance, "listed operations");
        Ok(operations)
    }

    pub async fn get_operation(&self, instance: &InstanceRef, operation_id: &str) -> Result<Operation> {
        let url = self.endpoint(
            &["projects", instance.project.as_str(), "operations", operation_id],
            &[("instance", instance.instance.as_str())],
        )?;
        self.get_json(&url, "operation").await
    }

    pub async fn list_backup_runs(&self, instance: &InstanceRef) -> Result<Vec<BackupItem>> {
        let mut backups = Vec::new();
        let mut page_token: Option<String> = None;
        loop {
            let query: Vec<(&str, &str)> = match page_token.as_deref() {
                Some(token) => vec![("pageToken", token)],
                None => Vec::new(),
            };
            let url = self.endpoint(
                &["projects", instance.project.as_str(), "instances", instance.instance.as_str(), "backupRuns"],
                &query,
            )?;
            let page: BackupRunsList = self.get_json(&url, "backup runs list").await?;
            backups.extend(page.items);
            match page.next_page_token.filter(|t| !t.is_empty()) {
                Some(next) => page_token = Some(next),
                None => break,
            }
        }
        debug!(count = backups.len(), instance = %instance, "listed backup runs");
        Ok(backups)
    }

    /// Submits `restoreBackup` on `target` using `backup_id` taken from `backup_source`.
    pub async fn restore_backup(
        &self,
        target: &InstanceRef,
        backup_source: &InstanceRef,
        backup_id: &str,
    ) -> Result<Operation> {
        let url = self.endpoint(
            &["projects", target.project.as_str(), "instances", target.instance.as_str(), "restoreBackup"],
            &[],
        )?;
        let body = json!({
            "restoreBackupContext": {
                "backupRunId": backup_id,
                "project": backup_source.project,
                "instanceId": backup_source.instance,
            }
        });
        let mut headers = self.auth_headers().await?;
        headers.push(("Content-Type", "application/json".to_string()));
        let response = self.transport.post(&url, &headers, &body).await?;
        decode_response(&url, response, "restore response")
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &Url, what: &'static str) -> Result<T> {
        let headers = self.auth_headers().await?;
        let response = self.transport.get(url, &headers).await?;
        decode_response(url, response, what)
    }

    async fn auth_headers(&self) -> Result<Headers> {
        let token = self.auth.bearer_token().await?;
        Ok(vec![("Authorization", format!("Bearer {token}"))])
    }

    fn endpoint(&self, segments: &[&str], query: &[(&str, &str)]) -> Result<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| ResourceError::Config(format!("api_endpoint cannot be a base URL: {}", self.base_url)))?
            .pop_if_empty()
            .push("v1")
            .extend(segments);
        if !query.is_empty() {
            url.query_pairs_mut().extend_pairs(query);
        }
        Ok(url)
    }
}

fn decode_response<T: DeserializeOwned>(url: &Url, response: HttpResponse, what: &'static str) -> Result<T> {
    if !response.is_success() {
        return Err(ResourceError::Http {
            status: response.status,
            url: url.to_string(),
            body: response.body,
        });
    }
    serde_json::from_str(&response.body).map_err(|e| ResourceError::decode(what, e))
}
