// cloudsql-restore-resource/src/sqladmin/transport.rs
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};
use std::time::Duration;
use tracing::debug;
use url::Url;

use super::{Headers, HttpResponse, Transport};
use crate::errors::{ResourceError, Result};

pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    pub fn new(request_timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(request_timeout)
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| ResourceError::Transport {
                url: String::new(),
                message: format!("failed to build HTTP client: {e}"),
            })?;
        Ok(ReqwestTransport { client })
    }

    async fn send(&self, url: &Url, request: RequestBuilder, headers: &Headers) -> Result<HttpResponse> {
        let request = headers
            .iter()
            .fold(request, |req, (name, value)| req.header(*name, value));
        let response = request.send().await.map_err(|e| transport_error(url, e))?;
        let status = response.status().as_u16();
        let body = response.text().await.map_err(|e| transport_error(url, e))?;
        debug!(%url, status, "received response");
        Ok(HttpResponse { status, body })
    }
}

fn transport_error(url: &Url, err: reqwest::Error) -> ResourceError {
    ResourceError::Transport {
        url: url.to_string(),
        message: err.to_string(),
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn get(&self, url: &Url, headers: &Headers) -> Result<HttpResponse> {
        self.send(url, self.client.get(url.clone()), headers).await
    }

    async fn post(&self, url: &Url, headers: &Headers, body: &serde_json::Value) -> Result<HttpResponse> {
        let request = self.client.post(url.clone()).body(body.to_string());
        self.send(url, request, headers).await
    }
}
