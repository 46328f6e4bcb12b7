// In-memory collaborators for exercising flows without the network.
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use url::Url;

use super::{Authenticator, Headers, HttpResponse, SqlAdminClient, Transport};
use crate::errors::{ResourceError, Result};
use crate::fetch::poller::Delay;

pub const TEST_BASE_URL: &str = "https://sqladmin.test/";

pub struct StaticAuthenticator;

#[async_trait]
impl Authenticator for StaticAuthenticator {
    async fn bearer_token(&self) -> Result<String> {
        Ok("test-token".to_string())
    }
}

#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub method: &'static str,
    pub url: String,
    pub authorization: Option<String>,
    pub body: Option<serde_json::Value>,
}

#[derive(Clone, Default)]
pub struct CallLog(Arc<Mutex<Vec<RecordedCall>>>);

impl CallLog {
    pub fn all(&self) -> Vec<RecordedCall> {
        self.0.lock().unwrap().clone()
    }

    pub fn urls(&self) -> Vec<String> {
        self.all().into_iter().map(|c| c.url).collect()
    }

    pub fn posts(&self) -> Vec<RecordedCall> {
        self.all().into_iter().filter(|c| c.method == "POST").collect()
    }

    pub fn gets_to(&self, path: &str) -> usize {
        self.all()
            .iter()
            .filter(|c| c.method == "GET" && Url::parse(&c.url).map(|u| u.path() == path).unwrap_or(false))
            .count()
    }

    fn push(&self, call: RecordedCall) {
        self.0.lock().unwrap().push(call);
    }
}

struct Route {
    method: &'static str,
    path: String,
    responses: VecDeque<HttpResponse>,
}

/// Serves canned responses keyed by method and URL path.
///
/// Responses registered for the same route are served in order; the last
/// one is repeated once the queue is down to it.
#[derive(Default)]
pub struct ScriptedTransport {
    routes: Mutex<Vec<Route>>,
    calls: CallLog,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_get(self, path: &str, status: u16, body: serde_json::Value) -> Self {
        self.route("GET", path, status, body.to_string())
    }

    pub fn on_get_raw(self, path: &str, status: u16, body: &str) -> Self {
        self.route("GET", path, status, body.to_string())
    }

    pub fn on_post(self, path: &str, status: u16, body: serde_json::Value) -> Self {
        self.route("POST", path, status, body.to_string())
    }

    pub fn calls(&self) -> CallLog {
        self.calls.clone()
    }

    fn route(self, method: &'static str, path: &str, status: u16, body: String) -> Self {
        let response = HttpResponse { status, body };
        {
            let mut routes = self.routes.lock().unwrap();
            match routes.iter_mut().find(|r| r.method == method && r.path == path) {
                Some(route) => route.responses.push_back(response),
                None => routes.push(Route {
                    method,
                    path: path.to_string(),
                    responses: VecDeque::from([response]),
                }),
            }
        }
        self
    }

    fn respond(
        &self,
        method: &'static str,
        url: &Url,
        headers: &Headers,
        body: Option<serde_json::Value>,
    ) -> Result<HttpResponse> {
        self.calls.push(RecordedCall {
            method,
            url: url.to_string(),
            authorization: headers
                .iter()
                .find(|(name, _)| *name == "Authorization")
                .map(|(_, value)| value.clone()),
            body,
        });
        let mut routes = self.routes.lock().unwrap();
        let route = routes
            .iter_mut()
            .find(|r| r.method == method && r.path == url.path())
            .ok_or_else(|| ResourceError::Transport {
                url: url.to_string(),
                message: "no scripted response".to_string(),
            })?;
        let response = if route.responses.len() > 1 {
            route.responses.pop_front()
        } else {
            route.responses.front().cloned()
        };
        response.ok_or_else(|| ResourceError::Transport {
            url: url.to_string(),
            message: "scripted route exhausted".to_string(),
        })
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn get(&self, url: &Url, headers: &Headers) -> Result<HttpResponse> {
        self.respond("GET", url, headers, None)
    }

    async fn post(&self, url: &Url, headers: &Headers, body: &serde_json::Value) -> Result<HttpResponse> {
        self.respond("POST", url, headers, Some(body.clone()))
    }
}

pub fn test_client(transport: ScriptedTransport) -> (SqlAdminClient, CallLog) {
    let calls = transport.calls();
    let base = Url::parse(TEST_BASE_URL).unwrap();
    (
        SqlAdminClient::new(base, Box::new(StaticAuthenticator), Box::new(transport)),
        calls,
    )
}

/// Counts waits instead of sleeping.
#[derive(Clone, Default)]
pub struct RecordingDelay {
    waits: Arc<AtomicUsize>,
}

impl RecordingDelay {
    pub fn count(&self) -> usize {
        self.waits.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Delay for RecordingDelay {
    async fn wait(&self, _duration: Duration) {
        self.waits.fetch_add(1, Ordering::SeqCst);
    }
}
