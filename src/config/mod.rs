// cloudsql-restore-resource/src/config/mod.rs
use anyhow::{Context, Result};
use serde::Deserialize;
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;
use url::Url;

const DEFAULT_API_ENDPOINT: &str = "https://sqladmin.googleapis.com/";
const DEFAULT_POLL_INTERVAL_SECS: u64 = 30;
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 60;
/// File a prior step leaves behind for `params.source_backup`.
pub const PINNED_BACKUP_FILE: &str = "output.json";

// Structs for deserializing the request document read from stdin
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawSource {
    pub project: Option<String>,
    pub instance: Option<String>,
    pub private_key: Option<String>,
    pub api_endpoint: Option<String>,
    pub poll_interval_seconds: Option<u64>,
    pub max_poll_attempts: Option<u32>,
    pub poll_timeout_seconds: Option<u64>,
    pub request_timeout_seconds: Option<u64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawVersion {
    pub operation_id: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawParams {
    pub source_project: Option<String>,
    pub source_instance: Option<String>,
    pub source_backup: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawRequest {
    #[serde(default)]
    pub source: RawSource,
    #[serde(default)]
    pub version: Option<RawVersion>,
    #[serde(default)]
    pub params: Option<RawParams>,
}

impl RawRequest {
    fn operation_id(&self) -> Option<String> {
        self.version
            .as_ref()
            .and_then(|v| non_empty(&v.operation_id))
    }
}

// Validated configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstanceRef {
    pub project: String,
    pub instance: String,
}

impl InstanceRef {
    pub fn new(project: impl Into<String>, instance: impl Into<String>) -> Self {
        InstanceRef {
            project: project.into(),
            instance: instance.into(),
        }
    }
}

impl fmt::Display for InstanceRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.project, self.instance)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollConfig {
    pub interval: Duration,
    pub max_attempts: Option<u32>,
    pub deadline: Option<Duration>,
}

impl Default for PollConfig {
    fn default() -> Self {
        PollConfig {
            interval: Duration::from_secs(DEFAULT_POLL_INTERVAL_SECS),
            max_attempts: None,
            deadline: None,
        }
    }
}

#[derive(Clone)]
pub struct SourceConfig {
    pub target: InstanceRef,
    pub private_key: String,
    pub api_endpoint: Url,
    pub request_timeout: Duration,
    pub poll: PollConfig,
}

// Keep the key out of logs and error reports.
impl fmt::Debug for SourceConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SourceConfig")
            .field("target", &self.target)
            .field("private_key", &"<redacted>")
            .field("api_endpoint", &self.api_endpoint.as_str())
            .field("request_timeout", &self.request_timeout)
            .field("poll", &self.poll)
            .finish()
    }
}

#[derive(Debug, Clone)]
pub struct CheckConfig {
    pub operation_id: Option<String>,
}

#[derive(Debug, Clone)]
pub struct InConfig {
    pub operation_id: String,
    pub destination: Option<PathBuf>,
}

#[derive(Debug, Clone)]
pub struct OutConfig {
    pub backup_source: InstanceRef,
    pub pinned_backup: Option<PathBuf>,
}

#[derive(Debug, Clone)]
pub enum OperationConfig {
    Check(CheckConfig),
    In(InConfig),
    Out(OutConfig),
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub operation: Option<OperationConfig>, // Filled by main once the verb is known
    pub source: SourceConfig,
    pub raw_request: RawRequest,
}

impl AppConfig {
    pub fn load_from_json(request: &str) -> Result<Self> {
        let raw_request: RawRequest =
            serde_json::from_str(request).context("Failed to parse request JSON from stdin")?;
        let source = load_source_config(&raw_request.source)?;
        Ok(AppConfig {
            operation: None,
            source,
            raw_request,
        })
    }
}

pub fn load_source_config(raw: &RawSource) -> Result<SourceConfig> {
    let project = non_empty(&raw.project).context("source.project must be set")?;
    let instance = non_empty(&raw.instance).context("source.instance must be set")?;
    let private_key = non_empty(&raw.private_key).context("source.private_key must be set")?;

    let endpoint = non_empty(&raw.api_endpoint).unwrap_or_else(|| DEFAULT_API_ENDPOINT.to_string());
    let api_endpoint =
        Url::parse(&endpoint).with_context(|| format!("source.api_endpoint is not a valid URL: {}", endpoint))?;

    let interval = raw.poll_interval_seconds.unwrap_or(DEFAULT_POLL_INTERVAL_SECS);
    if interval == 0 {
        return Err(anyhow::anyhow!("source.poll_interval_seconds must be greater than zero"));
    }
    if raw.max_poll_attempts == Some(0) {
        return Err(anyhow::anyhow!("source.max_poll_attempts must be greater than zero"));
    }

    Ok(SourceConfig {
        target: InstanceRef::new(project, instance),
        private_key,
        api_endpoint,
        request_timeout: Duration::from_secs(
            raw.request_timeout_seconds.unwrap_or(DEFAULT_REQUEST_TIMEOUT_SECS),
        ),
        poll: PollConfig {
            interval: Duration::from_secs(interval),
            max_attempts: raw.max_poll_attempts,
            deadline: raw.poll_timeout_seconds.map(Duration::from_secs),
        },
    })
}

pub fn load_check_config(raw_request: &RawRequest) -> Result<CheckConfig> {
    Ok(CheckConfig {
        operation_id: raw_request.operation_id(),
    })
}

pub fn load_in_config(raw_request: &RawRequest, destination: Option<&Path>) -> Result<InConfig> {
    let operation_id = raw_request
        .operation_id()
        .context("version.operation_id must be set for in")?;
    Ok(InConfig {
        operation_id,
        destination: destination.map(Path::to_path_buf),
    })
}

/// Backup source defaults to the target instance; a pinned backup resolves
/// to `<build dir>/<source_backup>/output.json`.
pub fn load_out_config(raw_request: &RawRequest, target: &InstanceRef, build_dir: Option<&Path>) -> Result<OutConfig> {
    let params = raw_request.params.clone().unwrap_or_default();
    let backup_source = InstanceRef::new(
        non_empty(&params.source_project).unwrap_or_else(|| target.project.clone()),
        non_empty(&params.source_instance).unwrap_or_else(|| target.instance.clone()),
    );

    let pinned_backup = match non_empty(&params.source_backup) {
        Some(step) => {
            let dir = build_dir.context("params.source_backup is set but no build directory was passed to out")?;
            Some(dir.join(step).join(PINNED_BACKUP_FILE))
        }
        None => None,
    };

    Ok(OutConfig {
        backup_source,
        pinned_backup,
    })
}

fn non_empty(value: &Option<String>) -> Option<String> {
    value
        .as_ref()
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn request(value: serde_json::Value) -> anyhow::Result<RawRequest> {
        Ok(serde_json::from_value(value)?)
    }

    fn source_json() -> serde_json::Value {
        json!({ "project": "p1", "instance": "db1", "private_key": "{}" })
    }

    #[test]
    fn test_source_defaults() -> anyhow::Result<()> {
        let raw = request(json!({ "source": source_json() }))?;
        let source = load_source_config(&raw.source)?;

        assert_eq!(source.target, InstanceRef::new("p1", "db1"));
        assert_eq!(source.api_endpoint.as_str(), DEFAULT_API_ENDPOINT);
        assert_eq!(source.poll, PollConfig::default());
        assert_eq!(source.poll.interval, Duration::from_secs(30));
        assert_eq!(source.request_timeout, Duration::from_secs(60));
        Ok(())
    }

    #[test]
    fn test_source_poll_bounds() -> anyhow::Result<()> {
        let raw = request(json!({ "source": {
            "project": "p1", "instance": "db1", "private_key": "{}",
            "poll_interval_seconds": 5, "max_poll_attempts": 10, "poll_timeout_seconds": 600
        }}))?;
        let poll = load_source_config(&raw.source)?.poll;

        assert_eq!(poll.interval, Duration::from_secs(5));
        assert_eq!(poll.max_attempts, Some(10));
        assert_eq!(poll.deadline, Some(Duration::from_secs(600)));
        Ok(())
    }

    #[test]
    fn test_source_requires_instance_and_key() -> anyhow::Result<()> {
        let raw = request(json!({ "source": { "project": "p1", "instance": "  ", "private_key": "{}" } }))?;
        let err = load_source_config(&raw.source).unwrap_err();
        assert!(err.to_string().contains("source.instance"));

        let raw = request(json!({ "source": { "project": "p1", "instance": "db1" } }))?;
        let err = load_source_config(&raw.source).unwrap_err();
        assert!(err.to_string().contains("source.private_key"));
        Ok(())
    }

    #[test]
    fn test_source_rejects_zero_interval() -> anyhow::Result<()> {
        let raw = request(json!({ "source": {
            "project": "p1", "instance": "db1", "private_key": "{}", "poll_interval_seconds": 0
        }}))?;
        assert!(load_source_config(&raw.source).is_err());
        Ok(())
    }

    #[test]
    fn test_debug_redacts_private_key() -> anyhow::Result<()> {
        let raw = request(json!({ "source": {
            "project": "p1", "instance": "db1", "private_key": "super-secret"
        }}))?;
        let rendered = format!("{:?}", load_source_config(&raw.source)?);
        assert!(!rendered.contains("super-secret"));
        Ok(())
    }

    #[test]
    fn test_check_config_treats_empty_version_as_absent() -> anyhow::Result<()> {
        let raw = request(json!({ "source": source_json(), "version": { "operation_id": "" } }))?;
        assert_eq!(load_check_config(&raw)?.operation_id, None);

        let raw = request(json!({ "source": source_json(), "version": null }))?;
        assert_eq!(load_check_config(&raw)?.operation_id, None);

        let raw = request(json!({ "source": source_json(), "version": { "operation_id": "op-1" } }))?;
        assert_eq!(load_check_config(&raw)?.operation_id.as_deref(), Some("op-1"));
        Ok(())
    }

    #[test]
    fn test_in_config_requires_operation_id() -> anyhow::Result<()> {
        let raw = request(json!({ "source": source_json() }))?;
        assert!(load_in_config(&raw, None).is_err());

        let raw = request(json!({ "source": source_json(), "version": { "operation_id": "op-42" } }))?;
        let cfg = load_in_config(&raw, Some(Path::new("/tmp/dest")))?;
        assert_eq!(cfg.operation_id, "op-42");
        assert_eq!(cfg.destination, Some(PathBuf::from("/tmp/dest")));
        Ok(())
    }

    #[test]
    fn test_out_config_defaults_backup_source_to_target() -> anyhow::Result<()> {
        let raw = request(json!({ "source": source_json() }))?;
        let cfg = load_out_config(&raw, &InstanceRef::new("p1", "db1"), None)?;
        assert_eq!(cfg.backup_source, InstanceRef::new("p1", "db1"));
        assert_eq!(cfg.pinned_backup, None);
        Ok(())
    }

    #[test]
    fn test_out_config_resolves_pinned_backup_path() -> anyhow::Result<()> {
        let raw = request(json!({
            "source": source_json(),
            "params": { "source_project": "p0", "source_instance": "prod", "source_backup": "latest-backup" }
        }))?;
        let cfg = load_out_config(&raw, &InstanceRef::new("p1", "db1"), Some(Path::new("/tmp/build")))?;

        assert_eq!(cfg.backup_source, InstanceRef::new("p0", "prod"));
        assert_eq!(
            cfg.pinned_backup,
            Some(PathBuf::from("/tmp/build/latest-backup/output.json"))
        );
        Ok(())
    }

    #[test]
    fn test_out_config_pinned_backup_needs_build_dir() -> anyhow::Result<()> {
        let raw = request(json!({ "source": source_json(), "params": { "source_backup": "b" } }))?;
        assert!(load_out_config(&raw, &InstanceRef::new("p1", "db1"), None).is_err());
        Ok(())
    }

    #[test]
    fn test_app_config_rejects_malformed_request() {
        assert!(AppConfig::load_from_json("{ not json").is_err());
    }
}
