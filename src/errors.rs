use thiserror::Error;

#[derive(Error, Debug)]
pub enum ResourceError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Credential error: {0}")]
    Credential(String),

    #[error("Transport error for {url}: {message}")]
    Transport { url: String, message: String },

    #[error("HTTP {status} from {url}: {body}")]
    Http { status: u16, url: String, body: String },

    #[error("Failed to decode {what}: {source}")]
    Decode {
        what: &'static str,
        #[source]
        source: serde_json::Error,
    },

    #[error("Empty backup runs for instance {project}:{instance}")]
    EmptyBackupSet { project: String, instance: String },

    #[error("Restore state: {status} (operation {operation_id})")]
    UnexpectedStatus { operation_id: String, status: String },

    #[error("Gave up polling operation {operation_id} after {attempts} attempts")]
    PollExhausted { operation_id: String, attempts: u32 },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl ResourceError {
    pub fn decode(what: &'static str, source: serde_json::Error) -> Self {
        ResourceError::Decode { what, source }
    }
}

pub type Result<T> = std::result::Result<T, ResourceError>;
