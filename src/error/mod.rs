//! Error types and handlers for registry operations

pub mod handlers;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, RegistryError>;

#[derive(Debug, Error)]
pub enum RegistryError {
    /// No response was obtained from the registry
    #[error("Transport error: {0}")]
    Transport(String),

    /// A response arrived but its status is outside the accepted set
    #[error("Unexpected status {status}: {body}")]
    UnexpectedStatus { status: u16, body: String },

    /// Unparsable response, or a required header/field is missing
    #[error("Protocol error: {0}")]
    Protocol(String),

    /// The registry did not hand out an upload session
    #[error("Upload initiation failed: {0}")]
    UploadInit(String),

    /// The streaming append step of a chunked upload was rejected
    #[error("Chunk upload failed (status {status}): {body}")]
    ChunkUpload { status: u16, body: String },

    /// A manifest write was rejected
    #[error("Upload failed (status {status}): {body}")]
    Upload { status: u16, body: String },

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Redirect limit exceeded, last URL: {last_url}")]
    RedirectLoop { last_url: String },

    #[error(
        "Failed to mount {digest} from {source_repository} into {destination_repository} (status {status})"
    )]
    Mount {
        digest: String,
        source_repository: String,
        destination_repository: String,
        status: u16,
    },

    #[error("Digest mismatch: expected {expected}, computed {actual}")]
    DigestMismatch { expected: String, actual: String },

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<reqwest::Error> for RegistryError {
    fn from(err: reqwest::Error) -> Self {
        RegistryError::Transport(err.to_string())
    }
}

impl From<url::ParseError> for RegistryError {
    fn from(err: url::ParseError) -> Self {
        RegistryError::Validation(err.to_string())
    }
}

impl RegistryError {
    /// HTTP status carried by the error, if a response was received
    pub fn status(&self) -> Option<u16> {
        match self {
            RegistryError::UnexpectedStatus { status, .. }
            | RegistryError::ChunkUpload { status, .. }
            | RegistryError::Upload { status, .. }
            | RegistryError::Mount { status, .. } => Some(*status),
            _ => None,
        }
    }
}
