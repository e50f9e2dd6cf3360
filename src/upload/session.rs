//! Upload session value and state tracking

use crate::digest::Digest;
use crate::error::{RegistryError, Result};
use std::fmt;

/// Position of an upload in the session state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadState {
    SessionStarted,
    MonolithicCommitted,
    ChunkAppended,
    Finalized,
    Committed,
}

impl fmt::Display for UploadState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            UploadState::SessionStarted => "session-started",
            UploadState::MonolithicCommitted => "monolithic-committed",
            UploadState::ChunkAppended => "chunk-appended",
            UploadState::Finalized => "finalized",
            UploadState::Committed => "committed",
        };
        f.write_str(name)
    }
}

/// Server-side upload resource as seen by the client.
///
/// Each step consumes the session and returns the next one. A session
/// dropped before commit is left orphaned on the registry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadSession {
    pub upload_id: String,
    pub bytes_written: u64,
    pub running_digest: Option<Digest>,
    pub state: UploadState,
}

impl UploadSession {
    pub fn started(upload_id: impl Into<String>) -> Self {
        Self {
            upload_id: upload_id.into(),
            bytes_written: 0,
            running_digest: None,
            state: UploadState::SessionStarted,
        }
    }

    /// Whole blob accepted by a single PUT
    pub fn monolithic_committed(self, size: u64, digest: Digest) -> Self {
        Self {
            bytes_written: size,
            running_digest: Some(digest),
            state: UploadState::MonolithicCommitted,
            ..self
        }
    }

    /// Record an append; the registry may have rotated the session id
    pub fn appended(self, rotated_id: Option<String>, bytes: u64, digest: Digest) -> Self {
        Self {
            upload_id: rotated_id.unwrap_or(self.upload_id),
            bytes_written: self.bytes_written + bytes,
            running_digest: Some(digest),
            state: UploadState::ChunkAppended,
        }
    }

    pub fn finalized(self) -> Self {
        Self {
            state: UploadState::Finalized,
            ..self
        }
    }

    /// Close the session. Only a monolithic commit or a finalize can lead here.
    pub fn commit(self) -> Result<Self> {
        match self.state {
            UploadState::MonolithicCommitted | UploadState::Finalized => Ok(Self {
                state: UploadState::Committed,
                ..self
            }),
            other => Err(RegistryError::Protocol(format!(
                "Cannot commit upload session {} in state {}",
                self.upload_id, other
            ))),
        }
    }

    /// Identity of the stored blob, once the session is committed
    pub fn descriptor(&self) -> Option<BlobDescriptor> {
        match (&self.state, &self.running_digest) {
            (UploadState::Committed, Some(digest)) => Some(BlobDescriptor {
                digest: digest.clone(),
                size: self.bytes_written,
            }),
            _ => None,
        }
    }
}

/// Identity of a committed blob
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlobDescriptor {
    pub digest: Digest,
    pub size: u64,
}
