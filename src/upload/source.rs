//! Byte sources accepted by the blob writer

use crate::digest::Digest;
use crate::registry::transport::ByteStream;
use bytes::Bytes;
use futures::stream::{self, StreamExt};

pub enum UploadSource {
    /// Full content in memory with its digest already known
    KnownLength { data: Bytes, digest: Digest },
    /// Content of unknown length and digest, hashed while it is sent
    UnknownLength(ByteStream),
}

impl UploadSource {
    /// Buffer with a locally computed digest
    pub fn from_bytes(data: impl Into<Bytes>) -> Self {
        let data = data.into();
        let digest = Digest::compute(&data);
        UploadSource::KnownLength { data, digest }
    }

    pub fn from_stream(stream: ByteStream) -> Self {
        UploadSource::UnknownLength(stream)
    }

    /// Stream over an in-memory buffer, forcing the chunked path
    pub fn stream_of(chunks: Vec<Bytes>) -> Self {
        UploadSource::UnknownLength(stream::iter(chunks.into_iter().map(Ok)).boxed())
    }

    pub fn is_known_length(&self) -> bool {
        matches!(self, UploadSource::KnownLength { .. })
    }
}

impl std::fmt::Debug for UploadSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            UploadSource::KnownLength { data, digest } => f
                .debug_struct("KnownLength")
                .field("size", &data.len())
                .field("digest", &digest.to_string())
                .finish(),
            UploadSource::UnknownLength(_) => f.write_str("UnknownLength(..)"),
        }
    }
}
