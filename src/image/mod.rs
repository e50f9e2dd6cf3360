//! Image documents exchanged with the registry
//!
//! Only the manifest and tag listing shapes live here; blobs are opaque bytes
//! addressed by [`Digest`](crate::digest::Digest).

pub mod manifest;

pub use manifest::{
    DOCKER_CONTAINER_CONFIG, DOCKER_LAYER_TAR_GZIP, DOCKER_MANIFEST_V2, Layer, MAX_TAG_LENGTH,
    Manifest, TagResult, validate_tag,
};
