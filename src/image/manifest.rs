//! Image manifest and tag listing documents
//!
//! Models the Docker Image Manifest V2 Schema 2 shape: a config descriptor
//! plus an ordered list of layer descriptors.

use crate::digest::Digest;
use crate::error::{RegistryError, Result};
use serde::{Deserialize, Serialize};

pub const DOCKER_MANIFEST_V2: &str = "application/vnd.docker.distribution.manifest.v2+json";
pub const DOCKER_CONTAINER_CONFIG: &str = "application/vnd.docker.container.image.v1+json";
pub const DOCKER_LAYER_TAR_GZIP: &str = "application/vnd.docker.image.rootfs.diff.tar.gzip";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Manifest {
    pub schema_version: u32,
    pub media_type: String,
    pub config: Layer,
    pub layers: Vec<Layer>,
}

/// Content descriptor used for both the config blob and filesystem layers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Layer {
    pub media_type: String,
    pub size: u64,
    pub digest: Digest,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub urls: Option<Vec<String>>,
}

impl Layer {
    pub fn new(media_type: impl Into<String>, size: u64, digest: Digest) -> Self {
        Self {
            media_type: media_type.into(),
            size,
            digest,
            urls: None,
        }
    }
}

impl Manifest {
    pub fn new(config: Layer, layers: Vec<Layer>) -> Self {
        Manifest {
            schema_version: 2,
            media_type: DOCKER_MANIFEST_V2.to_string(),
            config,
            layers,
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.schema_version != 2 {
            return Err(RegistryError::Validation(format!(
                "Unsupported schema version {}",
                self.schema_version
            )));
        }
        Ok(())
    }

    /// Bytes sent to the registry and digested for content addressing
    pub fn to_canonical_bytes(&self) -> Result<Vec<u8>> {
        serde_json::to_vec(self)
            .map_err(|e| RegistryError::Validation(format!("Failed to serialize manifest: {}", e)))
    }

    /// Sum of layer sizes, config excluded
    pub fn total_layer_size(&self) -> u64 {
        self.layers.iter().map(|layer| layer.size).sum()
    }
}

/// Longest tag the registry grammar allows
pub const MAX_TAG_LENGTH: usize = 128;

/// Check `tag` against `[A-Za-z0-9_][A-Za-z0-9_.-]{0,127}`
pub fn validate_tag(tag: &str) -> Result<()> {
    let mut chars = tag.chars();
    let valid_start = chars
        .next()
        .is_some_and(|c| c.is_ascii_alphanumeric() || c == '_');
    let valid_rest = chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-'));

    if !valid_start || !valid_rest || tag.len() > MAX_TAG_LENGTH {
        return Err(RegistryError::Validation(format!("Invalid tag '{}'", tag)));
    }
    Ok(())
}

/// Response of `GET /v2/{name}/tags/list`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TagResult {
    pub name: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub tags: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub child: Option<Vec<String>>,
}

fn null_as_empty<'de, D>(deserializer: D) -> std::result::Result<Vec<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(Option::<Vec<String>>::deserialize(deserializer)?.unwrap_or_default())
}
