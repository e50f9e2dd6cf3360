//! SHA256 content digests
//!
//! [`Digest`] is the content-addressable identity of blobs and manifests.
//! [`DigestAccumulator`] hashes and counts bytes as they are observed so that
//! streamed uploads can be digested without buffering them.

use crate::error::{RegistryError, Result};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use sha2::{Digest as _, Sha256};
use std::fmt;
use std::str::FromStr;

pub const SHA256_ALGORITHM: &str = "sha256";

/// SHA256 of zero bytes
pub const EMPTY_DIGEST_HEX: &str =
    "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855";

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Digest {
    algorithm: String,
    hex: String,
}

impl Digest {
    /// Digest of a complete in-memory buffer
    pub fn compute(data: &[u8]) -> Self {
        let mut accumulator = DigestAccumulator::new();
        accumulator.update(data);
        accumulator.finish().0
    }

    /// Build from a bare hex string, validating it
    pub fn from_hex(hex: &str) -> Result<Self> {
        if !is_valid_sha256_hex(hex) {
            return Err(RegistryError::Validation(format!(
                "Invalid SHA256 digest: expected 64 lowercase hex characters, got '{}'",
                hex
            )));
        }
        Ok(Self {
            algorithm: SHA256_ALGORITHM.to_string(),
            hex: hex.to_string(),
        })
    }

    pub fn empty() -> Self {
        Self {
            algorithm: SHA256_ALGORITHM.to_string(),
            hex: EMPTY_DIGEST_HEX.to_string(),
        }
    }

    pub fn algorithm(&self) -> &str {
        &self.algorithm
    }

    pub fn hex(&self) -> &str {
        &self.hex
    }

    /// Abbreviated form for log lines
    pub fn short(&self) -> &str {
        &self.hex[..12]
    }

    /// Check that `data` hashes to this digest
    pub fn verify(&self, data: &[u8]) -> Result<()> {
        let computed = Digest::compute(data);
        if &computed != self {
            return Err(RegistryError::DigestMismatch {
                expected: self.to_string(),
                actual: computed.to_string(),
            });
        }
        Ok(())
    }
}

fn is_valid_sha256_hex(hex: &str) -> bool {
    hex.len() == 64 && hex.chars().all(|c| matches!(c, '0'..='9' | 'a'..='f'))
}

impl fmt::Display for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.algorithm, self.hex)
    }
}

impl FromStr for Digest {
    type Err = RegistryError;

    fn from_str(s: &str) -> Result<Self> {
        let (algorithm, hex) = s.split_once(':').ok_or_else(|| {
            RegistryError::Validation(format!("Digest missing algorithm prefix: {}", s))
        })?;
        if algorithm != SHA256_ALGORITHM {
            return Err(RegistryError::Validation(format!(
                "Unsupported digest algorithm '{}' in {}",
                algorithm, s
            )));
        }
        Digest::from_hex(hex)
    }
}

impl Serialize for Digest {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Digest {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// Running hash plus byte count over everything passed to [`update`](Self::update)
#[derive(Clone, Default)]
pub struct DigestAccumulator {
    hasher: Sha256,
    bytes: u64,
}

impl DigestAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn update(&mut self, data: &[u8]) {
        self.hasher.update(data);
        self.bytes += data.len() as u64;
    }

    pub fn bytes_observed(&self) -> u64 {
        self.bytes
    }

    /// Digest of what has been observed so far, without consuming the accumulator
    pub fn current(&self) -> Digest {
        self.clone().finish().0
    }

    pub fn finish(self) -> (Digest, u64) {
        let digest = Digest {
            algorithm: SHA256_ALGORITHM.to_string(),
            hex: hex::encode(self.hasher.finalize()),
        };
        (digest, self.bytes)
    }
}

impl fmt::Debug for DigestAccumulator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DigestAccumulator")
            .field("bytes", &self.bytes)
            .finish()
    }
}
