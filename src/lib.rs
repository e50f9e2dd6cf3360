//! Registry Transfer Library
//!
//! Client for the Docker Registry HTTP API v2: blob uploads (monolithic and
//! streamed with client-side digesting), redirect-following blob downloads,
//! manifest read/write and cross-repository mounts.

pub mod cli;
pub mod config;
pub mod digest;
pub mod error;
pub mod image;
pub mod logging;
pub mod registry;
pub mod upload;

pub use config::{AuthConfig, ClientConfig, RegistryLocation};
pub use digest::Digest;
pub use error::{RegistryError, Result};
pub use logging::Logger;
pub use registry::{RegistryClient, RegistryClientBuilder};
