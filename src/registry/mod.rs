//! Registry module for Docker registry interactions
//!
//! This module provides the client façade, the credential and transport
//! seams, and the individual Docker Registry HTTP API v2 operations.

pub mod auth;
pub mod client;
pub mod context;
pub mod operations;
pub mod transport;

pub use crate::config::{AuthConfig, RegistryLocation};
pub use auth::{Anonymous, AuthProvider, Credential, StaticAuth};
pub use client::{RegistryClient, RegistryClientBuilder};
pub use operations::{BlobContent, BlobStream, FetchMode, ManifestPayload};
pub use transport::{
    ByteStream, RequestBody, ReqwestTransport, Transport, TransportRequest, TransportResponse,
};
