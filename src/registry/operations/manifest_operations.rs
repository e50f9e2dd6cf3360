//! Manifest operations for registry client
//!
//! Implements Docker Registry v2 manifest operations:
//! - Manifest download (GET /v2/{name}/manifests/{tag})
//! - Manifest upload (PUT /v2/{name}/manifests/{reference}), content
//!   addressed by a digest computed before the request is sent

use crate::digest::Digest;
use crate::error::handlers::HttpErrorHandler;
use crate::error::{RegistryError, Result};
use crate::image::manifest::{DOCKER_MANIFEST_V2, Manifest, validate_tag};
use crate::registry::context::RegistryContext;
use crate::registry::transport::RequestBody;
use bytes::Bytes;
use reqwest::header::{ACCEPT, CONTENT_LENGTH, CONTENT_TYPE, HeaderValue};
use reqwest::{Method, StatusCode};
use std::sync::Arc;

pub const DOCKER_CONTENT_DIGEST: &str = "Docker-Content-Digest";

/// Manifest content handed to [`ManifestService::put_manifest`]
#[derive(Debug, Clone)]
pub enum ManifestPayload {
    /// Already-serialized bytes, sent and digested verbatim
    Raw(Bytes),
    Typed(Manifest),
}

impl ManifestPayload {
    fn into_parts(self) -> Result<(Bytes, String)> {
        match self {
            ManifestPayload::Raw(bytes) => {
                let media_type = serde_json::from_slice::<serde_json::Value>(&bytes)
                    .ok()
                    .and_then(|v| v.get("mediaType").and_then(|m| m.as_str()).map(String::from))
                    .unwrap_or_else(|| DOCKER_MANIFEST_V2.to_string());
                Ok((bytes, media_type))
            }
            ManifestPayload::Typed(manifest) => {
                manifest.validate()?;
                let media_type = manifest.media_type.clone();
                Ok((Bytes::from(manifest.to_canonical_bytes()?), media_type))
            }
        }
    }
}

impl From<Manifest> for ManifestPayload {
    fn from(manifest: Manifest) -> Self {
        ManifestPayload::Typed(manifest)
    }
}

impl From<Vec<u8>> for ManifestPayload {
    fn from(bytes: Vec<u8>) -> Self {
        ManifestPayload::Raw(Bytes::from(bytes))
    }
}

#[derive(Clone)]
pub struct ManifestService {
    ctx: Arc<RegistryContext>,
}

impl ManifestService {
    pub fn new(ctx: Arc<RegistryContext>) -> Self {
        Self { ctx }
    }

    /// Fetch the manifest a tag currently points to
    pub async fn fetch_manifest(&self, tag: &str) -> Result<Manifest> {
        validate_tag(tag)?;

        let logger = self.ctx.logger();
        let url = self.ctx.reference_endpoint("manifests", tag)?;
        let request = self
            .ctx
            .request(Method::GET, url)
            .header(ACCEPT, HeaderValue::from_static(DOCKER_MANIFEST_V2));

        let response = self.ctx.send(request).await?;
        if response.status != StatusCode::OK {
            let (status, body) = HttpErrorHandler::read_body(response).await;
            logger.warning(&format!(
                "Manifest {}:{} unavailable (status {}: {})",
                self.ctx.repository(),
                tag,
                status,
                HttpErrorHandler::describe(status)
            ));
            return Err(RegistryError::NotFound(format!(
                "manifest {}:{} (status {}): {}",
                self.ctx.repository(),
                tag,
                status,
                body
            )));
        }

        let body = response.bytes().await?;
        let document: serde_json::Value = serde_json::from_slice(&body).map_err(|e| {
            RegistryError::Protocol(format!("Manifest body is not valid JSON: {}", e))
        })?;
        if document.get("config").is_none() {
            return Err(RegistryError::NotFound(format!(
                "manifest {}:{} has no config",
                self.ctx.repository(),
                tag
            )));
        }

        let manifest: Manifest = serde_json::from_value(document).map_err(|e| {
            RegistryError::Protocol(format!("Manifest does not match schema 2: {}", e))
        })?;
        logger.detail(&format!(
            "Fetched manifest {}:{} with {} layers",
            self.ctx.repository(),
            tag,
            manifest.layers.len()
        ));
        Ok(manifest)
    }

    /// Store a manifest, tagged or addressed only by its digest.
    ///
    /// Returns the digest computed locally over the bytes sent.
    pub async fn put_manifest(
        &self,
        tag: Option<&str>,
        manifest: impl Into<ManifestPayload>,
    ) -> Result<Digest> {
        let logger = self.ctx.logger();
        let (bytes, media_type) = manifest.into().into_parts()?;
        let digest = Digest::compute(&bytes);

        let reference = match tag {
            Some(tag) => {
                validate_tag(tag)?;
                tag.to_string()
            }
            None => digest.to_string(),
        };

        let content_type = HeaderValue::from_str(&media_type).map_err(|_| {
            RegistryError::Validation(format!("Invalid manifest media type '{}'", media_type))
        })?;
        let url = self.ctx.reference_endpoint("manifests", &reference)?;
        let request = self
            .ctx
            .request(Method::PUT, url)
            .header(CONTENT_TYPE, content_type)
            .header(CONTENT_LENGTH, HeaderValue::from(bytes.len()))
            .body(RequestBody::Bytes(bytes));

        logger.detail(&format!(
            "Uploading manifest {} as {}:{}",
            digest,
            self.ctx.repository(),
            reference
        ));

        let response = self.ctx.send(request).await?;
        if !matches!(response.status, StatusCode::OK | StatusCode::CREATED) {
            let (status, body) = HttpErrorHandler::read_body(response).await;
            logger.error(&format!(
                "Manifest upload rejected with status {}: {}",
                status,
                HttpErrorHandler::describe(status)
            ));
            return Err(RegistryError::Upload { status, body });
        }

        if let Some(reported) = response.header_str(DOCKER_CONTENT_DIGEST) {
            if reported != digest.to_string() {
                logger.warning(&format!(
                    "Registry reported manifest digest {} but {} was sent",
                    reported, digest
                ));
            }
        }
        self.ctx.release(response).await;

        logger.success(&format!(
            "Manifest uploaded for {}:{}",
            self.ctx.repository(),
            reference
        ));
        Ok(digest)
    }
}
