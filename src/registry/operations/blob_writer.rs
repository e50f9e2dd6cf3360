//! Blob upload operations for registry client
//!
//! Implements the Docker Registry v2 staged upload pattern:
//! - Session start (POST /v2/{name}/blobs/uploads/)
//! - Monolithic commit (PUT /v2/{name}/blobs/uploads/{id}?digest=...)
//! - Streaming append (PATCH /v2/{name}/blobs/uploads/{id}) followed by an
//!   empty finalize PUT carrying the digest computed while sending
//!
//! The digest returned to the caller is always derived from bytes that left
//! this client. Registry-reported digests are only compared and logged.
//! Failed uploads are not retried and their sessions are not cleaned up.

use crate::digest::Digest;
use crate::error::handlers::HttpErrorHandler;
use crate::error::{RegistryError, Result};
use crate::registry::context::RegistryContext;
use crate::registry::operations::manifest_operations::DOCKER_CONTENT_DIGEST;
use crate::registry::transport::{ByteStream, RequestBody, TransportResponse};
use crate::upload::{BlobDescriptor, ObservedStream, UploadSession, UploadSource, UploadState};
use bytes::Bytes;
use futures::StreamExt;
use reqwest::header::{CONTENT_LENGTH, CONTENT_TYPE, HeaderValue};
use reqwest::{Method, StatusCode};
use std::sync::Arc;
use std::time::Instant;
use url::Url;

pub const DOCKER_UPLOAD_UUID: &str = "Docker-Upload-Uuid";

const OCTET_STREAM: &str = "application/octet-stream";

#[derive(Clone)]
pub struct BlobWriter {
    ctx: Arc<RegistryContext>,
}

impl BlobWriter {
    pub fn new(ctx: Arc<RegistryContext>) -> Self {
        Self { ctx }
    }

    /// Upload a blob, choosing the path from the kind of source
    pub async fn upload(&self, source: UploadSource) -> Result<BlobDescriptor> {
        let logger = self.ctx.logger();
        let started = Instant::now();

        let result: Result<BlobDescriptor> = async {
            match source {
                UploadSource::KnownLength { data, digest } => {
                    logger.info(&format!(
                        "Uploading blob {} ({}) to {}",
                        digest.short(),
                        logger.format_size(data.len() as u64),
                        self.ctx.repository()
                    ));
                    let session = self.initiate().await?;
                    self.commit_monolithic(session, data, digest).await
                }
                UploadSource::UnknownLength(stream) => {
                    logger.info(&format!(
                        "Streaming blob of unknown size to {}",
                        self.ctx.repository()
                    ));
                    let session = self.initiate().await?;
                    let session = self.append(session, stream).await?;
                    self.finalize(session).await
                }
            }
        }
        .await;

        match &result {
            Ok(blob) => logger.success(&format!(
                "Blob {} ({}) committed in {}",
                blob.digest.short(),
                logger.format_size(blob.size),
                logger.format_duration(started.elapsed())
            )),
            Err(e) => logger.error(&format!(
                "Upload to {} failed: {}",
                self.ctx.repository(),
                e
            )),
        }
        result
    }

    /// Buffer upload with a locally computed digest (monolithic path)
    pub async fn upload_bytes(&self, data: impl Into<Bytes>) -> Result<BlobDescriptor> {
        self.upload(UploadSource::from_bytes(data)).await
    }

    /// Stream upload of unknown length (chunked path)
    pub async fn upload_stream(&self, stream: ByteStream) -> Result<BlobDescriptor> {
        self.upload(UploadSource::from_stream(stream)).await
    }

    /// Open an upload session. The registry must name it in `Docker-Upload-Uuid`.
    pub async fn initiate(&self) -> Result<UploadSession> {
        let url = self.ctx.endpoint("blobs/uploads/")?;
        let request = self
            .ctx
            .request(Method::POST, url)
            .header(CONTENT_LENGTH, HeaderValue::from(0u64));

        let response = self.ctx.send(request).await?;
        if !response.status.is_success() {
            return Err(HttpErrorHandler::unexpected_status(response).await);
        }

        let upload_id = match response.header_str(DOCKER_UPLOAD_UUID) {
            Some(id) if is_usable_session_id(id) => id.to_string(),
            Some(id) => {
                return Err(RegistryError::UploadInit(format!(
                    "registry returned unusable session id '{}'",
                    id
                )));
            }
            None => {
                return Err(RegistryError::UploadInit(format!(
                    "registry did not return a {} header",
                    DOCKER_UPLOAD_UUID
                )));
            }
        };
        self.ctx.release(response).await;

        self.ctx
            .logger()
            .detail(&format!("Upload session {} started", upload_id));
        Ok(UploadSession::started(upload_id))
    }

    /// Single PUT with the whole body; the caller's digest is trusted because
    /// the caller computed it over these exact bytes.
    pub async fn commit_monolithic(
        &self,
        session: UploadSession,
        data: Bytes,
        digest: Digest,
    ) -> Result<BlobDescriptor> {
        let size = data.len() as u64;
        let url = self.session_url(&session, Some(&digest))?;
        let request = self
            .ctx
            .request(Method::PUT, url)
            .header(CONTENT_TYPE, HeaderValue::from_static(OCTET_STREAM))
            .header(CONTENT_LENGTH, HeaderValue::from(size))
            .body(RequestBody::Bytes(data));

        let response = self.ctx.send(request).await?;
        if response.status != StatusCode::CREATED {
            return Err(HttpErrorHandler::unexpected_status(response).await);
        }
        self.check_reported_digest(&response, &digest);
        self.ctx.release(response).await;

        self.commit(session.monolithic_committed(size, digest))
    }

    /// Stream the whole source in one PATCH, hashing and counting each byte
    /// as the transport consumes it.
    pub async fn append(&self, session: UploadSession, stream: ByteStream) -> Result<UploadSession> {
        let url = self.session_url(&session, None)?;
        let (observed, report) = ObservedStream::new(stream);
        let request = self
            .ctx
            .request(Method::PATCH, url)
            .header(CONTENT_TYPE, HeaderValue::from_static(OCTET_STREAM))
            .body(RequestBody::Stream(observed.boxed()));

        let response = self.ctx.send(request).await?;
        if response.status != StatusCode::NO_CONTENT {
            let (status, body) = HttpErrorHandler::read_body(response).await;
            return Err(RegistryError::ChunkUpload { status, body });
        }

        let rotated = match response.header_str(DOCKER_UPLOAD_UUID) {
            Some(id) if is_usable_session_id(id) => Some(id.to_string()),
            Some(id) => {
                return Err(RegistryError::Protocol(format!(
                    "registry rotated upload to unusable session id '{}'",
                    id
                )));
            }
            None => None,
        };
        self.ctx.release(response).await;

        let observed = report.await.map_err(|_| {
            RegistryError::Protocol(
                "Append finished before the upload body was fully sent".to_string(),
            )
        })?;

        if let Some(id) = rotated.as_deref().filter(|id| *id != session.upload_id) {
            self.ctx
                .logger()
                .detail(&format!("Upload session rotated {} -> {}", session.upload_id, id));
        }
        self.ctx.logger().detail(&format!(
            "Appended {} to session, running digest {}",
            self.ctx.logger().format_size(observed.size),
            observed.digest.short()
        ));
        Ok(session.appended(rotated, observed.size, observed.digest))
    }

    /// Zero-length PUT closing the session with the locally computed digest
    pub async fn finalize(&self, session: UploadSession) -> Result<BlobDescriptor> {
        let digest = match (&session.state, &session.running_digest) {
            (UploadState::ChunkAppended, Some(digest)) => digest.clone(),
            _ => {
                return Err(RegistryError::Protocol(format!(
                    "Cannot finalize session {} in state {}: nothing appended",
                    session.upload_id, session.state
                )));
            }
        };

        let url = self.session_url(&session, Some(&digest))?;
        let request = self
            .ctx
            .request(Method::PUT, url)
            .header(CONTENT_LENGTH, HeaderValue::from(0u64));

        let response = self.ctx.send(request).await?;
        if response.status != StatusCode::CREATED {
            return Err(HttpErrorHandler::unexpected_status(response).await);
        }
        self.check_reported_digest(&response, &digest);
        self.ctx.release(response).await;

        self.commit(session.finalized())
    }

    fn commit(&self, session: UploadSession) -> Result<BlobDescriptor> {
        let session = session.commit()?;
        self.ctx
            .logger()
            .detail(&format!("Session {} {}", session.upload_id, session.state));
        session.descriptor().ok_or_else(|| {
            RegistryError::Protocol(format!(
                "Committed session {} has no digest",
                session.upload_id
            ))
        })
    }

    fn check_reported_digest(&self, response: &TransportResponse, digest: &Digest) {
        if let Some(reported) = response.header_str(DOCKER_CONTENT_DIGEST) {
            if reported != digest.to_string() {
                self.ctx.logger().warning(&format!(
                    "Registry reported digest {} for upload of {}; keeping the local digest",
                    reported, digest
                ));
            }
        }
    }

    fn session_url(&self, session: &UploadSession, digest: Option<&Digest>) -> Result<Url> {
        let mut url = self
            .ctx
            .reference_endpoint("blobs/uploads", &session.upload_id)?;
        if let Some(digest) = digest {
            url.query_pairs_mut()
                .append_pair("digest", &digest.to_string());
        }
        Ok(url)
    }
}

/// Session ids are opaque but must stay one path segment
fn is_usable_session_id(id: &str) -> bool {
    !id.is_empty() && id != "." && id != ".."
}
