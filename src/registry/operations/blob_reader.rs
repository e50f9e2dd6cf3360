//! Blob read operations for registry client
//!
//! Implements Docker Registry v2 blob reads:
//! - Blob existence checks (HEAD /v2/{name}/blobs/{digest})
//! - Blob download (GET /v2/{name}/blobs/{digest}) with manual, bounded
//!   redirect following, buffered or streamed

use crate::digest::Digest;
use crate::error::handlers::HttpErrorHandler;
use crate::error::{RegistryError, Result};
use crate::image::manifest::Layer;
use crate::registry::context::RegistryContext;
use crate::registry::transport::{ByteStream, TransportResponse};
use bytes::{Bytes, BytesMut};
use futures::{Stream, StreamExt};
use reqwest::{Method, StatusCode};
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use url::Url;

/// Upper bound on requests issued for one fetch, redirects included
pub const MAX_REDIRECT_HOPS: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchMode {
    Buffered,
    Streaming,
}

/// Blob body that has not been read yet.
///
/// Nothing is pulled from the connection until the stream is polled.
pub struct BlobStream {
    inner: ByteStream,
    source: Url,
}

impl BlobStream {
    /// URL the body is being served from, after redirects
    pub fn source(&self) -> &Url {
        &self.source
    }

    pub async fn collect_bytes(mut self) -> Result<Bytes> {
        let mut buffer = BytesMut::new();
        while let Some(chunk) = self.inner.next().await {
            let chunk = chunk
                .map_err(|e| RegistryError::Transport(format!("Failed to read blob: {}", e)))?;
            buffer.extend_from_slice(&chunk);
        }
        Ok(buffer.freeze())
    }

    pub fn into_inner(self) -> ByteStream {
        self.inner
    }
}

impl Stream for BlobStream {
    type Item = std::io::Result<Bytes>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.get_mut().inner.as_mut().poll_next(cx)
    }
}

pub enum BlobContent {
    Buffered(Bytes),
    Streaming(BlobStream),
}

impl BlobContent {
    pub async fn into_bytes(self) -> Result<Bytes> {
        match self {
            BlobContent::Buffered(bytes) => Ok(bytes),
            BlobContent::Streaming(stream) => stream.collect_bytes().await,
        }
    }
}

#[derive(Clone)]
pub struct BlobReader {
    ctx: Arc<RegistryContext>,
}

impl BlobReader {
    pub fn new(ctx: Arc<RegistryContext>) -> Self {
        Self { ctx }
    }

    /// `true` only for a 200 answer. Any other status is `false`; a failed
    /// exchange is returned as an error rather than guessed at.
    pub async fn exists(&self, digest: &Digest) -> Result<bool> {
        let url = self.blob_url(digest)?;
        let response = self.ctx.send(self.ctx.request(Method::HEAD, url)).await?;
        let status = response.status;
        self.ctx.release(response).await;

        let logger = self.ctx.logger();
        match status {
            StatusCode::OK => {
                logger.detail(&format!("Blob {} exists in registry", digest.short()));
                Ok(true)
            }
            StatusCode::NOT_FOUND => {
                logger.detail(&format!("Blob {} does not exist in registry", digest.short()));
                Ok(false)
            }
            other => {
                logger.warning(&format!(
                    "Unexpected status {} when checking blob {}: {}",
                    other.as_u16(),
                    digest.short(),
                    HttpErrorHandler::describe(other.as_u16())
                ));
                Ok(false)
            }
        }
    }

    pub async fn fetch(&self, digest: &Digest, mode: FetchMode) -> Result<BlobContent> {
        let url = self.blob_url(digest)?;
        self.fetch_url(url, mode).await
    }

    pub async fn fetch_bytes(&self, digest: &Digest) -> Result<Bytes> {
        self.fetch(digest, FetchMode::Buffered).await?.into_bytes().await
    }

    pub async fn fetch_stream(&self, digest: &Digest) -> Result<BlobStream> {
        match self.fetch(digest, FetchMode::Streaming).await? {
            BlobContent::Streaming(stream) => Ok(stream),
            BlobContent::Buffered(_) => Err(RegistryError::Protocol(
                "Streaming fetch produced a buffered body".to_string(),
            )),
        }
    }

    /// Buffered fetch whose content must hash to `digest`
    pub async fn fetch_verified(&self, digest: &Digest) -> Result<Bytes> {
        let bytes = self.fetch_bytes(digest).await?;
        digest.verify(&bytes)?;
        Ok(bytes)
    }

    /// Fetch a layer from the registry, then from its alternate URLs if the
    /// registry answers with an error status. Alternate URLs are requested
    /// without credentials unless they share the registry's origin.
    pub async fn fetch_layer(&self, layer: &Layer, mode: FetchMode) -> Result<BlobContent> {
        let primary = match self.fetch(&layer.digest, mode).await {
            Err(err @ RegistryError::UnexpectedStatus { .. }) => err,
            other => return other,
        };

        let logger = self.ctx.logger();
        for candidate in layer.urls.iter().flatten() {
            let url = match Url::parse(candidate) {
                Ok(url) if matches!(url.scheme(), "http" | "https") => url,
                _ => {
                    logger.warning(&format!("Skipping unusable layer URL {}", candidate));
                    continue;
                }
            };
            match self.fetch_url(url, mode).await {
                Ok(content) => return Ok(content),
                Err(e) => logger.warning(&format!("Layer URL {} failed: {}", candidate, e)),
            }
        }
        Err(primary)
    }

    async fn fetch_url(&self, url: Url, mode: FetchMode) -> Result<BlobContent> {
        let (url, response) = self.follow_redirects(url).await?;
        if response.status != StatusCode::OK {
            return Err(HttpErrorHandler::unexpected_status(response).await);
        }

        match mode {
            FetchMode::Streaming => Ok(BlobContent::Streaming(BlobStream {
                inner: response.body,
                source: url,
            })),
            FetchMode::Buffered => {
                let bytes = response.bytes().await?;
                self.ctx.logger().detail(&format!(
                    "Downloaded {} from {}",
                    self.ctx.logger().format_size(bytes.len() as u64),
                    url
                ));
                Ok(BlobContent::Buffered(bytes))
            }
        }
    }

    /// Issue GETs until a non-redirect answer, at most [`MAX_REDIRECT_HOPS`]
    /// requests. Superseded redirect bodies are drained before moving on.
    async fn follow_redirects(&self, start: Url) -> Result<(Url, TransportResponse)> {
        let logger = self.ctx.logger();
        let mut url = start;
        let mut requests = 0;

        loop {
            requests += 1;
            let response = self.ctx.send(self.ctx.request(Method::GET, url.clone())).await?;
            let Some(location) = response.redirect_location().map(str::to_string) else {
                return Ok((url, response));
            };
            response.drain().await?;

            if requests >= MAX_REDIRECT_HOPS {
                logger.error(&format!(
                    "Giving up after {} redirects, last URL {}",
                    requests, url
                ));
                return Err(RegistryError::RedirectLoop {
                    last_url: url.to_string(),
                });
            }

            let next = url.join(&location).map_err(|e| {
                RegistryError::Protocol(format!("Invalid redirect location '{}': {}", location, e))
            })?;
            logger.detail(&format!("Redirect {} -> {}", requests, next));
            url = next;
        }
    }

    fn blob_url(&self, digest: &Digest) -> Result<Url> {
        self.ctx.reference_endpoint("blobs", &digest.to_string())
    }
}
