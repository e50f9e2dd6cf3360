//! HTTP transport seam for registry operations
//!
//! Registry operations never talk to `reqwest` directly. They build a
//! [`TransportRequest`] and hand it to a [`Transport`], which issues exactly
//! one HTTP exchange: no retries, no redirect following. This keeps the
//! protocol sequencing (redirect chasing, upload session steps) in the
//! operations where it can be observed and tested.

use crate::config::ClientConfig;
use crate::error::{RegistryError, Result};
use async_trait::async_trait;
use bytes::{Bytes, BytesMut};
use futures::stream::{BoxStream, StreamExt, TryStreamExt};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, LOCATION};
use reqwest::{Method, StatusCode};
use std::time::Duration;
use url::Url;

/// Owned stream of body chunks
pub type ByteStream = BoxStream<'static, std::io::Result<Bytes>>;

pub enum RequestBody {
    Empty,
    Bytes(Bytes),
    /// Length unknown up front; sent with chunked transfer encoding
    Stream(ByteStream),
}

pub struct TransportRequest {
    pub method: Method,
    pub url: Url,
    pub headers: HeaderMap,
    pub body: RequestBody,
}

impl TransportRequest {
    pub fn new(method: Method, url: Url) -> Self {
        Self {
            method,
            url,
            headers: HeaderMap::new(),
            body: RequestBody::Empty,
        }
    }

    pub fn header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }

    pub fn body(mut self, body: RequestBody) -> Self {
        self.body = body;
        self
    }
}

pub struct TransportResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: ByteStream,
}

impl TransportResponse {
    /// Header value as text; absent or non-ASCII values are `None`
    pub fn header_str(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|value| value.to_str().ok())
    }

    /// A 3xx carrying a `Location` header
    pub fn redirect_location(&self) -> Option<&str> {
        if self.status.is_redirection() {
            self.header_str(LOCATION.as_str())
        } else {
            None
        }
    }

    pub async fn bytes(self) -> Result<Bytes> {
        let mut buffer = BytesMut::new();
        let mut body = self.body;
        while let Some(chunk) = body.next().await {
            let chunk = chunk
                .map_err(|e| RegistryError::Transport(format!("Failed to read body: {}", e)))?;
            buffer.extend_from_slice(&chunk);
        }
        Ok(buffer.freeze())
    }

    pub async fn text(self) -> Result<String> {
        let bytes = self.bytes().await?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }

    /// Read and discard the body so the connection can be reused
    pub async fn drain(self) -> Result<u64> {
        let mut drained = 0u64;
        let mut body = self.body;
        while let Some(chunk) = body.next().await {
            let chunk = chunk
                .map_err(|e| RegistryError::Transport(format!("Failed to drain body: {}", e)))?;
            drained += chunk.len() as u64;
        }
        Ok(drained)
    }
}

/// Executes a single HTTP exchange
#[async_trait]
pub trait Transport: Send + Sync {
    async fn execute(&self, request: TransportRequest) -> Result<TransportResponse>;
}

/// Production transport over `reqwest` with redirect following disabled
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    pub fn new(config: &ClientConfig) -> Result<Self> {
        let mut builder = reqwest::Client::builder()
            .redirect(reqwest::redirect::Policy::none())
            .connect_timeout(Duration::from_secs(30))
            .read_timeout(Duration::from_secs(config.timeout_secs))
            .pool_idle_timeout(Duration::from_secs(300))
            .user_agent(config.user_agent.clone());

        if config.skip_tls {
            builder = builder
                .danger_accept_invalid_certs(true)
                .danger_accept_invalid_hostnames(true);
        }

        let client = builder
            .build()
            .map_err(|e| RegistryError::Config(format!("Failed to build HTTP client: {}", e)))?;
        Ok(Self { client })
    }

    pub fn from_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn execute(&self, request: TransportRequest) -> Result<TransportResponse> {
        let TransportRequest {
            method,
            url,
            headers,
            body,
        } = request;

        let builder = self.client.request(method, url).headers(headers);
        let builder = match body {
            RequestBody::Empty => builder,
            RequestBody::Bytes(bytes) => builder.body(bytes),
            RequestBody::Stream(stream) => builder.body(reqwest::Body::wrap_stream(stream)),
        };

        let response = builder.send().await?;
        let status = response.status();
        let headers = response.headers().clone();
        let body = response.bytes_stream().map_err(std::io::Error::other).boxed();

        Ok(TransportResponse {
            status,
            headers,
            body,
        })
    }
}
