//! Scripted in-memory transport shared by the integration tests

#![allow(dead_code)]

use async_trait::async_trait;
use bytes::Bytes;
use futures::stream::{self, StreamExt};
use registry_transfer::config::RegistryLocation;
use registry_transfer::error::{RegistryError, Result};
use registry_transfer::logging::Logger;
use registry_transfer::registry::transport::{
    RequestBody, Transport, TransportRequest, TransportResponse,
};
use registry_transfer::registry::RegistryClient;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::{Method, StatusCode};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::task::Poll;
use url::Url;

pub const REGISTRY_HOST: &str = "registry.test";
pub const REPOSITORY: &str = "team/app";

#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: Method,
    pub url: Url,
    pub headers: HeaderMap,
    pub body: Vec<u8>,
}

impl RecordedRequest {
    pub fn query(&self, key: &str) -> Option<String> {
        self.url
            .query_pairs()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.into_owned())
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }
}

pub struct MockResponse {
    status: u16,
    headers: Vec<(&'static str, String)>,
    body: Vec<u8>,
    failure: Option<String>,
    body_failure: Option<String>,
}

impl MockResponse {
    pub fn new(status: u16) -> Self {
        Self {
            status,
            headers: Vec::new(),
            body: Vec::new(),
            failure: None,
            body_failure: None,
        }
    }

    /// No response at all, as when the connection fails
    pub fn transport_error(message: &str) -> Self {
        Self {
            failure: Some(message.to_string()),
            ..Self::new(0)
        }
    }

    pub fn redirect(location: &str) -> Self {
        Self::new(307)
            .header("Location", location)
            .body(b"<a href=\"elsewhere\">Temporary Redirect</a>")
    }

    pub fn header(mut self, name: &'static str, value: impl Into<String>) -> Self {
        self.headers.push((name, value.into()));
        self
    }

    pub fn body(mut self, body: &[u8]) -> Self {
        self.body = body.to_vec();
        self
    }

    /// Body that errors after the scripted bytes, as on a reset connection
    pub fn broken_body(mut self, message: &str) -> Self {
        self.body_failure = Some(message.to_string());
        self
    }
}

/// Replays scripted responses in order and records every request it sees.
/// Request bodies are drained completely, like a real server would.
#[derive(Default)]
pub struct MockTransport {
    script: Mutex<VecDeque<MockResponse>>,
    requests: Mutex<Vec<RecordedRequest>>,
    consumed: Mutex<Vec<Arc<AtomicBool>>>,
}

impl MockTransport {
    pub fn new(script: Vec<MockResponse>) -> Arc<Self> {
        Arc::new(Self {
            script: Mutex::new(script.into()),
            ..Self::default()
        })
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    /// Whether the body of the n-th response was read to its end
    pub fn body_consumed(&self, index: usize) -> bool {
        self.consumed.lock().unwrap()[index].load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn execute(&self, request: TransportRequest) -> Result<TransportResponse> {
        let TransportRequest {
            method,
            url,
            headers,
            body,
        } = request;

        let body = match body {
            RequestBody::Empty => Vec::new(),
            RequestBody::Bytes(bytes) => bytes.to_vec(),
            RequestBody::Stream(mut stream) => {
                let mut received = Vec::new();
                while let Some(chunk) = stream.next().await {
                    received.extend_from_slice(&chunk?);
                }
                received
            }
        };
        self.requests.lock().unwrap().push(RecordedRequest {
            method,
            url,
            headers,
            body,
        });

        let scripted = self
            .script
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| RegistryError::Transport("no scripted response left".to_string()))?;
        if let Some(message) = scripted.failure {
            return Err(RegistryError::Transport(message));
        }

        let mut headers = HeaderMap::new();
        for (name, value) in scripted.headers {
            headers.insert(
                HeaderName::from_bytes(name.as_bytes()).unwrap(),
                HeaderValue::from_str(&value).unwrap(),
            );
        }

        let consumed = Arc::new(AtomicBool::new(false));
        self.consumed.lock().unwrap().push(consumed.clone());
        let mut chunks = vec![Ok(Bytes::from(scripted.body))];
        if let Some(message) = scripted.body_failure {
            chunks.push(Err(std::io::Error::other(message)));
        }
        let body = stream::iter(chunks)
            .chain(stream::poll_fn(move |_| {
                consumed.store(true, Ordering::SeqCst);
                Poll::Ready(None)
            }))
            .boxed();

        Ok(TransportResponse {
            status: StatusCode::from_u16(scripted.status).unwrap(),
            headers,
            body,
        })
    }
}

pub fn location() -> RegistryLocation {
    RegistryLocation::new(REGISTRY_HOST, REPOSITORY)
}

pub fn client(transport: Arc<MockTransport>) -> RegistryClient {
    RegistryClient::builder(location())
        .with_transport(transport)
        .with_logger(Logger::new_quiet())
        .build()
        .unwrap()
}

pub fn endpoint(path: &str) -> String {
    format!("https://{}/v2/{}/{}", REGISTRY_HOST, REPOSITORY, path)
}

/// Request URL without its query string
pub fn path_of(request: &RecordedRequest) -> String {
    let mut url = request.url.clone();
    url.set_query(None);
    url.to_string()
}
