//! Request context shared by all operations of one client
//!
//! Fixes the (registry, repository, credential) triple and the transport.
//! Operations hold it behind an `Arc` and never mutate it.

use crate::config::RegistryLocation;
use crate::error::{RegistryError, Result};
use crate::logging::Logger;
use crate::registry::auth::AuthProvider;
use crate::registry::transport::{Transport, TransportRequest, TransportResponse};
use reqwest::Method;
use reqwest::header::AUTHORIZATION;
use std::sync::Arc;
use url::Url;

pub struct RegistryContext {
    location: RegistryLocation,
    base_url: Url,
    auth: Arc<dyn AuthProvider>,
    transport: Arc<dyn Transport>,
    logger: Logger,
}

impl RegistryContext {
    pub fn new(
        location: RegistryLocation,
        auth: Arc<dyn AuthProvider>,
        transport: Arc<dyn Transport>,
        logger: Logger,
    ) -> Result<Self> {
        let base_url = location.base_url()?;
        Ok(Self {
            location,
            base_url,
            auth,
            transport,
            logger,
        })
    }

    pub fn location(&self) -> &RegistryLocation {
        &self.location
    }

    pub fn repository(&self) -> &str {
        &self.location.repository
    }

    pub fn logger(&self) -> &Logger {
        &self.logger
    }

    /// Endpoint relative to `/v2/{repository}/`
    pub fn endpoint(&self, path: &str) -> Result<Url> {
        self.base_url.join(path).map_err(|e| {
            RegistryError::Validation(format!("Invalid endpoint path '{}': {}", path, e))
        })
    }

    /// `{collection}/{reference}` under the repository, with `reference`
    /// percent-encoded as a single path segment. `/`, `?`, `#` and dot
    /// segments in the value cannot move the request out of the repository.
    pub fn reference_endpoint(&self, collection: &str, reference: &str) -> Result<Url> {
        if reference.is_empty() || reference == "." || reference == ".." {
            return Err(RegistryError::Validation(format!(
                "Invalid {} reference '{}'",
                collection, reference
            )));
        }
        let mut url = self.endpoint(&format!("{}/", collection))?;
        url.path_segments_mut()
            .map_err(|_| RegistryError::Validation("Registry URL cannot take a path".to_string()))?
            .pop_if_empty()
            .push(reference);
        Ok(url)
    }

    /// Request with credentials attached when `url` belongs to the registry.
    /// Redirect targets on other origins never receive the credential.
    pub fn request(&self, method: Method, url: Url) -> TransportRequest {
        let same_origin = url.origin() == self.base_url.origin();
        let mut request = TransportRequest::new(method, url);
        if same_origin {
            if let Some(value) = self.auth.credential().and_then(|c| c.header_value()) {
                request.headers.insert(AUTHORIZATION, value);
            }
        }
        request
    }

    pub async fn send(&self, request: TransportRequest) -> Result<TransportResponse> {
        let method = request.method.clone();
        let url = request.url.clone();
        self.logger.trace(&format!("{} {}", method, url));

        let response = self.transport.execute(request).await.map_err(|e| {
            self.logger.error(&format!("{} {} failed: {}", method, url, e));
            e
        })?;

        self.logger
            .detail(&format!("{} {} -> {}", method, url, response.status.as_u16()));
        Ok(response)
    }

    /// Read a response body to its end and drop it. A failure only costs the
    /// pooled connection, so it is logged rather than returned.
    pub async fn release(&self, response: TransportResponse) {
        if let Err(e) = response.drain().await {
            self.logger
                .warning(&format!("Failed to drain response body: {}", e));
        }
    }
}
