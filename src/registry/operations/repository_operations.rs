//! Repository operations for registry client
//!
//! Implements tag listing (GET /v2/{name}/tags/list).

use crate::error::handlers::HttpErrorHandler;
use crate::error::{RegistryError, Result};
use crate::image::manifest::TagResult;
use crate::registry::context::RegistryContext;
use reqwest::{Method, StatusCode};
use std::sync::Arc;

#[derive(Clone)]
pub struct TagService {
    ctx: Arc<RegistryContext>,
}

impl TagService {
    pub fn new(ctx: Arc<RegistryContext>) -> Self {
        Self { ctx }
    }

    pub async fn list_tags(&self) -> Result<TagResult> {
        let logger = self.ctx.logger();
        logger.detail(&format!("Listing tags for repository: {}", self.ctx.repository()));

        let url = self.ctx.endpoint("tags/list")?;
        let response = self.ctx.send(self.ctx.request(Method::GET, url)).await?;
        if response.status != StatusCode::OK {
            return Err(HttpErrorHandler::unexpected_status(response).await);
        }

        let body = response.bytes().await?;
        let tags: TagResult = serde_json::from_slice(&body).map_err(|e| {
            RegistryError::Protocol(format!("Failed to parse tags response: {}", e))
        })?;

        logger.detail(&format!(
            "Found {} tags for repository {}",
            tags.tags.len(),
            tags.name
        ));
        Ok(tags)
    }
}
