//! Cross-repository blob mount (POST /v2/{name}/blobs/uploads?mount=...&from=...)
//!
//! A registry that cannot mount may answer 202 with a fresh upload session.
//! That answer is reported as a mount failure; the caller decides whether to
//! upload the blob instead.

use crate::digest::Digest;
use crate::error::handlers::HttpErrorHandler;
use crate::error::{RegistryError, Result};
use crate::registry::context::RegistryContext;
use crate::registry::operations::blob_writer::DOCKER_UPLOAD_UUID;
use reqwest::header::{CONTENT_LENGTH, HeaderValue};
use reqwest::{Method, StatusCode};
use std::sync::Arc;

#[derive(Clone)]
pub struct MountService {
    ctx: Arc<RegistryContext>,
}

impl MountService {
    pub fn new(ctx: Arc<RegistryContext>) -> Self {
        Self { ctx }
    }

    /// Link `digest` from `source_repository` into this client's repository
    pub async fn mount(&self, digest: &Digest, source_repository: &str) -> Result<()> {
        if source_repository.is_empty() {
            return Err(RegistryError::Validation(
                "Mount source repository cannot be empty".to_string(),
            ));
        }

        let logger = self.ctx.logger();
        let mut url = self.ctx.endpoint("blobs/uploads")?;
        url.query_pairs_mut()
            .append_pair("mount", &digest.to_string())
            .append_pair("from", source_repository);

        let request = self
            .ctx
            .request(Method::POST, url)
            .header(CONTENT_LENGTH, HeaderValue::from(0u64));
        let response = self.ctx.send(request).await?;

        let status = response.status;
        if status == StatusCode::CREATED {
            self.ctx.release(response).await;
            logger.success(&format!(
                "Mounted {} from {} into {}",
                digest.short(),
                source_repository,
                self.ctx.repository()
            ));
            return Ok(());
        }

        if status == StatusCode::ACCEPTED {
            logger.warning(&format!(
                "Registry opened upload session {} instead of mounting {}",
                response.header_str(DOCKER_UPLOAD_UUID).unwrap_or("<none>"),
                digest.short()
            ));
        } else {
            logger.warning(&format!(
                "Mount of {} rejected with status {}: {}",
                digest.short(),
                status.as_u16(),
                HttpErrorHandler::describe(status.as_u16())
            ));
        }
        self.ctx.release(response).await;

        Err(RegistryError::Mount {
            digest: digest.to_string(),
            source_repository: source_repository.to_string(),
            destination_repository: self.ctx.repository().to_string(),
            status: status.as_u16(),
        })
    }
}
