// This file contains the RegistryClient façade, which binds a registry
// location, a credential provider and a transport, and exposes the manifest,
// blob, mount and tag operations against that fixed namespace.

use crate::config::{ClientConfig, RegistryLocation};
use crate::digest::Digest;
use crate::error::Result;
use crate::image::manifest::{Layer, Manifest, TagResult};
use crate::logging::Logger;
use crate::registry::auth::{Anonymous, AuthProvider, StaticAuth};
use crate::registry::context::RegistryContext;
use crate::registry::operations::{
    BlobContent, BlobReader, BlobStream, BlobWriter, FetchMode, ManifestPayload, ManifestService,
    MountService, TagService,
};
use crate::registry::transport::{ByteStream, ReqwestTransport, Transport};
use crate::upload::{BlobDescriptor, UploadSource};
use bytes::Bytes;
use std::sync::Arc;

pub struct RegistryClientBuilder {
    location: RegistryLocation,
    auth: Option<Arc<dyn AuthProvider>>,
    transport: Option<Arc<dyn Transport>>,
    config: Option<ClientConfig>,
    logger: Logger,
}

impl RegistryClientBuilder {
    pub fn new(location: RegistryLocation) -> Self {
        Self {
            location,
            auth: None,
            transport: None,
            config: None,
            logger: Logger::default(),
        }
    }

    /// Start from a full configuration: location, static credentials,
    /// transport settings and verbosity
    pub fn from_config(config: ClientConfig) -> Self {
        let mut builder = Self::new(config.location.clone()).with_logger(Logger::new(config.verbose));
        if config.auth.has_credentials() {
            builder = builder.with_auth(Arc::new(StaticAuth::new(config.auth.clone())));
        }
        builder.config = Some(config);
        builder
    }

    pub fn with_auth(mut self, auth: Arc<dyn AuthProvider>) -> Self {
        self.auth = Some(auth);
        self
    }

    pub fn with_transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    pub fn with_logger(mut self, logger: Logger) -> Self {
        self.logger = logger;
        self
    }

    pub fn build(self) -> Result<RegistryClient> {
        let transport = match self.transport {
            Some(transport) => transport,
            None => {
                let config = self
                    .config
                    .unwrap_or_else(|| ClientConfig::new(self.location.clone()));
                Arc::new(ReqwestTransport::new(&config)?) as Arc<dyn Transport>
            }
        };
        let auth = self.auth.unwrap_or_else(|| Arc::new(Anonymous));

        let ctx = Arc::new(RegistryContext::new(
            self.location,
            auth,
            transport,
            self.logger,
        )?);

        Ok(RegistryClient {
            manifests: ManifestService::new(ctx.clone()),
            reader: BlobReader::new(ctx.clone()),
            writer: BlobWriter::new(ctx.clone()),
            mounts: MountService::new(ctx.clone()),
            tags: TagService::new(ctx.clone()),
            ctx,
        })
    }
}

/// Client bound to one (registry, repository, credential) triple
#[derive(Clone)]
pub struct RegistryClient {
    ctx: Arc<RegistryContext>,
    manifests: ManifestService,
    reader: BlobReader,
    writer: BlobWriter,
    mounts: MountService,
    tags: TagService,
}

impl RegistryClient {
    pub fn builder(location: RegistryLocation) -> RegistryClientBuilder {
        RegistryClientBuilder::new(location)
    }

    pub fn from_config(config: ClientConfig) -> Result<Self> {
        RegistryClientBuilder::from_config(config).build()
    }

    pub fn location(&self) -> &RegistryLocation {
        self.ctx.location()
    }

    pub fn manifests(&self) -> &ManifestService {
        &self.manifests
    }

    pub fn blob_reader(&self) -> &BlobReader {
        &self.reader
    }

    pub fn blob_writer(&self) -> &BlobWriter {
        &self.writer
    }

    pub fn mounts(&self) -> &MountService {
        &self.mounts
    }

    pub fn tags(&self) -> &TagService {
        &self.tags
    }

    pub async fn fetch_manifest(&self, tag: &str) -> Result<Manifest> {
        self.manifests.fetch_manifest(tag).await
    }

    pub async fn put_manifest(
        &self,
        tag: Option<&str>,
        manifest: impl Into<ManifestPayload>,
    ) -> Result<Digest> {
        self.manifests.put_manifest(tag, manifest).await
    }

    pub async fn blob_exists(&self, digest: &Digest) -> Result<bool> {
        self.reader.exists(digest).await
    }

    pub async fn fetch_blob(&self, digest: &Digest, mode: FetchMode) -> Result<BlobContent> {
        self.reader.fetch(digest, mode).await
    }

    pub async fn fetch_blob_stream(&self, digest: &Digest) -> Result<BlobStream> {
        self.reader.fetch_stream(digest).await
    }

    pub async fn fetch_layer(&self, layer: &Layer, mode: FetchMode) -> Result<BlobContent> {
        self.reader.fetch_layer(layer, mode).await
    }

    pub async fn upload_blob(&self, source: UploadSource) -> Result<BlobDescriptor> {
        self.writer.upload(source).await
    }

    pub async fn upload_bytes(&self, data: impl Into<Bytes>) -> Result<BlobDescriptor> {
        self.writer.upload_bytes(data).await
    }

    pub async fn upload_stream(&self, stream: ByteStream) -> Result<BlobDescriptor> {
        self.writer.upload_stream(stream).await
    }

    pub async fn mount_blob(&self, digest: &Digest, source_repository: &str) -> Result<()> {
        self.mounts.mount(digest, source_repository).await
    }

    pub async fn list_tags(&self) -> Result<TagResult> {
        self.tags.list_tags().await
    }
}
