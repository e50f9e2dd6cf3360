//! Runner executing one subcommand against the configured repository

use crate::cli::args::{Args, Command, ManifestCommand};
use crate::digest::Digest;
use crate::error::{RegistryError, Result};
use crate::logging::Logger;
use crate::registry::{RegistryClient, RegistryClientBuilder};
use crate::registry::operations::ManifestPayload;
use crate::upload::{DEFAULT_READ_CHUNK, reader_stream};
use futures::StreamExt;
use std::path::Path;
use std::time::Instant;
use tokio::io::{AsyncWrite, AsyncWriteExt};

pub struct Runner {
    args: Args,
    output: Logger,
}

impl Runner {
    pub fn new(args: Args) -> Result<Self> {
        let output = if args.quiet {
            Logger::new_quiet()
        } else {
            Logger::new(args.verbose)
        };

        Ok(Self { args, output })
    }

    pub fn logger(&self) -> &Logger {
        &self.output
    }

    pub async fn run(&self) -> Result<()> {
        let start_time = Instant::now();
        self.args.validate()?;

        let config = self.args.to_config()?;
        self.output
            .detail(&format!("Target repository: {}", config.location));
        let client = RegistryClientBuilder::from_config(config)
            .with_logger(self.output.clone())
            .build()?;

        self.execute(&client).await?;

        self.output.detail(&format!(
            "Completed in {}",
            self.output.format_duration(start_time.elapsed())
        ));
        Ok(())
    }

    async fn execute(&self, client: &RegistryClient) -> Result<()> {
        match &self.args.command {
            Command::Exists { digest } => {
                let digest: Digest = digest.parse()?;
                let present = client.blob_exists(&digest).await?;
                println!("{}", if present { "present" } else { "absent" });
            }
            Command::Pull {
                digest,
                output,
                verify,
            } => {
                let digest: Digest = digest.parse()?;
                match output {
                    Some(path) => {
                        let file = tokio::fs::File::create(path).await?;
                        self.pull(client, &digest, *verify, file).await?;
                    }
                    None => self.pull(client, &digest, *verify, tokio::io::stdout()).await?,
                }
            }
            Command::Push { file, stream } => {
                let blob = if *stream {
                    let reader = tokio::fs::File::open(file).await?;
                    client
                        .upload_stream(reader_stream(reader, DEFAULT_READ_CHUNK))
                        .await?
                } else {
                    client.upload_bytes(tokio::fs::read(file).await?).await?
                };
                println!("{} {}", blob.digest, blob.size);
            }
            Command::Mount { digest, from } => {
                let digest: Digest = digest.parse()?;
                client.mount_blob(&digest, from).await?;
                println!("{}", digest);
            }
            Command::Manifest { action } => match action {
                ManifestCommand::Get { tag } => {
                    let manifest = client.fetch_manifest(tag).await?;
                    let pretty = serde_json::to_string_pretty(&manifest).map_err(|e| {
                        RegistryError::Protocol(format!("Failed to render manifest: {}", e))
                    })?;
                    println!("{}", pretty);
                }
                ManifestCommand::Put { file, tag } => {
                    let digest = self.put_manifest(client, file, tag.as_deref()).await?;
                    println!("{}", digest);
                }
            },
            Command::Tags => {
                let tags = client.list_tags().await?;
                for tag in tags.tags {
                    println!("{}", tag);
                }
            }
        }
        Ok(())
    }

    async fn pull<W>(
        &self,
        client: &RegistryClient,
        digest: &Digest,
        verify: bool,
        mut out: W,
    ) -> Result<()>
    where
        W: AsyncWrite + Unpin,
    {
        if verify {
            let bytes = client.blob_reader().fetch_verified(digest).await?;
            out.write_all(&bytes).await?;
        } else {
            let mut stream = client.fetch_blob_stream(digest).await?;
            let mut written = 0u64;
            while let Some(chunk) = stream.next().await {
                let chunk = chunk?;
                written += chunk.len() as u64;
                out.write_all(&chunk).await?;
            }
            self.output.detail(&format!(
                "Wrote {} for {}",
                self.output.format_size(written),
                digest.short()
            ));
        }
        out.flush().await?;
        Ok(())
    }

    async fn put_manifest(
        &self,
        client: &RegistryClient,
        file: &Path,
        tag: Option<&str>,
    ) -> Result<Digest> {
        let bytes = tokio::fs::read(file).await?;
        client.put_manifest(tag, ManifestPayload::from(bytes)).await
    }
}
