//! Command-line argument parsing

use crate::config::{AuthConfig, ClientConfig, DEFAULT_TIMEOUT_SECS, RegistryLocation};
use crate::error::{RegistryError, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "regxfer")]
#[command(about = "Move blobs and manifests to and from a Docker Registry v2 repository")]
#[command(version)]
pub struct Args {
    /// Registry and repository, e.g. registry.example.com/team/app
    #[arg(long = "registry", short = 'r', env = "REGISTRY_ADDRESS")]
    pub registry: String,

    #[arg(long = "username", short = 'u', env = "REGISTRY_USERNAME")]
    pub username: Option<String>,

    #[arg(
        long = "password",
        short = 'p',
        env = "REGISTRY_PASSWORD",
        hide_env_values = true
    )]
    pub password: Option<String>,

    /// Bearer token; preferred over username/password when both are given
    #[arg(long = "token", env = "REGISTRY_TOKEN", hide_env_values = true)]
    pub token: Option<String>,

    /// Skip TLS certificate verification
    #[arg(long = "skip-tls", short = 'k', env = "SKIP_TLS")]
    pub skip_tls: bool,

    /// Read timeout in seconds for network operations
    #[arg(long = "timeout", short = 't', env = "REGISTRY_TIMEOUT", default_value_t = DEFAULT_TIMEOUT_SECS)]
    pub timeout: u64,

    #[arg(long = "verbose", short = 'v', conflicts_with = "quiet")]
    pub verbose: bool,

    #[arg(long = "quiet", short = 'q')]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Check whether a blob is present in the repository
    Exists { digest: String },

    /// Download a blob
    Pull {
        digest: String,
        /// Write to this file instead of stdout
        #[arg(long = "output", short = 'o')]
        output: Option<PathBuf>,
        /// Buffer the blob and check its digest before writing
        #[arg(long = "verify")]
        verify: bool,
    },

    /// Upload a file as a blob
    Push {
        file: PathBuf,
        /// Stream the file in one chunked append instead of a single PUT
        #[arg(long = "stream")]
        stream: bool,
    },

    /// Mount a blob from another repository on the same registry
    Mount {
        digest: String,
        #[arg(long = "from")]
        from: String,
    },

    /// Read or write manifests
    Manifest {
        #[command(subcommand)]
        action: ManifestCommand,
    },

    /// List repository tags
    Tags,
}

#[derive(Subcommand, Debug)]
pub enum ManifestCommand {
    Get { tag: String },
    Put {
        file: PathBuf,
        /// Tag to point at the manifest; digest-only when omitted
        #[arg(long = "tag")]
        tag: Option<String>,
    },
}

impl Args {
    pub fn parse_args() -> Self {
        Self::parse()
    }

    pub fn validate(&self) -> Result<()> {
        if self.username.is_some() != self.password.is_some() && self.token.is_none() {
            return Err(RegistryError::Config(
                "Username and password must be provided together".to_string(),
            ));
        }
        if self.timeout == 0 {
            return Err(RegistryError::Config("Timeout must be greater than zero".to_string()));
        }
        Ok(())
    }

    pub fn to_config(&self) -> Result<ClientConfig> {
        let mut config = ClientConfig::new(RegistryLocation::parse(&self.registry)?);
        config.auth = AuthConfig {
            username: self.username.clone(),
            password: self.password.clone(),
            token: self.token.clone(),
        };
        config.skip_tls = self.skip_tls;
        config.timeout_secs = self.timeout;
        config.verbose = self.verbose;
        Ok(config)
    }
}
