//! Configuration module for client settings and registry location parsing

use crate::error::{RegistryError, Result};
use serde::{Deserialize, Serialize};
use std::env;
use url::Url;

pub const DEFAULT_TIMEOUT_SECS: u64 = 300;
pub const DEFAULT_USER_AGENT: &str = concat!("registry-transfer/", env!("CARGO_PKG_VERSION"));

/// Remote namespace every call of a client instance is bound to
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistryLocation {
    pub scheme: String,
    pub host: String,
    pub repository: String,
}

impl RegistryLocation {
    pub fn new(host: impl Into<String>, repository: impl Into<String>) -> Self {
        Self {
            scheme: "https".to_string(),
            host: host.into(),
            repository: repository.into(),
        }
    }

    /// Parse `[scheme://]host[:port]/repository[/...]`
    pub fn parse(location: &str) -> Result<Self> {
        let (scheme, remaining) = match location.split_once("://") {
            Some((scheme @ ("http" | "https"), rest)) => (scheme, rest),
            Some((scheme, _)) => {
                return Err(RegistryError::Config(format!(
                    "Unsupported registry scheme '{}'",
                    scheme
                )));
            }
            None => ("https", location),
        };

        let (host, repository) = remaining.split_once('/').ok_or_else(|| {
            RegistryError::Config(format!(
                "Invalid registry location '{}'. Expected: registry.example.com/project/repo",
                location
            ))
        })?;
        let repository = repository.trim_end_matches('/');

        if host.is_empty() {
            return Err(RegistryError::Config("Registry host cannot be empty".to_string()));
        }
        if repository.is_empty() {
            return Err(RegistryError::Config("Repository name cannot be empty".to_string()));
        }

        Ok(Self {
            scheme: scheme.to_string(),
            host: host.to_string(),
            repository: repository.to_string(),
        })
    }

    pub fn with_scheme(mut self, scheme: impl Into<String>) -> Self {
        self.scheme = scheme.into();
        self
    }

    /// Same location, different repository on the same registry
    pub fn with_repository(&self, repository: impl Into<String>) -> Self {
        Self {
            scheme: self.scheme.clone(),
            host: self.host.clone(),
            repository: repository.into(),
        }
    }

    /// `{scheme}://{host}/v2/{repository}/`
    pub fn base_url(&self) -> Result<Url> {
        let raw = format!("{}://{}/v2/{}/", self.scheme, self.host, self.repository);
        Url::parse(&raw).map_err(|e| {
            RegistryError::Config(format!("Invalid registry URL '{}': {}", raw, e))
        })
    }
}

impl std::fmt::Display for RegistryLocation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.host, self.repository)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AuthConfig {
    pub username: Option<String>,
    pub password: Option<String>,
    pub token: Option<String>,
}

impl AuthConfig {
    pub fn has_credentials(&self) -> bool {
        self.token.is_some() || (self.username.is_some() && self.password.is_some())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    pub location: RegistryLocation,
    pub auth: AuthConfig,
    pub skip_tls: bool,
    pub timeout_secs: u64,
    pub user_agent: String,
    pub verbose: bool,
}

impl ClientConfig {
    pub fn new(location: RegistryLocation) -> Self {
        Self {
            location,
            auth: AuthConfig::default(),
            skip_tls: false,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            verbose: false,
        }
    }

    /// Load from `REGISTRY_ADDRESS`, `REGISTRY_USERNAME`, `REGISTRY_PASSWORD`,
    /// `REGISTRY_TOKEN`, `SKIP_TLS` and `REGISTRY_TIMEOUT`
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub(crate) fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let address = lookup("REGISTRY_ADDRESS")
            .ok_or_else(|| RegistryError::Config("REGISTRY_ADDRESS not set".to_string()))?;
        let mut config = Self::new(RegistryLocation::parse(&address)?);

        config.auth = AuthConfig {
            username: lookup("REGISTRY_USERNAME"),
            password: lookup("REGISTRY_PASSWORD"),
            token: lookup("REGISTRY_TOKEN"),
        };
        config.skip_tls = lookup("SKIP_TLS").is_some_and(|v| v == "true" || v == "1");
        if let Some(timeout) = lookup("REGISTRY_TIMEOUT") {
            config.timeout_secs = timeout.parse().map_err(|_| {
                RegistryError::Config(format!("Invalid REGISTRY_TIMEOUT '{}'", timeout))
            })?;
        }

        Ok(config)
    }
}
