//! Credentials attached to registry requests
//!
//! Token acquisition happens elsewhere; an [`AuthProvider`] only hands out
//! what it already holds. The credential is resolved again for every request
//! and rendered straight into an `Authorization` header.

use crate::config::AuthConfig;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use reqwest::header::HeaderValue;

#[derive(Clone, PartialEq, Eq)]
pub enum Credential {
    Bearer(String),
    Basic { username: String, secret: String },
}

impl Credential {
    /// Value of the `Authorization` header
    pub fn authorization(&self) -> String {
        match self {
            Credential::Bearer(token) => format!("Bearer {}", token),
            Credential::Basic { username, secret } => {
                format!("Basic {}", STANDARD.encode(format!("{}:{}", username, secret)))
            }
        }
    }

    pub fn header_value(&self) -> Option<HeaderValue> {
        let mut value = HeaderValue::from_str(&self.authorization()).ok()?;
        value.set_sensitive(true);
        Some(value)
    }
}

impl std::fmt::Debug for Credential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Credential::Bearer(_) => f.write_str("Bearer(***)"),
            Credential::Basic { username, .. } => write!(f, "Basic({}:***)", username),
        }
    }
}

/// Source of credentials, read once per request
pub trait AuthProvider: Send + Sync {
    fn bearer_token(&self) -> Option<String>;

    fn basic_credentials(&self) -> Option<(String, String)>;

    /// Bearer takes precedence when both are available
    fn credential(&self) -> Option<Credential> {
        if let Some(token) = self.bearer_token() {
            return Some(Credential::Bearer(token));
        }
        self.basic_credentials()
            .map(|(username, secret)| Credential::Basic { username, secret })
    }
}

/// Registry that needs no credentials
#[derive(Debug, Clone, Copy, Default)]
pub struct Anonymous;

impl AuthProvider for Anonymous {
    fn bearer_token(&self) -> Option<String> {
        None
    }

    fn basic_credentials(&self) -> Option<(String, String)> {
        None
    }
}

/// Fixed credentials taken from configuration
#[derive(Debug, Clone, Default)]
pub struct StaticAuth {
    config: AuthConfig,
}

impl StaticAuth {
    pub fn new(config: AuthConfig) -> Self {
        Self { config }
    }

    pub fn bearer(token: impl Into<String>) -> Self {
        Self::new(AuthConfig {
            token: Some(token.into()),
            ..AuthConfig::default()
        })
    }

    pub fn basic(username: impl Into<String>, secret: impl Into<String>) -> Self {
        Self::new(AuthConfig {
            username: Some(username.into()),
            password: Some(secret.into()),
            token: None,
        })
    }
}

impl AuthProvider for StaticAuth {
    fn bearer_token(&self) -> Option<String> {
        self.config.token.clone()
    }

    fn basic_credentials(&self) -> Option<(String, String)> {
        match (&self.config.username, &self.config.password) {
            (Some(username), Some(password)) => Some((username.clone(), password.clone())),
            _ => None,
        }
    }
}
