//! Search backend connection configuration

use serde::{Deserialize, Serialize};
use std::fmt;

/// Connection settings for the OpenSearch cluster
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OpenSearchConfig {
    /// Base URL, e.g. "http://localhost:9200"
    pub url: String,
    /// Basic auth user (None = no auth)
    pub username: Option<String>,
    /// Basic auth password, falls back to `OPENSEARCH_PASSWORD`
    pub password: Option<String>,
    /// Per-request timeout in seconds
    pub timeout_secs: u64,
    /// Skip TLS certificate verification (self-signed dev clusters)
    pub accept_invalid_certs: bool,
}

impl Default for OpenSearchConfig {
    fn default() -> Self {
        Self {
            url: "http://localhost:9200".to_string(),
            username: None,
            password: None,
            timeout_secs: 60,
            accept_invalid_certs: false,
        }
    }
}

impl fmt::Debug for OpenSearchConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OpenSearchConfig")
            .field("url", &self.url)
            .field("username", &self.username)
            .field("password", &redacted(&self.password))
            .field("timeout_secs", &self.timeout_secs)
            .field("accept_invalid_certs", &self.accept_invalid_certs)
            .finish()
    }
}

/// Stand-in for a secret in `Debug` output
pub(crate) fn redacted(secret: &Option<String>) -> Option<&'static str> {
    secret.as_ref().map(|_| "<redacted>")
}

impl OpenSearchConfig {
    /// Fill the password from the environment when a user is set without one
    pub fn resolve_password(&mut self) {
        if self.username.is_some() && self.password.is_none() {
            self.password = std::env::var("OPENSEARCH_PASSWORD").ok();
        }
    }
}
