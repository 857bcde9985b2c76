//! Submitting bulk payloads to the search backend
//!
//! The coordinator only sees the [`BulkTransport`] trait. [`HttpTransport`]
//! talks to an OpenSearch (or Elasticsearch) `_bulk` endpoint over HTTP.

use super::request::BulkRequest;
use super::response::BulkResponse;
use crate::config::{redacted, OpenSearchConfig};
use crate::error::TransportError;
use reqwest::blocking::Client;
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};
use url::Url;

/// Sends one bulk payload and returns the parsed response
pub trait BulkTransport: Send + Sync {
    /// Submit an NDJSON `_bulk` payload targeting `index`
    fn submit(&self, index: &str, payload: &str) -> Result<BulkResponse, TransportError>;

    /// Submit a built request
    fn submit_request(&self, request: &BulkRequest) -> Result<BulkResponse, TransportError> {
        self.submit(request.index(), &request.to_ndjson())
    }
}

impl<T: BulkTransport + ?Sized> BulkTransport for Arc<T> {
    fn submit(&self, index: &str, payload: &str) -> Result<BulkResponse, TransportError> {
        (**self).submit(index, payload)
    }
}

impl<T: BulkTransport + ?Sized> BulkTransport for Box<T> {
    fn submit(&self, index: &str, payload: &str) -> Result<BulkResponse, TransportError> {
        (**self).submit(index, payload)
    }
}

/// HTTP transport for the `_bulk` API
pub struct HttpTransport {
    client: Client,
    base_url: Url,
    username: Option<String>,
    password: Option<String>,
}

impl HttpTransport {
    /// Create a transport from connection settings
    pub fn new(config: &OpenSearchConfig) -> Result<Self, TransportError> {
        // A trailing slash keeps any path prefix when joining "{index}/_bulk"
        let mut raw = config.url.trim().to_string();
        if !raw.ends_with('/') {
            raw.push('/');
        }
        let base_url = Url::parse(&raw)
            .map_err(|e| TransportError::Config(format!("Invalid URL '{}': {}", config.url, e)))?;

        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/x-ndjson"));

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .default_headers(headers)
            .danger_accept_invalid_certs(config.accept_invalid_certs)
            .build()
            .map_err(|e| TransportError::Config(format!("Failed to build HTTP client: {}", e)))?;

        info!("HTTP bulk transport initialized: {}", base_url);

        Ok(Self {
            client,
            base_url,
            username: config.username.clone(),
            password: config.password.clone(),
        })
    }

    fn bulk_url(&self, index: &str) -> Result<Url, TransportError> {
        self.base_url
            .join(&format!("{}/_bulk", index))
            .map_err(|e| TransportError::Config(format!("Invalid bulk URL for '{}': {}", index, e)))
    }
}

impl fmt::Debug for HttpTransport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpTransport")
            .field("base_url", &self.base_url.as_str())
            .field("username", &self.username)
            .field("password", &redacted(&self.password))
            .finish_non_exhaustive()
    }
}

impl BulkTransport for HttpTransport {
    fn submit(&self, index: &str, payload: &str) -> Result<BulkResponse, TransportError> {
        let url = self.bulk_url(index)?;
        debug!("POST {} ({} bytes)", url, payload.len());

        let mut request = self.client.post(url).body(payload.to_string());
        if let Some(ref username) = self.username {
            request = request.basic_auth(username, self.password.as_deref());
        }

        let response = request.send()?;
        let status = response.status();
        let body = response.text()?;

        if !status.is_success() {
            return Err(TransportError::Status {
                status: status.as_u16(),
                body,
            });
        }

        BulkResponse::from_json(&body)
    }
}
