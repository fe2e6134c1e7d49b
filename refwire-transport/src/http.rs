use async_trait::async_trait;
use bytes::Bytes;
use serde_json::Value;
use std::collections::BTreeMap;
use std::time::Duration;
use tracing::{debug, trace};

use crate::{FetchOptions, Method, Transport, TransportError};

/// HTTP transport configuration
#[derive(Debug, Clone)]
pub struct HttpTransportConfig {
    /// Origin that entity URIs are appended to
    pub base_url: String,
    /// Request timeout in milliseconds
    pub timeout_ms: u64,
    /// Headers sent with every request
    pub default_headers: BTreeMap<String, String>,
}

impl Default for HttpTransportConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:3000".to_string(),
            timeout_ms: 30000,
            default_headers: BTreeMap::from([(
                "accept".to_string(),
                "application/json".to_string(),
            )]),
        }
    }
}

/// `reqwest`-backed transport
#[derive(Debug, Clone)]
pub struct HttpTransport {
    config: HttpTransportConfig,
    http_client: reqwest::Client,
}

impl HttpTransport {
    pub fn new(config: HttpTransportConfig) -> Result<Self, TransportError> {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()
            .map_err(|e| TransportError::Request(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            config,
            http_client,
        })
    }

    pub fn new_with_url(url: &str) -> Result<Self, TransportError> {
        let config = HttpTransportConfig {
            base_url: url.to_string(),
            ..Default::default()
        };
        Self::new(config)
    }

    pub fn config(&self) -> &HttpTransportConfig {
        &self.config
    }

    /// Absolute URIs are used as-is; paths are joined onto the base URL.
    pub fn url_for(&self, uri: &str) -> String {
        if uri.starts_with("http://") || uri.starts_with("https://") {
            return uri.to_string();
        }
        format!("{}{}", self.config.base_url.trim_end_matches('/'), uri)
    }
}

fn to_reqwest(method: Method) -> reqwest::Method {
    match method {
        Method::Get => reqwest::Method::GET,
        Method::Put => reqwest::Method::PUT,
        Method::Post => reqwest::Method::POST,
        Method::Delete => reqwest::Method::DELETE,
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn fetch(&self, uri: &str, options: FetchOptions) -> Result<Value, TransportError> {
        let url = self.url_for(uri);
        let mut request = self.http_client.request(to_reqwest(options.method), &url);

        for (name, value) in self.config.default_headers.iter().chain(options.headers.iter()) {
            request = request.header(name.as_str(), value.as_str());
        }
        if let Some(data) = &options.data {
            request = request.json(data);
        }

        debug!(method = %options.method, url = %url, "sending request");

        let response = request
            .send()
            .await
            .map_err(|e| TransportError::Request(e.to_string()))?;

        let status = response.status();
        let body: Bytes = response
            .bytes()
            .await
            .map_err(|e| TransportError::Request(format!("Failed to read response body: {}", e)))?;

        if !status.is_success() {
            return Err(TransportError::Http {
                status: status.as_u16(),
                body: String::from_utf8_lossy(&body).into_owned(),
            });
        }

        trace!("Response body: {}", String::from_utf8_lossy(&body));

        if body.iter().all(u8::is_ascii_whitespace) {
            return Ok(Value::Null);
        }
        Ok(serde_json::from_slice(&body)?)
    }
}
