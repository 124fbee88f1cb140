//! Transport seam between the connector and the HTTP client
//!
//! The connector never touches the HTTP client directly. It builds an
//! [`ApiRequest`] and hands it to a [`Transport`], which settles into either
//! a [`RawResponse`] or a transport error. Production code uses the
//! reqwest-backed [`HttpTransport`]; tests substitute a stub exchange.

use crate::config::{Secret, ServiceNowConfig};
use crate::error::{ConnectorError, Result};
use async_trait::async_trait;
use std::time::Duration;

/// Method of a table API request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiMethod {
    /// Bounded read of existing records
    Get,
    /// Creation of a new record
    Post,
}

impl ApiMethod {
    fn as_reqwest_method(&self) -> reqwest::Method {
        match self {
            ApiMethod::Get => reqwest::Method::GET,
            ApiMethod::Post => reqwest::Method::POST,
        }
    }
}

/// A single request against the table API, ready for dispatch
#[derive(Debug, Clone)]
pub struct ApiRequest {
    pub method: ApiMethod,
    /// Path plus optional query, relative to the instance base URL
    pub uri: String,
    /// Optional JSON payload (create only)
    pub body: Option<serde_json::Value>,
}

/// Raw result of a completed HTTP exchange
#[derive(Debug, Clone)]
pub struct RawResponse {
    pub status: u16,
    pub body: String,
}

impl RawResponse {
    /// Check whether the status is in the 200-299 range
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Opaque request/response primitive the connector dispatches through.
///
/// One call settles exactly once: with a response, however unwelcome its
/// status or body, or with a transport error when no response was obtained.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn execute(&self, request: &ApiRequest) -> Result<RawResponse>;
}

/// reqwest-backed transport bound to one instance and one set of credentials
pub struct HttpTransport {
    client: reqwest::Client,
    base_url: String,
    username: String,
    password: Secret,
}

impl HttpTransport {
    /// Build the HTTP client for a configuration.
    ///
    /// The configured timeout is the only bound on a hung exchange.
    pub fn new(config: &ServiceNowConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs as u64))
            .build()
            .map_err(|e| {
                ConnectorError::transport(format!("failed to build HTTP client: {}", e))
            })?;

        Ok(Self {
            client,
            base_url: config.url.trim_end_matches('/').to_string(),
            username: config.auth.username.clone(),
            password: config.auth.password.clone(),
        })
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn execute(&self, request: &ApiRequest) -> Result<RawResponse> {
        let url = format!("{}{}", self.base_url, request.uri);

        let mut builder = self
            .client
            .request(request.method.as_reqwest_method(), &url)
            .basic_auth(&self.username, Some(self.password.expose()));

        if let Some(ref body) = request.body {
            builder = builder.json(body);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| ConnectorError::transport(e.to_string()))?;

        let status = response.status().as_u16();
        let body = response.text().await.map_err(|e| {
            ConnectorError::transport(format!("failed to read response body: {}", e))
        })?;

        Ok(RawResponse { status, body })
    }
}
