//! Transport abstraction and the HTTP implementation.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use tracing::{instrument, trace};

use super::codec::{decode_response, encode_call};
use super::value::Value;
use crate::error::{ClientError, Result};

/// Carries one XML-RPC call to the control plane and returns the raw result.
///
/// Implementations must not retry; a failed round trip is reported as
/// [`ClientError::Transport`] (or [`ClientError::Fault`]).
#[async_trait]
pub trait Transport: Send + Sync {
    /// Invoke `method` with positional `params`.
    async fn call(&self, method: &str, params: &[Value]) -> Result<Value>;

    /// Human readable location of the server, for logs.
    fn endpoint(&self) -> &str;
}

/// XML-RPC over HTTP(S) using `reqwest`.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    endpoint: String,
    http: reqwest::Client,
}

impl HttpTransport {
    /// Create a transport for `endpoint`, e.g. `http://frontend:2633/RPC2`.
    ///
    /// `timeout` bounds each whole request; `None` leaves it unbounded.
    pub fn new(endpoint: impl Into<String>, timeout: Option<Duration>) -> Result<Self> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let http = builder
            .build()
            .map_err(|e| ClientError::Transport(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            endpoint: endpoint.into(),
            http,
        })
    }
}

#[async_trait]
impl Transport for HttpTransport {
    #[instrument(skip(self, params), fields(endpoint = %self.endpoint))]
    async fn call(&self, method: &str, params: &[Value]) -> Result<Value> {
        let body = encode_call(method, params)?;

        let response = self
            .http
            .post(&self.endpoint)
            .header(CONTENT_TYPE, "text/xml")
            .body(body)
            .send()
            .await
            .map_err(|e| ClientError::Transport(format!("request to {} failed: {}", self.endpoint, e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ClientError::Transport(format!(
                "HTTP {} from {}",
                status, self.endpoint
            )));
        }

        let text = response
            .text()
            .await
            .map_err(|e| ClientError::Transport(format!("failed to read response body: {}", e)))?;
        trace!(bytes = text.len(), "Received XML-RPC response");

        decode_response(&text)
    }

    fn endpoint(&self) -> &str {
        &self.endpoint
    }
}
