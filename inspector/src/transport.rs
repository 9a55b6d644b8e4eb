//! Transport for JSON-RPC requests
//!
//! The cache only needs "send a request, get an envelope back". The HTTP
//! implementation posts to a single fixed endpoint; tests substitute a
//! scripted transport.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;

use crate::config::RemoteConfig;
use crate::error::{RemoteError, RemoteResult};
use crate::protocol::Request;

/// Trait for JSON-RPC transports
#[async_trait]
pub trait Transport: Send + Sync {
    /// Send one request and return the raw response envelope
    async fn send(&self, request: &Request) -> RemoteResult<Value>;

    /// Human-readable endpoint, used in logs
    fn endpoint(&self) -> &str;
}

/// JSON-RPC over HTTP POST
pub struct HttpTransport {
    client: Client,
    url: String,
}

impl HttpTransport {
    /// Create a transport for the configured endpoint
    pub fn new(config: &RemoteConfig) -> anyhow::Result<Self> {
        let url = config.endpoint()?.to_string();

        let mut builder = Client::builder().user_agent("bevy-inspector/0.1");
        if config.timeout_secs > 0 {
            builder = builder.timeout(Duration::from_secs(config.timeout_secs));
        }

        Ok(Self {
            client: builder.build()?,
            url,
        })
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(&self, request: &Request) -> RemoteResult<Value> {
        tracing::debug!(method = %request.method, id = request.id, "POST {}", self.url);

        let response = self.client.post(&self.url).json(request).send().await?;
        let status = response.status();
        let body = response.text().await?;

        // The remote reports RPC errors inside the envelope, sometimes with a
        // non-2xx status, so prefer the body whenever it parses
        match serde_json::from_str::<Value>(&body) {
            Ok(envelope) => Ok(envelope),
            Err(_) if !status.is_success() => Err(RemoteError::Transport(format!(
                "HTTP {}: {}",
                status, body
            ))),
            Err(e) => Err(RemoteError::Protocol(format!(
                "response body is not JSON: {}",
                e
            ))),
        }
    }

    fn endpoint(&self) -> &str {
        &self.url
    }
}
