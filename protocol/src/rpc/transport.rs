//! # Transports
//!
//! A [`Transport`] moves one JSON-RPC request to namecoind and brings the
//! response back. [`HttpTransport`] is the real one; tests plug in scripted
//! transports instead.

use async_trait::async_trait;
use reqwest::header::{ACCEPT, CONTENT_TYPE};

use super::error::RpcError;
use super::types::{RpcRequest, RpcResponse};
use crate::config::RpcSettings;

/// Carries a single request/response exchange.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, request: &RpcRequest) -> Result<RpcResponse, RpcError>;
}

/// JSON-RPC over HTTP POST with Basic authentication.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
    url: String,
    user: String,
    password: String,
}

impl HttpTransport {
    pub fn new(settings: &RpcSettings) -> Result<Self, RpcError> {
        let client = reqwest::Client::builder()
            .timeout(settings.timeout)
            .build()?;
        Ok(Self {
            client,
            url: settings.url(),
            user: settings.user.clone(),
            password: settings.password.clone(),
        })
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(&self, request: &RpcRequest) -> Result<RpcResponse, RpcError> {
        let body = serde_json::to_string(request)?;
        tracing::trace!(url = %self.url, %body, "namecoind request");

        let response = self
            .client
            .post(&self.url)
            .basic_auth(&self.user, Some(&self.password))
            .header(CONTENT_TYPE, "application/json")
            .header(ACCEPT, "application/json")
            .body(body)
            .send()
            .await?;

        let status = response.status().as_u16();
        tracing::debug!(method = %request.method, status, "namecoind responded");

        match status {
            401 => Err(RpcError::Unauthorized),
            // 500 carries an RPC error object, 404 an unknown method. Both
            // are proper JSON-RPC responses and are handled by the caller.
            200 | 404 | 500 => {
                let text = response.text().await?;
                tracing::trace!(body = %text, "namecoind response");
                Ok(serde_json::from_str(&text)?)
            }
            other => Err(RpcError::UnexpectedStatus(other)),
        }
    }
}
