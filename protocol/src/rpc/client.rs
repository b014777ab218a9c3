//! # Namecoind Client
//!
//! Numbers requests, checks that each response belongs to its request, and
//! turns RPC error objects into [`RpcError::Remote`].

use std::sync::atomic::{AtomicU64, Ordering};

use serde_json::Value;

use super::error::RpcError;
use super::transport::{HttpTransport, Transport};
use super::types::{RpcErrorObject, RpcRequest};
use crate::config::RpcSettings;

/// A connection to namecoind.
pub struct Namecoind {
    transport: Box<dyn Transport>,
    /// Incremented for every request so responses can be matched up.
    next_id: AtomicU64,
}

impl std::fmt::Debug for Namecoind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Namecoind")
            .field("next_id", &self.next_id)
            .finish_non_exhaustive()
    }
}

impl Namecoind {
    pub fn new(transport: impl Transport + 'static) -> Self {
        Self {
            transport: Box::new(transport),
            next_id: AtomicU64::new(1),
        }
    }

    /// Connect over HTTP using `settings`.
    pub fn connect(settings: &RpcSettings) -> Result<Self, RpcError> {
        Ok(Self::new(HttpTransport::new(settings)?))
    }

    /// Call `method` and return its result. RPC errors become
    /// [`RpcError::Remote`].
    pub async fn execute(&self, method: &str, params: Vec<Value>) -> Result<Value, RpcError> {
        match self.call(method, params).await? {
            Ok(result) => Ok(result),
            Err(error) => Err(remote_error(method, error)),
        }
    }

    /// Like [`execute`](Self::execute), but `handler` gets a look at an RPC
    /// error first. If it returns `true` the error counts as handled and the
    /// call yields `Ok(None)`.
    pub async fn execute_with<F>(
        &self,
        method: &str,
        params: Vec<Value>,
        handler: F,
    ) -> Result<Option<Value>, RpcError>
    where
        F: FnOnce(&RpcErrorObject) -> bool,
    {
        match self.call(method, params).await? {
            Ok(result) => Ok(Some(result)),
            Err(error) if handler(&error) => Ok(None),
            Err(error) => Err(remote_error(method, error)),
        }
    }

    async fn call(
        &self,
        method: &str,
        params: Vec<Value>,
    ) -> Result<Result<Value, RpcErrorObject>, RpcError> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let request = RpcRequest::new(id, method, params);
        let response = self.transport.send(&request).await?;

        if response.id != Value::from(id) {
            return Err(RpcError::IdMismatch {
                expected: id,
                got: response.id.to_string(),
            });
        }

        match response.error {
            Some(error) => Ok(Err(error)),
            None => Ok(Ok(response.result.unwrap_or(Value::Null))),
        }
    }
}

fn remote_error(method: &str, error: RpcErrorObject) -> RpcError {
    tracing::warn!(method, code = error.code, message = %error.message, "namecoind returned an error");
    RpcError::Remote {
        code: error.code,
        message: error.message,
    }
}
