//! Name data from a fixed map, everything else from a real backend.

use std::collections::HashMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{NameBackend, NameData, NameError};
use crate::rpc::RpcError;

/// One manually bound name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FixedEntry {
    pub address: String,
    pub value: String,
}

/// A backend whose name lookups come from a manually filled map.
///
/// Address validation and signature checks still go to `inner`, so logins
/// against fixed names need real keys in the daemon's view.
#[derive(Debug)]
pub struct FixedNames<B> {
    inner: B,
    names: HashMap<String, FixedEntry>,
}

impl<B: NameBackend> FixedNames<B> {
    pub fn new(inner: B) -> Self {
        Self {
            inner,
            names: HashMap::new(),
        }
    }

    /// Build from an iterator of `(name, entry)` pairs.
    pub fn with_entries<I>(inner: B, entries: I) -> Self
    where
        I: IntoIterator<Item = (String, FixedEntry)>,
    {
        Self {
            inner,
            names: entries.into_iter().collect(),
        }
    }

    /// Add or overwrite the binding of `name`.
    pub fn set(&mut self, name: impl Into<String>, address: impl Into<String>, value: impl Into<String>) {
        self.names.insert(
            name.into(),
            FixedEntry {
                address: address.into(),
                value: value.into(),
            },
        );
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

#[async_trait]
impl<B: NameBackend> NameBackend for FixedNames<B> {
    fn namespace(&self) -> &str {
        self.inner.namespace()
    }

    async fn is_legacy_address(&self, candidate: &Value) -> Result<bool, RpcError> {
        self.inner.is_legacy_address(candidate).await
    }

    async fn get_id_data(&self, name: &str) -> Result<NameData, NameError> {
        let entry = self
            .names
            .get(name)
            .ok_or_else(|| NameError::NotFound(name.to_string()))?;

        Ok(NameData {
            name: format!("{}/{}", self.namespace(), name),
            value: entry.value.clone(),
            address: entry.address.clone(),
        })
    }

    async fn verify_message(
        &self,
        address: &str,
        message: &str,
        signature: &str,
    ) -> Result<bool, RpcError> {
        self.inner.verify_message(address, message, signature).await
    }

    async fn sign_message(&self, address: &str, message: &str) -> Result<String, RpcError> {
        self.inner.sign_message(address, message).await
    }
}
