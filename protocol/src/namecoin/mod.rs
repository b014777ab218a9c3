//! # Namecoin Interface
//!
//! High-level operations on top of the JSON-RPC client: look up identity
//! names, check whether an address can sign messages, and verify or create
//! message signatures.
//!
//! [`NameBackend`] is the seam the rest of the crate programs against.
//! [`NamecoinInterface`] implements it on a live daemon; [`FixedNames`]
//! serves name data from an in-memory map and delegates the rest, which is
//! handy for development setups without registered names.

mod fixed;
mod interface;

pub use fixed::{FixedEntry, FixedNames};
pub use interface::NamecoinInterface;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::rpc::RpcError;

/// Errors from name lookups.
#[derive(Debug, Error)]
pub enum NameError {
    /// The name is not registered (or has expired).
    #[error("name not found: '{0}'")]
    NotFound(String),

    /// namecoind answered for a different name than we asked about.
    #[error("name_show returned '{got}' for '{expected}'")]
    Mismatch { expected: String, got: String },

    /// The `name_show` result did not have the expected shape.
    #[error("malformed name data: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error(transparent)]
    Rpc(#[from] RpcError),
}

/// What `name_show` reports about a name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NameData {
    /// Full name including the namespace, e.g. `id/domob`.
    pub name: String,
    /// Raw value string. Identity names usually store JSON here.
    pub value: String,
    /// Address currently owning the name.
    #[serde(default)]
    pub address: String,
}

impl NameData {
    /// The value parsed as JSON, or `None` if it is not valid JSON.
    pub fn json_value(&self) -> Option<Value> {
        serde_json::from_str(&self.value).ok()
    }
}

/// Operations the provider and signer need from Namecoin.
#[async_trait]
pub trait NameBackend: Send + Sync {
    /// Namespace prefix names are looked up under.
    fn namespace(&self) -> &str;

    /// `true` iff `candidate` is a string holding a valid legacy (non-script,
    /// non-witness) address, the only kind that can sign messages.
    async fn is_legacy_address(&self, candidate: &Value) -> Result<bool, RpcError>;

    /// Name data for `name` within [`namespace`](Self::namespace).
    async fn get_id_data(&self, name: &str) -> Result<NameData, NameError>;

    /// The name's value as JSON; `None` when the value is not valid JSON.
    async fn get_id_value(&self, name: &str) -> Result<Option<Value>, NameError> {
        Ok(self.get_id_data(name).await?.json_value())
    }

    /// Check `signature` over `message` for `address`. Malformed input
    /// yields `Ok(false)`; only transport problems are errors.
    async fn verify_message(
        &self,
        address: &str,
        message: &str,
        signature: &str,
    ) -> Result<bool, RpcError>;

    /// Sign `message` with the wallet key of `address`.
    async fn sign_message(&self, address: &str, message: &str) -> Result<String, RpcError>;
}
