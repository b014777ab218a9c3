//! # Challenge Signer
//!
//! The client half of a login: given the provider URI and nonce from a login
//! page, sign the challenge for a name with the local wallet. This is what
//! the browser add-on does on form submit.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::challenge::Challenge;
use crate::namecoin::{NameBackend, NameError};
use crate::rpc::RpcError;

#[derive(Debug, Error)]
pub enum SignError {
    #[error(transparent)]
    Name(#[from] NameError),

    /// The owner address cannot sign messages (script or witness address).
    #[error("address {0} of the name cannot sign messages")]
    NotSignable(String),

    #[error(transparent)]
    Rpc(#[from] RpcError),
}

/// A signed challenge, ready to be submitted to the provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignedChallenge {
    pub name: String,
    pub message: String,
    pub address: String,
    pub signature: String,
}

/// Sign `challenge` for `name` with the key of the address owning the name.
pub async fn sign_challenge(
    backend: &dyn NameBackend,
    challenge: &Challenge,
    name: &str,
) -> Result<SignedChallenge, SignError> {
    let data = backend.get_id_data(name).await?;
    if !backend
        .is_legacy_address(&serde_json::Value::from(data.address.as_str()))
        .await?
    {
        return Err(SignError::NotSignable(data.address));
    }

    let message = challenge.message_for(name);
    tracing::debug!(%name, %message, "signing challenge");
    let signature = backend.sign_message(&data.address, &message).await?;

    Ok(SignedChallenge {
        name: name.to_string(),
        message,
        address: data.address,
        signature,
    })
}
