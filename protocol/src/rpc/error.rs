//! Errors raised while talking to namecoind.

use thiserror::Error;

/// Failure of a single JSON-RPC call.
#[derive(Debug, Error)]
pub enum RpcError {
    /// namecoind rejected the HTTP Basic credentials.
    #[error("could not authenticate with namecoind")]
    Unauthorized,

    /// The daemon answered with a status that carries no JSON-RPC body.
    #[error("unexpected HTTP status {0} from namecoind")]
    UnexpectedStatus(u16),

    /// Connection, timeout or other transport-level failure.
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// The body was not a JSON-RPC response.
    #[error("invalid JSON-RPC payload: {0}")]
    Decode(#[from] serde_json::Error),

    /// The response belongs to a different request.
    #[error("response id mismatch: expected {expected}, got {got}")]
    IdMismatch {
        /// Id of the request we sent.
        expected: u64,
        /// Id found in the response, as JSON text.
        got: String,
    },

    /// namecoind processed the request and reported an error.
    #[error("namecoind error {code}: {message}")]
    Remote { code: i64, message: String },
}

impl RpcError {
    /// The RPC error code, if namecoind reported one.
    pub fn code(&self) -> Option<i64> {
        match self {
            RpcError::Remote { code, .. } => Some(*code),
            _ => None,
        }
    }
}
