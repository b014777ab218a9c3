//! # Namecoind JSON-RPC
//!
//! Everything needed to call namecoind: envelope types, the HTTP transport,
//! and the [`Namecoind`] client that numbers requests and unwraps results.
//!
//! | Layer       | Responsibility                                     |
//! |-------------|----------------------------------------------------|
//! | `types`     | `{method, params, id}` / `{result, error, id}`     |
//! | `transport` | HTTP POST, Basic auth, status-code handling        |
//! | `client`    | id matching, error objects to [`RpcError::Remote`] |

mod client;
mod error;
mod transport;
pub mod types;

pub use client::Namecoind;
pub use error::RpcError;
pub use transport::{HttpTransport, Transport};
pub use types::{RpcErrorObject, RpcRequest, RpcResponse};
