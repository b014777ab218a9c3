// Copyright (c) 2013-2026 NameID developers. AGPL-3.0-or-later.
// See LICENSE for details.

//! # NameID Protocol: Core Library
//!
//! NameID lets a user log in with a Namecoin identity name (`id/<nick>`)
//! instead of a password. The provider hands out a nonce, the user signs a
//! challenge message with the key that owns the name, and the provider asks
//! a Namecoin daemon whether the signature is good.
//!
//! Nothing in here implements cryptography. Signature checks, address
//! validation and name lookups are all delegated to namecoind over JSON-RPC.
//!
//! ## Architecture
//!
//! - **challenge**: Builds the challenge string shared by provider and signer.
//! - **nonce**: One-shot nonces with a bounded lifetime.
//! - **rpc**: JSON-RPC envelopes, the HTTP transport and the `Namecoind` client.
//! - **namecoin**: High-level name lookups and message verification.
//! - **auth**: The login verifier tying nonce, name and signature together.
//! - **signer**: Client-side challenge signing through a local namecoind.
//! - **config**: Protocol constants and connection settings.

pub mod auth;
pub mod challenge;
pub mod config;
pub mod namecoin;
pub mod nonce;
pub mod rpc;
pub mod signer;

pub use auth::{AuthError, LoginOutcome, LoginRequest, LoginVerifier};
pub use challenge::Challenge;
pub use namecoin::{FixedNames, NameBackend, NameData, NameError, NamecoinInterface};
pub use nonce::{Nonce, NonceError, NonceStore};
pub use rpc::{HttpTransport, Namecoind, RpcError, Transport};
