//! # Login Verification
//!
//! Decides whether a submitted `(name, nonce, signature)` triple proves
//! ownership of the name:
//!
//! 1. the nonce must be one we issued and not yet used;
//! 2. the name must exist;
//! 3. the signature over the challenge message must verify for the address
//!    owning the name, or for one of the extra addresses listed under
//!    `"signer"` in the name's JSON value.
//!
//! The nonce is burnt before anything else is checked, so every failed
//! attempt costs the client a fresh challenge.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::challenge::Challenge;
use crate::config::SIGNER_VALUE_KEY;
use crate::namecoin::{NameBackend, NameData, NameError};
use crate::nonce::{NonceError, NonceStore};
use crate::rpc::RpcError;

/// Why a login was refused.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("no name given")]
    EmptyName,

    #[error(transparent)]
    Nonce(#[from] NonceError),

    #[error("name not found: '{0}'")]
    UnknownName(String),

    #[error("signature does not verify for any signer of the name")]
    InvalidSignature,

    /// namecoind answered the lookup with data we cannot use.
    #[error("name lookup failed: {0}")]
    Lookup(#[source] NameError),

    /// Any failed call to namecoind, whichever step made it.
    #[error("namecoind request failed: {0}")]
    Backend(#[from] RpcError),
}

impl From<NameError> for AuthError {
    fn from(err: NameError) -> Self {
        match err {
            NameError::NotFound(name) => AuthError::UnknownName(name),
            NameError::Rpc(e) => AuthError::Backend(e),
            other => AuthError::Lookup(other),
        }
    }
}

/// A login form submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginRequest {
    pub name: String,
    pub nonce: String,
    pub signature: String,
}

/// A successful login.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginOutcome {
    /// The name without namespace, as typed by the user.
    pub name: String,
    /// Identity URL asserted for the user.
    pub identity: String,
    /// Address whose signature was accepted.
    pub signer: String,
}

/// Issues challenges and checks their signatures.
pub struct LoginVerifier {
    backend: Arc<dyn NameBackend>,
    nonces: Arc<NonceStore>,
    uri: String,
}

impl LoginVerifier {
    /// `uri` is the provider's public URL, the base of every identity URL.
    pub fn new(backend: Arc<dyn NameBackend>, nonces: Arc<NonceStore>, uri: impl Into<String>) -> Self {
        Self {
            backend,
            nonces,
            uri: uri.into(),
        }
    }

    pub fn uri(&self) -> &str {
        &self.uri
    }

    pub fn backend(&self) -> &Arc<dyn NameBackend> {
        &self.backend
    }

    pub fn nonces(&self) -> &Arc<NonceStore> {
        &self.nonces
    }

    /// Start a login attempt with a fresh nonce.
    pub fn issue_challenge(&self) -> Result<Challenge, NonceError> {
        let nonce = self.nonces.issue()?;
        Ok(Challenge::new(self.uri.clone(), nonce.as_str()))
    }

    /// Verify a submission. See the module docs for the rules.
    pub async fn verify(&self, request: &LoginRequest) -> Result<LoginOutcome, AuthError> {
        if request.name.is_empty() {
            return Err(AuthError::EmptyName);
        }
        self.nonces.consume(&request.nonce)?;

        let data = self.backend.get_id_data(&request.name).await?;
        let challenge = Challenge::new(self.uri.clone(), request.nonce.clone());
        let message = challenge.message_for(&request.name);

        for address in signer_candidates(&data) {
            if !self.backend.is_legacy_address(&Value::from(address.as_str())).await? {
                tracing::debug!(name = %request.name, %address, "skipping non-legacy signer");
                continue;
            }
            if self
                .backend
                .verify_message(&address, &message, &request.signature)
                .await?
            {
                tracing::info!(name = %request.name, signer = %address, "login verified");
                return Ok(LoginOutcome {
                    name: request.name.clone(),
                    identity: challenge.identity_for(&request.name),
                    signer: address,
                });
            }
        }

        tracing::info!(name = %request.name, "login rejected: bad signature");
        Err(AuthError::InvalidSignature)
    }
}

/// Addresses allowed to sign for `data`: the owner first, then any listed
/// under `"signer"` in the value. Duplicates and empty strings are dropped.
pub fn signer_candidates(data: &NameData) -> Vec<String> {
    let mut candidates = vec![data.address.clone()];

    if let Some(value) = data.json_value() {
        match value.get(SIGNER_VALUE_KEY) {
            Some(Value::String(addr)) => candidates.push(addr.clone()),
            Some(Value::Array(addrs)) => candidates.extend(
                addrs
                    .iter()
                    .filter_map(Value::as_str)
                    .map(str::to_string),
            ),
            _ => {}
        }
    }

    let mut seen = std::collections::HashSet::new();
    candidates.retain(|a| !a.is_empty() && seen.insert(a.clone()));
    candidates
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::challenge::build_challenge;
    use crate::config::DEFAULT_NONCE_TTL;
    use crate::namecoin::{FixedNames, NamecoinInterface};
    use crate::rpc::testing::ScriptedTransport;
    use crate::rpc::{Namecoind, RpcErrorObject};
    use serde_json::json;

    const URI: &str = "https://nameid.example/";
    const OWNER: &str = "NOwnerAddress";
    const DELEGATE: &str = "NDelegateAddress";
    const SCRIPT: &str = "6ScriptAddress";

    /// Signatures are "sig:<address>:<message>" in this fake world.
    fn fake_sig(address: &str, message: &str) -> String {
        format!("sig:{}:{}", address, message)
    }

    fn verifier() -> LoginVerifier {
        let transport = ScriptedTransport::new(|req| {
            let arg = |i: usize| req.params.get(i).and_then(Value::as_str).unwrap_or("");
            match req.method.as_str() {
                "validateaddress" => Ok(json!({
                    "isvalid": arg(0).starts_with('N') || arg(0).starts_with('6'),
                    "isscript": arg(0).starts_with('6'),
                    "iswitness": false,
                })),
                "verifymessage" => {
                    if arg(1) == "daemon-fault" {
                        return Err(RpcErrorObject::new(-1, "Unexpected failure"));
                    }
                    if !arg(1).starts_with("sig:") {
                        return Err(RpcErrorObject::new(-5, "Malformed base64 encoding"));
                    }
                    Ok(json!(arg(1) == fake_sig(arg(0), arg(2))))
                }
                _ => Err(RpcErrorObject::new(-32601, "Method not found")),
            }
        });
        let mut names = FixedNames::new(NamecoinInterface::new(Namecoind::new(transport), "id"));
        names.set("owner-only", OWNER, r#"{"email":"o@example.org"}"#);
        names.set(
            "delegated",
            OWNER,
            json!({ "signer": [DELEGATE, SCRIPT, 5] }).to_string(),
        );
        names.set("script-signer", OWNER, json!({ "signer": SCRIPT }).to_string());
        names.set("string-signer", OWNER, json!({ "signer": DELEGATE }).to_string());

        LoginVerifier::new(Arc::new(names), Arc::new(NonceStore::default()), URI)
    }

    fn signed_request(v: &LoginVerifier, name: &str, signer: &str) -> LoginRequest {
        let challenge = v.issue_challenge().unwrap();
        LoginRequest {
            name: name.into(),
            nonce: challenge.nonce.clone(),
            signature: fake_sig(signer, &challenge.message_for(name)),
        }
    }

    #[tokio::test]
    async fn owner_signature_logs_in() {
        let v = verifier();
        let req = signed_request(&v, "owner-only", OWNER);

        let outcome = v.verify(&req).await.unwrap();
        assert_eq!(outcome.identity, "https://nameid.example/?name=owner-only");
        assert_eq!(outcome.signer, OWNER);
    }

    #[tokio::test]
    async fn listed_signer_logs_in() {
        let v = verifier();
        let req = signed_request(&v, "delegated", DELEGATE);
        assert_eq!(v.verify(&req).await.unwrap().signer, DELEGATE);
    }

    #[tokio::test]
    async fn single_string_signer_logs_in() {
        let v = verifier();
        let req = signed_request(&v, "string-signer", DELEGATE);
        assert_eq!(v.verify(&req).await.unwrap().signer, DELEGATE);
    }

    #[tokio::test]
    async fn unlisted_signer_is_rejected() {
        let v = verifier();
        let req = signed_request(&v, "owner-only", DELEGATE);
        assert!(matches!(v.verify(&req).await, Err(AuthError::InvalidSignature)));
    }

    #[tokio::test]
    async fn script_address_signer_is_ignored() {
        let v = verifier();
        let req = signed_request(&v, "script-signer", SCRIPT);
        assert!(matches!(v.verify(&req).await, Err(AuthError::InvalidSignature)));
    }

    #[tokio::test]
    async fn malformed_signature_is_just_invalid() {
        let v = verifier();
        let mut req = signed_request(&v, "owner-only", OWNER);
        req.signature = "!!not base64!!".into();
        assert!(matches!(v.verify(&req).await, Err(AuthError::InvalidSignature)));
    }

    #[tokio::test]
    async fn signature_over_other_name_is_rejected() {
        let v = verifier();
        let challenge = v.issue_challenge().unwrap();
        let req = LoginRequest {
            name: "delegated".into(),
            nonce: challenge.nonce.clone(),
            signature: fake_sig(OWNER, &challenge.message_for("owner-only")),
        };
        assert!(matches!(v.verify(&req).await, Err(AuthError::InvalidSignature)));
    }

    #[tokio::test]
    async fn nonce_cannot_be_replayed() {
        let v = verifier();
        let req = signed_request(&v, "owner-only", OWNER);

        assert!(v.verify(&req).await.is_ok());
        assert!(matches!(
            v.verify(&req).await,
            Err(AuthError::Nonce(NonceError::Unknown))
        ));
    }

    #[tokio::test]
    async fn expired_nonce_is_rejected() {
        let v = verifier();
        let req = signed_request(&v, "owner-only", OWNER);
        v.nonces()
            .backdate(&req.nonce, DEFAULT_NONCE_TTL + std::time::Duration::from_secs(1));

        assert!(matches!(
            v.verify(&req).await,
            Err(AuthError::Nonce(NonceError::Expired))
        ));
        assert!(v.nonces().is_empty());
    }

    #[tokio::test]
    async fn foreign_nonce_is_rejected() {
        let v = verifier();
        let message = build_challenge(URI, "owner-only", "cafe");
        let req = LoginRequest {
            name: "owner-only".into(),
            nonce: "cafe".into(),
            signature: fake_sig(OWNER, &message),
        };
        assert!(matches!(v.verify(&req).await, Err(AuthError::Nonce(_))));
    }

    #[tokio::test]
    async fn unknown_name_is_reported() {
        let v = verifier();
        let req = signed_request(&v, "nobody", OWNER);
        assert!(matches!(v.verify(&req).await, Err(AuthError::UnknownName(n)) if n == "nobody"));
    }

    #[tokio::test]
    async fn empty_name_is_rejected_without_burning_nonce() {
        let v = verifier();
        let req = signed_request(&v, "", OWNER);
        assert!(matches!(v.verify(&req).await, Err(AuthError::EmptyName)));
        assert_eq!(v.nonces().len(), 1);
    }

    #[tokio::test]
    async fn verify_failure_on_daemon_is_backend_error() {
        let v = verifier();
        let mut req = signed_request(&v, "owner-only", OWNER);
        req.signature = "daemon-fault".into();

        match v.verify(&req).await {
            Err(AuthError::Backend(RpcError::Remote { code, .. })) => assert_eq!(code, -1),
            other => panic!("expected backend error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn lookup_failure_on_daemon_is_backend_error() {
        let transport =
            ScriptedTransport::new(|_| Err(RpcErrorObject::new(-28, "Loading block index...")));
        let interface = NamecoinInterface::new(Namecoind::new(transport), "id");
        let v = LoginVerifier::new(Arc::new(interface), Arc::new(NonceStore::default()), URI);
        let req = signed_request(&v, "domob", OWNER);

        match v.verify(&req).await {
            Err(AuthError::Backend(RpcError::Remote { code, .. })) => assert_eq!(code, -28),
            other => panic!("expected backend error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn full_nonce_store_refuses_challenges() {
        let names = FixedNames::new(NamecoinInterface::new(
            Namecoind::new(ScriptedTransport::new(|_| Ok(Value::Null))),
            "id",
        ));
        let nonces = Arc::new(NonceStore::with_capacity(DEFAULT_NONCE_TTL, 1));
        let v = LoginVerifier::new(Arc::new(names), nonces, URI);

        assert!(v.issue_challenge().is_ok());
        assert!(matches!(v.issue_challenge(), Err(NonceError::Exhausted(1))));
    }

    #[test]
    fn candidates_keep_order_and_drop_duplicates() {
        let data = NameData {
            name: "id/x".into(),
            value: json!({ "signer": ["B", "A", "B", ""] }).to_string(),
            address: "A".into(),
        };
        assert_eq!(signer_candidates(&data), vec!["A", "B"]);
    }

    #[test]
    fn candidates_without_json_value_are_owner_only() {
        let data = NameData {
            name: "id/x".into(),
            value: "plain text".into(),
            address: "A".into(),
        };
        assert_eq!(signer_candidates(&data), vec!["A"]);
    }
}
