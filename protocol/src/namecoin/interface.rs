//! [`NameBackend`] on a live namecoind.

use async_trait::async_trait;
use serde_json::{json, Value};

use super::{NameBackend, NameData, NameError};
use crate::config::{RPC_INVALID_ADDRESS_OR_KEY, RPC_NAME_NOT_FOUND};
use crate::rpc::{Namecoind, RpcError};

/// High-level access to Namecoin through a [`Namecoind`] client.
#[derive(Debug)]
pub struct NamecoinInterface {
    rpc: Namecoind,
    namespace: String,
}

impl NamecoinInterface {
    pub fn new(rpc: Namecoind, namespace: impl Into<String>) -> Self {
        Self {
            rpc,
            namespace: namespace.into(),
        }
    }

    fn full_name(&self, name: &str) -> String {
        format!("{}/{}", self.namespace, name)
    }
}

#[async_trait]
impl NameBackend for NamecoinInterface {
    fn namespace(&self) -> &str {
        &self.namespace
    }

    async fn is_legacy_address(&self, candidate: &Value) -> Result<bool, RpcError> {
        let Some(address) = candidate.as_str() else {
            return Ok(false);
        };

        let res = self.rpc.execute("validateaddress", vec![json!(address)]).await?;
        // Invalid addresses only report `isvalid`, so missing flags read as false.
        let flag = |key: &str| res.get(key).and_then(Value::as_bool).unwrap_or(false);

        Ok(flag("isvalid") && !flag("isscript") && !flag("iswitness"))
    }

    async fn get_id_data(&self, name: &str) -> Result<NameData, NameError> {
        let full_name = self.full_name(name);
        // An unknown name is a normal user mistake, not a daemon problem.
        let res = self
            .rpc
            .execute_with("name_show", vec![json!(full_name)], |e| {
                e.code == RPC_NAME_NOT_FOUND
            })
            .await?
            .ok_or_else(|| NameError::NotFound(name.to_string()))?;

        let data: NameData = serde_json::from_value(res)?;
        if data.name != full_name {
            return Err(NameError::Mismatch {
                expected: full_name,
                got: data.name,
            });
        }

        tracing::debug!(name = %full_name, address = %data.address, "name looked up");
        Ok(data)
    }

    async fn verify_message(
        &self,
        address: &str,
        message: &str,
        signature: &str,
    ) -> Result<bool, RpcError> {
        // Bad base64 in the signature is easy for a user to trigger and comes
        // back as -5. It is just an invalid signature.
        let res = self
            .rpc
            .execute_with(
                "verifymessage",
                vec![json!(address), json!(signature), json!(message)],
                |e| e.code == RPC_INVALID_ADDRESS_OR_KEY,
            )
            .await?;

        Ok(matches!(res, Some(Value::Bool(true))))
    }

    async fn sign_message(&self, address: &str, message: &str) -> Result<String, RpcError> {
        let res = self
            .rpc
            .execute("signmessage", vec![json!(address), json!(message)])
            .await?;

        match res {
            Value::String(signature) => Ok(signature),
            other => Err(RpcError::Decode(serde::de::Error::custom(format!(
                "signmessage returned non-string result: {}",
                other
            )))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rpc::testing::ScriptedTransport;
    use crate::rpc::RpcErrorObject;

    const ADDR: &str = "NFppu8bRjGVYTjyVrFZE9cGmjvzD6VUo5m";
    const MSG: &str = "My test message to be signed!\nAnother line.";
    const SIG: &str =
        "HCpqMVqWfYuT0WJ8WXyLhMXF5lnZ0DwphVcV0rr8bCNxONddYJtINIs5I8BdMqrk4wKaGQTK8035q+IMW3JVP0g=";

    /// A tiny stand-in for namecoind with two names and one signature.
    fn fake_daemon() -> NamecoinInterface {
        let transport = ScriptedTransport::new(|req| {
            let arg = |i: usize| req.params.get(i).and_then(Value::as_str).unwrap_or("");
            match req.method.as_str() {
                "name_show" => match arg(0) {
                    "id/domob" => Ok(json!({
                        "name": "id/domob",
                        "value": r#"{"email":"d@domob.eu"}"#,
                        "address": ADDR,
                    })),
                    "id/invalid-json" => Ok(json!({
                        "name": "id/invalid-json",
                        "value": "{this is not json",
                        "address": ADDR,
                    })),
                    "id/liar" => Ok(json!({
                        "name": "id/someone-else",
                        "value": "{}",
                        "address": ADDR,
                    })),
                    "id/broken" => Err(RpcErrorObject::new(-1, "database corrupt")),
                    _ => Err(RpcErrorObject::new(-4, "name not found")),
                },
                "validateaddress" => Ok(match arg(0) {
                    ADDR => json!({ "isvalid": true, "isscript": false, "iswitness": false }),
                    "6QYV9s9vvM3qH8eGr8cqvtQZLi8NBTm1TN" => {
                        json!({ "isvalid": true, "isscript": true, "iswitness": false })
                    }
                    "nc1q7x7j4jvqgs8f32ach38wum6zsnu06n9hd8np8d" => {
                        json!({ "isvalid": true, "isscript": false, "iswitness": true })
                    }
                    _ => json!({ "isvalid": false }),
                }),
                "verifymessage" => {
                    if arg(1) == "forged sig" {
                        return Err(RpcErrorObject::new(-5, "Malformed base64 encoding"));
                    }
                    Ok(json!(arg(0) == ADDR && arg(1) == SIG && arg(2) == MSG))
                }
                "signmessage" => Ok(json!(SIG)),
                other => Err(RpcErrorObject::new(-32601, format!("Method not found: {}", other))),
            }
        });
        NamecoinInterface::new(Namecoind::new(transport), "id")
    }

    #[tokio::test]
    async fn get_id_value_returns_parsed_json() {
        let nc = fake_daemon();
        let val = nc.get_id_value("domob").await.unwrap().unwrap();
        assert_eq!(val["email"], "d@domob.eu");
    }

    #[tokio::test]
    async fn invalid_json_value_is_none() {
        let nc = fake_daemon();
        assert_eq!(nc.get_id_value("invalid-json").await.unwrap(), None);
    }

    #[tokio::test]
    async fn missing_name_is_not_found() {
        let nc = fake_daemon();
        match nc.get_id_value("foo-bar-name-does-not-exist").await {
            Err(NameError::NotFound(name)) => assert_eq!(name, "foo-bar-name-does-not-exist"),
            other => panic!("expected NotFound, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn other_rpc_errors_propagate() {
        let nc = fake_daemon();
        match nc.get_id_data("broken").await {
            Err(NameError::Rpc(e)) => assert_eq!(e.code(), Some(-1)),
            other => panic!("expected rpc error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn name_mismatch_is_detected() {
        let nc = fake_daemon();
        assert!(matches!(
            nc.get_id_data("liar").await,
            Err(NameError::Mismatch { .. })
        ));
    }

    #[tokio::test]
    async fn verify_message_accepts_good_signature() {
        let nc = fake_daemon();
        assert!(nc.verify_message(ADDR, MSG, SIG).await.unwrap());
    }

    #[tokio::test]
    async fn verify_message_rejects_forgeries() {
        let nc = fake_daemon();
        assert!(!nc.verify_message(ADDR, "forged message", SIG).await.unwrap());
        assert!(!nc.verify_message(ADDR, MSG, "forged sig").await.unwrap());
    }

    #[tokio::test]
    async fn legacy_address_checks() {
        let nc = fake_daemon();
        assert!(nc.is_legacy_address(&json!(ADDR)).await.unwrap());

        for candidate in [
            json!([5]),
            json!(""),
            Value::Null,
            json!("invalid-address"),
            json!("6QYV9s9vvM3qH8eGr8cqvtQZLi8NBTm1TN"),
            json!("nc1q7x7j4jvqgs8f32ach38wum6zsnu06n9hd8np8d"),
        ] {
            assert!(
                !nc.is_legacy_address(&candidate).await.unwrap(),
                "{} should not be a legacy address",
                candidate
            );
        }
    }

    #[tokio::test]
    async fn sign_message_returns_signature() {
        let nc = fake_daemon();
        assert_eq!(nc.sign_message(ADDR, MSG).await.unwrap(), SIG);
    }

    #[test]
    fn namespace_is_reported() {
        assert_eq!(fake_daemon().namespace(), "id");
    }
}
