//! # Protocol Configuration & Constants
//!
//! Every constant the provider and the signer must agree on lives here,
//! together with the connection settings for namecoind.

use std::time::Duration;

// ---------------------------------------------------------------------------
// Challenge Format
// ---------------------------------------------------------------------------

/// Leading keyword of every challenge message. Signer and provider must use
/// the same value or no signature will ever verify.
pub const CHALLENGE_PREFIX: &str = "login";

/// Query parameter that carries the identity name in an identity URL.
pub const NAME_QUERY_PARAM: &str = "name";

/// Number of random bytes in a nonce before hex encoding.
pub const NONCE_BYTES: usize = 16;

/// How long an issued nonce stays valid.
pub const DEFAULT_NONCE_TTL: Duration = Duration::from_secs(600);

/// How often the provider sweeps expired nonces.
pub const NONCE_PURGE_INTERVAL: Duration = Duration::from_secs(60);

/// Upper bound on nonces outstanding at once.
pub const DEFAULT_MAX_NONCES: usize = 100_000;

// ---------------------------------------------------------------------------
// Namecoin
// ---------------------------------------------------------------------------

/// Namespace that identity names live under (`id/<nick>`).
pub const DEFAULT_NAMESPACE: &str = "id";

/// Default namecoind JSON-RPC port on mainnet.
pub const DEFAULT_RPC_PORT: u16 = 8336;

/// Default namecoind host. The daemon is expected to run locally.
pub const DEFAULT_RPC_HOST: &str = "127.0.0.1";

/// Timeout for a single RPC round trip.
pub const DEFAULT_RPC_TIMEOUT: Duration = Duration::from_secs(30);

/// `name_show` reports an unknown name with this code.
pub const RPC_NAME_NOT_FOUND: i64 = -4;

/// `verifymessage` uses this code for malformed addresses and signatures
/// (including signatures that are not valid base64).
pub const RPC_INVALID_ADDRESS_OR_KEY: i64 = -5;

/// Key inside a name's JSON value listing extra addresses allowed to sign
/// logins for that name.
pub const SIGNER_VALUE_KEY: &str = "signer";

// ---------------------------------------------------------------------------
// Provider
// ---------------------------------------------------------------------------

/// Default HTTP port of the provider.
pub const DEFAULT_PROVIDER_PORT: u16 = 8080;

/// Default Prometheus metrics port.
pub const DEFAULT_METRICS_PORT: u16 = 9090;

/// Library version, reported by the provider's status endpoint.
pub const PROTOCOL_VERSION: &str = env!("CARGO_PKG_VERSION");

// ---------------------------------------------------------------------------
// Connection Settings
// ---------------------------------------------------------------------------

/// Everything needed to reach a namecoind JSON-RPC endpoint.
#[derive(Debug, Clone)]
pub struct RpcSettings {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
    pub timeout: Duration,
}

impl RpcSettings {
    /// The HTTP endpoint requests are posted to.
    pub fn url(&self) -> String {
        format!("http://{}:{}", self.host, self.port)
    }
}

impl Default for RpcSettings {
    fn default() -> Self {
        Self {
            host: DEFAULT_RPC_HOST.to_string(),
            port: DEFAULT_RPC_PORT,
            user: String::new(),
            password: String::new(),
            timeout: DEFAULT_RPC_TIMEOUT,
        }
    }
}
