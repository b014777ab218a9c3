//! # CLI Interface
//!
//! Command-line arguments for `nameid-provider` using `clap` derive.
//! Every connection setting can also come from a `NAMEID_*` environment
//! variable so passwords stay out of the process list.

use std::path::PathBuf;
use std::time::Duration;

use clap::{Args, Parser, Subcommand};
use nameid_protocol::config::{
    RpcSettings, DEFAULT_MAX_NONCES, DEFAULT_METRICS_PORT, DEFAULT_NAMESPACE,
    DEFAULT_PROVIDER_PORT, DEFAULT_RPC_HOST, DEFAULT_RPC_PORT,
};

/// NameID: log in with a Namecoin identity.
///
/// Runs the identity provider, or acts as the user-side signer for a
/// NameID login page.
#[derive(Parser, Debug)]
#[command(
    name = "nameid-provider",
    about = "NameID identity provider and challenge signer",
    version,
    propagate_version = true
)]
pub struct NameIdCli {
    /// Log output format: "pretty" or "json".
    #[arg(long, global = true, env = "NAMEID_LOG_FORMAT", default_value = "pretty")]
    pub log_format: String,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Serve the identity provider over HTTP.
    Run(RunArgs),
    /// Sign a login challenge with the local namecoind wallet.
    Sign(SignArgs),
    /// Show what the provider sees for a name.
    Lookup(LookupArgs),
    /// Print version information and exit.
    Version,
}

/// How to reach namecoind.
#[derive(Args, Debug, Clone)]
pub struct RpcArgs {
    #[arg(long, env = "NAMEID_RPC_HOST", default_value = DEFAULT_RPC_HOST)]
    pub rpc_host: String,

    #[arg(long, env = "NAMEID_RPC_PORT", default_value_t = DEFAULT_RPC_PORT)]
    pub rpc_port: u16,

    #[arg(long, env = "NAMEID_RPC_USER", default_value = "")]
    pub rpc_user: String,

    #[arg(long, env = "NAMEID_RPC_PASSWORD", default_value = "", hide_env_values = true)]
    pub rpc_password: String,

    /// Timeout for a single RPC call, in seconds.
    #[arg(long, env = "NAMEID_RPC_TIMEOUT_SECS", default_value_t = 30)]
    pub rpc_timeout_secs: u64,

    /// Namespace identity names live in.
    #[arg(long, env = "NAMEID_NAMESPACE", default_value = DEFAULT_NAMESPACE)]
    pub namespace: String,
}

impl RpcArgs {
    pub fn settings(&self) -> RpcSettings {
        RpcSettings {
            host: self.rpc_host.clone(),
            port: self.rpc_port,
            user: self.rpc_user.clone(),
            password: self.rpc_password.clone(),
            timeout: Duration::from_secs(self.rpc_timeout_secs),
        }
    }
}

/// Arguments for the `run` subcommand.
#[derive(Args, Debug)]
pub struct RunArgs {
    #[command(flatten)]
    pub rpc: RpcArgs,

    /// Public URL of this provider. Identity URLs are `<uri>?name=<nick>`.
    #[arg(long, env = "NAMEID_URI", default_value = "http://localhost:8080/")]
    pub uri: String,

    /// Port for the HTTP API.
    #[arg(long, env = "NAMEID_PORT", default_value_t = DEFAULT_PROVIDER_PORT)]
    pub port: u16,

    /// Port for the Prometheus metrics endpoint.
    #[arg(long, env = "NAMEID_METRICS_PORT", default_value_t = DEFAULT_METRICS_PORT)]
    pub metrics_port: u16,

    /// Seconds an issued nonce stays valid.
    #[arg(long, env = "NAMEID_NONCE_TTL_SECS", default_value_t = 600)]
    pub nonce_ttl_secs: u64,

    /// Most nonces outstanding at once; `/challenge` answers 503 beyond that.
    #[arg(long, env = "NAMEID_MAX_NONCES", default_value_t = DEFAULT_MAX_NONCES)]
    pub max_nonces: usize,

    /// JSON file of fixed name bindings (`{"nick": {"address": .., "value": ..}}`)
    /// served instead of blockchain lookups. For development only.
    #[arg(long, env = "NAMEID_FIXED_NAMES")]
    pub fixed_names: Option<PathBuf>,
}

/// Arguments for the `sign` subcommand.
#[derive(Args, Debug)]
pub struct SignArgs {
    #[command(flatten)]
    pub rpc: RpcArgs,

    /// Provider URI shown on the login page.
    #[arg(long)]
    pub uri: String,

    /// Nonce shown on the login page.
    #[arg(long)]
    pub nonce: String,

    /// Identity name to log in as, without namespace.
    #[arg(long)]
    pub name: String,
}

/// Arguments for the `lookup` subcommand.
#[derive(Args, Debug)]
pub struct LookupArgs {
    #[command(flatten)]
    pub rpc: RpcArgs,

    /// Identity name, without namespace.
    pub name: String,
}
