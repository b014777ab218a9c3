// Copyright (c) 2013-2026 NameID developers. AGPL-3.0-or-later.
// See LICENSE for details.

//! # NameID Provider
//!
//! Entry point for the `nameid-provider` binary.
//!
//! - `run`      serve the identity provider and its metrics endpoint
//! - `sign`     sign a login challenge with the local namecoind wallet
//! - `lookup`   print the data of an identity name
//! - `version`  print build version information

mod api;
mod cli;
mod logging;
mod metrics;

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::signal;

use nameid_protocol::config::{NONCE_PURGE_INTERVAL, PROTOCOL_VERSION};
use nameid_protocol::namecoin::{FixedEntry, FixedNames, NameBackend, NamecoinInterface};
use nameid_protocol::signer::sign_challenge;
use nameid_protocol::{Challenge, LoginVerifier, Namecoind, NonceStore};

use cli::{Commands, NameIdCli, RpcArgs};
use logging::LogFormat;
use metrics::ProviderMetrics;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = NameIdCli::parse();
    let format = LogFormat::from_str_lossy(&cli.log_format);

    match cli.command {
        Commands::Run(args) => {
            logging::init_logging(
                "nameid_provider=info,nameid_protocol=info,tower_http=debug",
                format,
            );
            run_provider(args).await
        }
        Commands::Sign(args) => {
            logging::init_logging("nameid_provider=warn,nameid_protocol=warn", format);
            sign(args).await
        }
        Commands::Lookup(args) => {
            logging::init_logging("nameid_provider=warn,nameid_protocol=warn", format);
            lookup(args).await
        }
        Commands::Version => {
            print_version();
            Ok(())
        }
    }
}

/// Connect to namecoind as configured by `args`.
fn connect(args: &RpcArgs) -> Result<NamecoinInterface> {
    let settings = args.settings();
    let rpc = Namecoind::connect(&settings)
        .with_context(|| format!("failed to set up RPC client for {}", settings.url()))?;
    Ok(NamecoinInterface::new(rpc, args.namespace.clone()))
}

/// Read a fixed-names file: a JSON object mapping nicks to
/// `{"address": .., "value": ..}`.
fn load_fixed_names(path: &Path) -> Result<HashMap<String, FixedEntry>> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read fixed names from {}", path.display()))?;
    serde_json::from_str(&raw)
        .with_context(|| format!("invalid fixed names file {}", path.display()))
}

/// Serve the provider API and metrics until a shutdown signal arrives.
async fn run_provider(args: cli::RunArgs) -> Result<()> {
    tracing::info!(
        port = args.port,
        metrics_port = args.metrics_port,
        uri = %args.uri,
        rpc = %args.rpc.settings().url(),
        namespace = %args.rpc.namespace,
        "starting nameid-provider"
    );

    let interface = connect(&args.rpc)?;
    let backend: Arc<dyn NameBackend> = match &args.fixed_names {
        Some(path) => {
            let entries = load_fixed_names(path)?;
            tracing::warn!(
                count = entries.len(),
                path = %path.display(),
                "serving fixed name bindings instead of blockchain data"
            );
            Arc::new(FixedNames::with_entries(interface, entries))
        }
        None => Arc::new(interface),
    };

    let nonces = Arc::new(NonceStore::with_capacity(
        Duration::from_secs(args.nonce_ttl_secs),
        args.max_nonces,
    ));
    let verifier = Arc::new(LoginVerifier::new(backend, Arc::clone(&nonces), args.uri.clone()));
    let provider_metrics =
        Arc::new(ProviderMetrics::new().context("failed to register metrics")?);

    let app_state = api::AppState {
        version: format!("{} (protocol {})", env!("CARGO_PKG_VERSION"), PROTOCOL_VERSION),
        verifier,
        metrics: Arc::clone(&provider_metrics),
    };

    // --- API server ---
    let api_router = api::create_router(app_state);
    let api_addr = format!("0.0.0.0:{}", args.port);
    let api_listener = tokio::net::TcpListener::bind(&api_addr)
        .await
        .with_context(|| format!("failed to bind API listener on {}", api_addr))?;
    tracing::info!("provider listening on {}", api_addr);

    // --- Metrics server ---
    let metrics_router = axum::Router::new()
        .route("/metrics", axum::routing::get(metrics::metrics_handler))
        .with_state(Arc::clone(&provider_metrics));
    let metrics_addr = format!("0.0.0.0:{}", args.metrics_port);
    let metrics_listener = tokio::net::TcpListener::bind(&metrics_addr)
        .await
        .with_context(|| format!("failed to bind metrics listener on {}", metrics_addr))?;
    tracing::info!("metrics listening on {}", metrics_addr);

    // --- Nonce sweeper ---
    let sweep_nonces = Arc::clone(&nonces);
    let sweeper = tokio::spawn(async move {
        let mut interval = tokio::time::interval(NONCE_PURGE_INTERVAL);
        loop {
            interval.tick().await;
            let purged = sweep_nonces.purge_expired();
            if purged > 0 {
                tracing::debug!(purged, remaining = sweep_nonces.len(), "expired nonces purged");
            }
        }
    });

    tokio::select! {
        res = axum::serve(api_listener, api_router) => {
            if let Err(e) = res {
                tracing::error!("API server error: {}", e);
            }
        }
        res = axum::serve(metrics_listener, metrics_router) => {
            if let Err(e) = res {
                tracing::error!("metrics server error: {}", e);
            }
        }
        _ = shutdown_signal() => {
            tracing::info!("shutdown signal received");
        }
    }

    sweeper.abort();
    tracing::info!("nameid-provider stopped");
    Ok(())
}

/// Sign the challenge of a login page and print the result as JSON.
async fn sign(args: cli::SignArgs) -> Result<()> {
    let backend = connect(&args.rpc)?;
    let challenge = Challenge::new(args.uri, args.nonce);

    let signed = sign_challenge(&backend, &challenge, &args.name)
        .await
        .with_context(|| format!("failed to sign challenge for '{}'", args.name))?;

    println!("{}", serde_json::to_string_pretty(&signed)?);
    Ok(())
}

/// Print the data of a name as JSON.
async fn lookup(args: cli::LookupArgs) -> Result<()> {
    let backend = connect(&args.rpc)?;
    let data = backend
        .get_id_data(&args.name)
        .await
        .with_context(|| format!("failed to look up '{}'", args.name))?;

    let signable = backend
        .is_legacy_address(&serde_json::Value::from(data.address.as_str()))
        .await?;

    let out = serde_json::json!({
        "name": data.name,
        "address": data.address,
        "value": data.json_value(),
        "raw_value": data.value,
        "signable": signable,
    });
    println!("{}", serde_json::to_string_pretty(&out)?);
    Ok(())
}

fn print_version() {
    println!("nameid-provider {}", env!("CARGO_PKG_VERSION"));
    println!("protocol        {}", PROTOCOL_VERSION);
}

/// Waits for SIGINT (Ctrl+C) or SIGTERM, whichever comes first.
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
}
