//! # Prometheus Metrics
//!
//! Login and challenge counters, scraped at `/metrics` on the metrics port.
//! Everything is registered in a dedicated registry prefixed `nameid_`.

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use prometheus::{Encoder, Histogram, HistogramOpts, IntCounter, IntCounterVec, Opts, Registry, TextEncoder};

/// Metric handles shared by the request handlers.
#[derive(Clone)]
pub struct ProviderMetrics {
    registry: Registry,
    /// Challenges (nonces) handed out.
    pub challenges_issued_total: IntCounter,
    /// Logins that verified.
    pub logins_succeeded_total: IntCounter,
    /// Logins refused, labelled by reason.
    pub logins_failed_total: IntCounterVec,
    /// Requests that failed because namecoind could not be used.
    pub rpc_failures_total: IntCounter,
    /// Time spent verifying a login, including RPC round trips.
    pub login_latency_seconds: Histogram,
}

impl ProviderMetrics {
    /// Create and register all metrics.
    pub fn new() -> prometheus::Result<Self> {
        let registry = Registry::new_custom(Some("nameid".into()), None)?;

        let challenges_issued_total =
            IntCounter::new("challenges_issued_total", "Login challenges issued")?;
        registry.register(Box::new(challenges_issued_total.clone()))?;

        let logins_succeeded_total =
            IntCounter::new("logins_succeeded_total", "Logins with a valid signature")?;
        registry.register(Box::new(logins_succeeded_total.clone()))?;

        let logins_failed_total = IntCounterVec::new(
            Opts::new("logins_failed_total", "Rejected logins by reason"),
            &["reason"],
        )?;
        registry.register(Box::new(logins_failed_total.clone()))?;

        let rpc_failures_total = IntCounter::new(
            "rpc_failures_total",
            "Requests failed because namecoind was unavailable or misbehaved",
        )?;
        registry.register(Box::new(rpc_failures_total.clone()))?;

        let login_latency_seconds = Histogram::with_opts(
            HistogramOpts::new("login_latency_seconds", "Login verification latency in seconds")
                .buckets(vec![0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0]),
        )?;
        registry.register(Box::new(login_latency_seconds.clone()))?;

        Ok(Self {
            registry,
            challenges_issued_total,
            logins_succeeded_total,
            logins_failed_total,
            rpc_failures_total,
            login_latency_seconds,
        })
    }

    /// Render all metrics in the Prometheus text format.
    pub fn encode(&self) -> anyhow::Result<String> {
        let mut buffer = Vec::new();
        TextEncoder::new().encode(&self.registry.gather(), &mut buffer)?;
        Ok(String::from_utf8(buffer)?)
    }
}

pub type SharedMetrics = Arc<ProviderMetrics>;

/// `GET /metrics`
pub async fn metrics_handler(State(metrics): State<SharedMetrics>) -> impl IntoResponse {
    match metrics.encode() {
        Ok(body) => (
            StatusCode::OK,
            [("content-type", "text/plain; version=0.0.4; charset=utf-8")],
            body,
        )
            .into_response(),
        Err(e) => {
            tracing::error!("failed to encode metrics: {}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, "metrics encoding failed").into_response()
        }
    }
}
