//! # Provider HTTP API
//!
//! The axum router behind `nameid-provider run`. A login takes two requests:
//! fetch a challenge, then post the signature over it.
//!
//! ## Endpoints
//!
//! | Method | Path         | Description                                   |
//! |--------|--------------|-----------------------------------------------|
//! | GET    | `/health`    | Liveness probe                                |
//! | GET    | `/status`    | Provider status summary                       |
//! | GET    | `/challenge` | Issue a nonce; `?name=` adds the message      |
//! | POST   | `/login`     | Verify `{name, nonce, signature}`             |
//! | GET    | `/id/:name`  | Identity URL, owner and value of a name       |

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::{Method, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use nameid_protocol::challenge::identity_url;
use nameid_protocol::{AuthError, LoginRequest, LoginVerifier, NameError};

use crate::metrics::SharedMetrics;

// ---------------------------------------------------------------------------
// Application State
// ---------------------------------------------------------------------------

/// Shared state for all handlers. Cheap to clone.
#[derive(Clone)]
pub struct AppState {
    /// Reported by `/status`.
    pub version: String,
    pub verifier: Arc<LoginVerifier>,
    pub metrics: SharedMetrics,
}

/// Build the router with CORS and request tracing.
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health_handler))
        .route("/status", get(status_handler))
        .route("/challenge", get(challenge_handler))
        .route("/login", post(login_handler))
        .route("/id/:name", get(identity_handler))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

// ---------------------------------------------------------------------------
// Request / Response Types
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize, Deserialize)]
pub struct StatusResponse {
    pub version: String,
    pub namespace: String,
    pub uri: String,
    /// Nonces issued but not yet used or purged.
    pub outstanding_nonces: usize,
    pub timestamp: String,
}

#[derive(Debug, Deserialize)]
pub struct ChallengeQuery {
    pub name: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ChallengeResponse {
    pub uri: String,
    pub nonce: String,
    /// Message to sign, present when a name was given.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub identity: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LoginResponse {
    pub authenticated: bool,
    pub name: String,
    pub identity: String,
    pub signer: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct IdentityResponse {
    pub name: String,
    pub identity: String,
    pub address: String,
    /// The name's value as JSON, `null` if it is not valid JSON.
    pub value: Option<serde_json::Value>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

fn error_response(status: StatusCode, message: impl Into<String>) -> Response {
    (
        status,
        Json(ErrorResponse {
            error: message.into(),
        }),
    )
        .into_response()
}

/// HTTP status and metric label for a refused login.
fn classify(err: &AuthError) -> (StatusCode, &'static str) {
    match err {
        AuthError::EmptyName => (StatusCode::BAD_REQUEST, "empty_name"),
        AuthError::Nonce(_) => (StatusCode::UNAUTHORIZED, "bad_nonce"),
        AuthError::UnknownName(_) => (StatusCode::NOT_FOUND, "unknown_name"),
        AuthError::InvalidSignature => (StatusCode::UNAUTHORIZED, "invalid_signature"),
        AuthError::Lookup(_) | AuthError::Backend(_) => (StatusCode::BAD_GATEWAY, "backend"),
    }
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// `GET /health`: 200 while the process is up. Does not touch namecoind.
async fn health_handler() -> impl IntoResponse {
    (StatusCode::OK, Json(serde_json::json!({ "status": "ok" })))
}

/// `GET /status`
async fn status_handler(State(state): State<AppState>) -> impl IntoResponse {
    let verifier = &state.verifier;
    Json(StatusResponse {
        version: state.version.clone(),
        namespace: verifier.backend().namespace().to_string(),
        uri: verifier.uri().to_string(),
        outstanding_nonces: verifier.nonces().len(),
        timestamp: chrono::Utc::now().to_rfc3339(),
    })
}

/// `GET /challenge`: start a login. Replaces the login page's hidden
/// `uri`/`nonce` fields; with `?name=` it also returns the exact message the
/// page script would show for signing.
async fn challenge_handler(
    State(state): State<AppState>,
    Query(query): Query<ChallengeQuery>,
) -> Response {
    let challenge = match state.verifier.issue_challenge() {
        Ok(challenge) => challenge,
        Err(e) => return error_response(StatusCode::SERVICE_UNAVAILABLE, e.to_string()),
    };
    state.metrics.challenges_issued_total.inc();

    let name = query.name.filter(|n| !n.is_empty());
    Json(ChallengeResponse {
        message: name.as_deref().map(|n| challenge.message_for(n)),
        identity: name.as_deref().map(|n| challenge.identity_for(n)),
        uri: challenge.uri,
        nonce: challenge.nonce,
    })
    .into_response()
}

/// `POST /login`: verify a signed challenge.
async fn login_handler(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Response {
    let timer = state.metrics.login_latency_seconds.start_timer();
    let result = state.verifier.verify(&req).await;
    timer.observe_duration();

    match result {
        Ok(outcome) => {
            state.metrics.logins_succeeded_total.inc();
            (
                StatusCode::OK,
                Json(LoginResponse {
                    authenticated: true,
                    name: outcome.name,
                    identity: outcome.identity,
                    signer: outcome.signer,
                }),
            )
                .into_response()
        }
        Err(err) => {
            let (status, reason) = classify(&err);
            state.metrics.logins_failed_total.with_label_values(&[reason]).inc();
            if status == StatusCode::BAD_GATEWAY {
                state.metrics.rpc_failures_total.inc();
                tracing::error!(name = %req.name, error = %err, "login failed on namecoind");
            } else {
                tracing::info!(name = %req.name, %reason, "login refused");
            }
            error_response(status, err.to_string())
        }
    }
}

/// `GET /id/:name`: the data behind an identity URL.
async fn identity_handler(Path(name): Path<String>, State(state): State<AppState>) -> Response {
    let verifier = &state.verifier;
    match verifier.backend().get_id_data(&name).await {
        Ok(data) => Json(IdentityResponse {
            identity: identity_url(verifier.uri(), &name),
            value: data.json_value(),
            address: data.address,
            name,
        })
        .into_response(),
        Err(NameError::NotFound(_)) => {
            error_response(StatusCode::NOT_FOUND, format!("name not found: '{}'", name))
        }
        Err(e) => {
            state.metrics.rpc_failures_total.inc();
            tracing::error!(%name, error = %e, "identity lookup failed");
            error_response(StatusCode::BAD_GATEWAY, e.to_string())
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
