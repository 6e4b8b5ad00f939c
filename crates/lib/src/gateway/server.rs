//! Gateway HTTP server: Messenger callback routes and a health probe.

use crate::channels::{MessengerClient, OutboundSender};
use crate::config::{self, Config};
use crate::conversation::{self, Templates};
use crate::webhook::{self, SIGNATURE_HEADER};
use anyhow::{Context, Result};
use axum::{
    body::Bytes,
    extract::{Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;

const REJECTED_HANDSHAKE_BODY: &str = "Wrong verification token";

/// Shared, read-only state for request handlers.
#[derive(Clone)]
pub struct GatewayState {
    pub config: Arc<Config>,
    /// When None every callback POST is rejected.
    pub app_secret: Option<String>,
    pub verify_token: String,
    pub templates: Arc<Templates>,
    pub sender: Arc<dyn OutboundSender>,
}

impl GatewayState {
    /// Resolve secrets from config/env and wrap `sender`.
    pub fn new(config: Config, sender: Arc<dyn OutboundSender>) -> Self {
        let app_secret = config::resolve_app_secret(&config);
        let verify_token = config::resolve_verify_token(&config);
        let templates = Arc::new(config.templates.clone());
        Self {
            config: Arc::new(config),
            app_secret,
            verify_token,
            templates,
            sender,
        }
    }
}

/// Query parameters of the subscription handshake. All three are required.
#[derive(Debug, Deserialize)]
struct HubQuery {
    #[serde(rename = "hub.mode")]
    mode: String,
    #[serde(rename = "hub.verify_token")]
    verify_token: String,
    #[serde(rename = "hub.challenge")]
    challenge: String,
}

/// Routes: `GET /` health, `GET /callback` handshake, `POST /callback` events.
pub fn router(state: GatewayState) -> Router {
    Router::new()
        .route("/", get(health_http))
        .route("/callback", get(verify_subscription).post(receive_callback))
        .with_state(state)
}

/// Run the gateway until SIGINT/SIGTERM.
pub async fn run_gateway(config: Config) -> Result<()> {
    let sender = MessengerClient::new(
        config.messenger.graph_api_base.clone(),
        config::resolve_page_access_token(&config),
    );
    if config::resolve_page_access_token(&config).is_none() {
        log::warn!("no page access token configured; replies will fail to send");
    }
    log::debug!("messenger send api at {}", sender.api_base());

    let bind_addr = format!("{}:{}", config.gateway.bind.trim(), config.gateway.port);
    let state = GatewayState::new(config, Arc::new(sender));
    if state.app_secret.is_none() {
        log::warn!("no app secret configured; every callback will be rejected with 403");
    }

    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("binding to {}", bind_addr))?;
    log::info!("gateway listening on {}", bind_addr);

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("gateway server exited")?;
    log::info!("gateway stopped");
    Ok(())
}

/// Future that completes when the process should shut down (SIGINT or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            log::error!("failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut s) => {
                s.recv().await;
            }
            Err(e) => {
                log::error!("failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    log::info!("shutdown signal received, draining connections");
}

/// GET /callback — subscription handshake; echoes hub.challenge when the token matches.
async fn verify_subscription(
    State(state): State<GatewayState>,
    Query(query): Query<HubQuery>,
) -> Response {
    match webhook::handshake(
        &query.mode,
        &query.verify_token,
        &query.challenge,
        &state.verify_token,
    ) {
        Ok(challenge) => {
            log::info!("webhook subscription verified");
            (StatusCode::OK, challenge).into_response()
        }
        Err(e) => {
            log::warn!("webhook subscription rejected: {}", e);
            (StatusCode::FORBIDDEN, REJECTED_HANDSHAKE_BODY).into_response()
        }
    }
}

/// POST /callback — verify X-Hub-Signature, then classify and answer every event.
/// Always 200 once the signature checks out; later failures are only logged.
async fn receive_callback(
    State(state): State<GatewayState>,
    headers: HeaderMap,
    body: Bytes,
) -> StatusCode {
    let signature = headers
        .get(SIGNATURE_HEADER)
        .and_then(|v| v.to_str().ok());
    log::debug!(
        "received messenger callback - payload: {} | signature: {}",
        String::from_utf8_lossy(&body),
        signature.unwrap_or("-")
    );

    let verified = match (signature, state.app_secret.as_deref()) {
        (None, _) => Err(webhook::VerificationFailed::MissingHeader),
        (_, None) => Err(webhook::VerificationFailed::MissingSecret),
        (Some(sig), Some(secret)) => webhook::verify(&body, sig, secret),
    };
    if let Err(e) = verified {
        log::warn!("processing of callback payload failed: {}", e);
        return StatusCode::FORBIDDEN;
    }

    let payload: serde_json::Value = match serde_json::from_slice(&body) {
        Ok(v) => v,
        Err(e) => {
            log::warn!("verified callback is not valid JSON: {}", e);
            return StatusCode::OK;
        }
    };
    let outcome =
        conversation::process_callback(&payload, &state.templates, state.sender.as_ref()).await;
    log::info!(
        "processed callback payload: {} event(s), {} message(s) sent, {} failed",
        outcome.events,
        outcome.sent,
        outcome.failed
    );
    StatusCode::OK
}

/// GET / returns a simple health JSON (for probes).
async fn health_http(State(state): State<GatewayState>) -> Json<serde_json::Value> {
    Json(json!({
        "runtime": "running",
        "port": state.config.gateway.port,
    }))
}
