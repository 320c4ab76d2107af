//! Gateway HTTP server: LINE webhook ingress, health, graceful shutdown.
//!
//! The webhook handler only authenticates, parses, and enqueues; the
//! processor task runs the pipeline and delivers replies, one task per
//! inbound event.

use crate::channels::{
    verify_signature, ChannelHandle, ChannelRegistry, InboundMessage, LineChannel, WebhookEnvelope,
};
use crate::config::{self, Config};
use crate::pipeline::{MessagePipeline, PipelineOutcome};
use crate::translate::GoogleTranslator;
use anyhow::{Context, Result};
use axum::{
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode},
    routing::{get, post},
    Json, Router,
};
use serde_json::json;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// Shared state for HTTP handlers.
#[derive(Clone)]
pub struct GatewayState {
    pub config: Arc<Config>,
    /// When Some, webhook POSTs must carry a valid X-Line-Signature.
    pub channel_secret: Option<String>,
    /// Sender for inbound webhook messages. Processor task receives.
    pub inbound_tx: mpsc::Sender<InboundMessage>,
}

/// Build the gateway router. Public so tests can serve it with a substituted
/// pipeline and channel registry.
pub fn build_router(state: GatewayState) -> Router {
    Router::new()
        .route("/", get(health_http))
        .route("/line/webhook", post(line_webhook))
        .with_state(state)
}

/// Spawn the inbound processor: one task per message, pipeline then reply
/// delivery via the registry. Ends when the sender side is dropped.
pub fn spawn_processor(
    pipeline: Arc<MessagePipeline>,
    registry: Arc<ChannelRegistry>,
    mut inbound_rx: mpsc::Receiver<InboundMessage>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(msg) = inbound_rx.recv().await {
            let pipeline = pipeline.clone();
            let registry = registry.clone();
            tokio::spawn(async move {
                process_inbound_message(pipeline, registry, msg).await;
            });
        }
        log::debug!("inbound channel closed, processor stopping");
    })
}

async fn process_inbound_message(
    pipeline: Arc<MessagePipeline>,
    registry: Arc<ChannelRegistry>,
    msg: InboundMessage,
) {
    let outcome = pipeline.handle_message(&msg).await;
    let text = match outcome {
        PipelineOutcome::NoReply => return,
        PipelineOutcome::Reply(text) => text,
        PipelineOutcome::ReplyWithFailureNotice(text) => text,
    };
    let Some(handle) = registry.get(&msg.channel_id).await else {
        log::warn!("no channel registered for '{}', dropping reply", msg.channel_id);
        return;
    };
    // Best-effort delivery; reply tokens are single-use so there is no retry.
    if let Err(e) = handle.reply(&msg.reply_token, &text).await {
        log::warn!("reply delivery on '{}' failed: {}", msg.channel_id, e);
    }
}

/// Run the gateway until SIGINT/SIGTERM. Fails fast on incomplete
/// configuration before binding the listener.
pub async fn run_gateway(config: Config) -> Result<()> {
    config::validate_for_serving(&config)?;

    let api_key = config::resolve_translator_api_key(&config)
        .context("translator API key not configured")?;
    let translator = GoogleTranslator::new(
        api_key,
        config.translator.base_url.clone(),
        config.translator.timeout(),
    )
    .context("building translator client")?;
    let pipeline = Arc::new(MessagePipeline::new(
        Arc::new(translator),
        config.translator.pair.clone(),
        config.translator.on_translate_failure,
        config.translator.failure_notice.clone(),
    ));

    let registry = Arc::new(ChannelRegistry::new());
    let line = Arc::new(LineChannel::new(config::resolve_channel_access_token(
        &config,
    )));
    registry.register(line.id().to_string(), line.clone()).await;

    let (inbound_tx, inbound_rx) = mpsc::channel::<InboundMessage>(64);
    let processor = spawn_processor(pipeline, registry.clone(), inbound_rx);

    let port = config::resolve_port(&config);
    let bind = config.gateway.bind.clone();
    let state = GatewayState {
        channel_secret: config::resolve_channel_secret(&config),
        config: Arc::new(config),
        inbound_tx,
    };
    let app = build_router(state);

    let bind_addr = format!("{}:{}", bind, port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("binding to {}", bind_addr))?;
    log::info!("gateway listening on {}", bind_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(registry))
        .await
        .context("gateway server exited")?;
    processor.abort();
    log::info!("gateway stopped");
    Ok(())
}

/// Future that completes when the process should shut down (SIGINT or
/// SIGTERM). Stops channel connectors first.
async fn shutdown_signal(registry: Arc<ChannelRegistry>) {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    log::info!("shutdown signal received");

    for id in registry.ids().await {
        if let Some(handle) = registry.get(&id).await {
            handle.stop();
        }
    }
}

/// POST /line/webhook — verifies the signature when a secret is configured,
/// parses the event envelope, and enqueues text messages.
async fn line_webhook(
    State(state): State<GatewayState>,
    headers: HeaderMap,
    body: Bytes,
) -> StatusCode {
    if let Some(ref secret) = state.channel_secret {
        let signature = headers
            .get("x-line-signature")
            .and_then(|v| v.to_str().ok())
            .unwrap_or("");
        if !verify_signature(secret, &body, signature) {
            log::warn!("webhook rejected: invalid signature");
            return StatusCode::FORBIDDEN;
        }
    }
    let envelope: WebhookEnvelope = match serde_json::from_slice(&body) {
        Ok(e) => e,
        Err(_) => return StatusCode::BAD_REQUEST,
    };
    for event in envelope.events {
        if event.event_type != "message" {
            continue;
        }
        let Some(reply_token) = event.reply_token else {
            continue;
        };
        let Some(message) = event.message else {
            continue;
        };
        if message.message_type != "text" {
            continue;
        }
        let Some(text) = message.text else {
            continue;
        };
        let inbound = InboundMessage {
            channel_id: "line".to_string(),
            reply_token,
            text,
        };
        if state.inbound_tx.send(inbound).await.is_err() {
            return StatusCode::SERVICE_UNAVAILABLE;
        }
    }
    StatusCode::OK
}

/// GET / returns a simple health JSON (for probes).
async fn health_http(State(state): State<GatewayState>) -> Json<serde_json::Value> {
    Json(json!({
        "runtime": "running",
        "port": state.config.gateway.port,
    }))
}
