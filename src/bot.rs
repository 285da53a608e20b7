use std::sync::Arc;

use anyhow::{Context, Result};
use axum::body::Bytes;
use axum::extract::State;
use axum::http::HeaderMap;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{json, Value};
use tracing::{debug, info, warn};

use crate::pipeline::MessagePipeline;
use crate::platform::telegram::TelegramUpdate;

const SECRET_TOKEN_HEADER: &str = "X-Telegram-Bot-Api-Secret-Token";

/// Shared application state
pub struct AppState {
    pipeline: Arc<MessagePipeline>,
    webhook_secret: Option<String>,
}

impl AppState {
    pub fn new(pipeline: MessagePipeline, webhook_secret: Option<String>) -> Self {
        Self {
            pipeline: Arc::new(pipeline),
            webhook_secret,
        }
    }
}

fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(health))
        .route("/test", get(test_endpoint))
        .route("/api/webhook", post(webhook))
        .with_state(state)
}

/// Serve the webhook until the process is stopped
pub async fn run(state: Arc<AppState>, bind_address: &str) -> Result<()> {
    let listener = tokio::net::TcpListener::bind(bind_address)
        .await
        .with_context(|| format!("Failed to bind {}", bind_address))?;

    info!("Webhook server listening on {}", bind_address);

    axum::serve(listener, build_router(state))
        .await
        .context("Webhook server stopped unexpectedly")?;

    Ok(())
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "healthy", "service": "telegram-bot" }))
}

async fn test_endpoint() -> Json<Value> {
    Json(json!({ "message": "Bot is working!" }))
}

/// Always acknowledges; valid messages are processed in a detached task.
async fn webhook(State(state): State<Arc<AppState>>, headers: HeaderMap, body: Bytes) -> Json<Value> {
    let ack = Json(json!({ "ok": true }));

    if let Some(expected) = &state.webhook_secret {
        let provided = headers
            .get(SECRET_TOKEN_HEADER)
            .and_then(|v| v.to_str().ok());
        if provided != Some(expected.as_str()) {
            warn!("Webhook call with missing or wrong secret token, ignoring");
            return ack;
        }
    }

    let update: TelegramUpdate = match serde_json::from_slice(&body) {
        Ok(u) => u,
        Err(e) => {
            warn!("Malformed webhook payload: {}", e);
            return ack;
        }
    };

    let update_id = update.update_id;
    let Some(message) = update.into_incoming() else {
        debug!("Update {} carries no chat message, ignoring", update_id);
        return ack;
    };

    let pipeline = state.pipeline.clone();
    tokio::spawn(async move {
        let outcome = pipeline.process(message).await;
        debug!("Update {} finished: {:?}", update_id, outcome);
    });

    ack
}
