use std::collections::BTreeMap;
use std::sync::Arc;

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use tower_http::cors::CorsLayer;

use crate::engine::UpdateEngine;
use crate::subscribers::ChannelSubscriber;

pub const WAITING_MESSAGE: &str = "Waiting for updates...";

/// Per-connection outbound queue; a subscriber this far behind starts dropping.
const SUBSCRIBER_BUFFER: usize = 64;

#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<UpdateEngine>,
}

impl AppState {
    pub fn new(engine: Arc<UpdateEngine>) -> Self {
        Self { engine }
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(get_status))
        .route("/history", get(get_history))
        .route("/health", get(|| async { "ok" }))
        .route("/ws", get(ws_upgrade))
        .route("/test-event", get(trigger_test_event))
        .layer(CorsLayer::very_permissive())
        .with_state(state)
}

/// Every recorded update as plain text, provider by provider, newest-first.
async fn get_status(State(state): State<AppState>) -> String {
    let snapshot = state.engine.history().snapshot();
    if snapshot.is_empty() {
        tracing::debug!("status requested before any update");
        return WAITING_MESSAGE.to_string();
    }
    let all: Vec<String> = snapshot.into_values().flatten().collect();
    tracing::debug!(records = all.len(), "serving status");
    all.join("\n")
}

async fn get_history(State(state): State<AppState>) -> Json<BTreeMap<String, Vec<String>>> {
    Json(state.engine.history().snapshot())
}

#[derive(serde::Serialize)]
struct TestEventOut {
    message: &'static str,
}

async fn trigger_test_event(State(state): State<AppState>) -> Json<TestEventOut> {
    let record = state.engine.publish_test_event();
    tracing::info!(record = %record.trim_end(), "manual test event broadcast");
    Json(TestEventOut {
        message: "Test event successfully broadcasted!",
    })
}

async fn ws_upgrade(ws: WebSocketUpgrade, State(state): State<AppState>) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_ws(socket, state))
}

/// Forward pushed records until either side goes away, then deregister.
async fn handle_ws(mut socket: WebSocket, state: AppState) {
    let registry = Arc::clone(state.engine.subscribers());
    let (sink, mut outbound) = ChannelSubscriber::channel(SUBSCRIBER_BUFFER);
    let id = registry.register(Arc::new(sink));

    loop {
        tokio::select! {
            pushed = outbound.recv() => {
                match pushed {
                    Some(text) => {
                        if socket.send(Message::Text(text.into())).await.is_err() {
                            break;
                        }
                    }
                    None => break,
                }
            }
            // Inbound frames are only watched for close.
            inbound = socket.recv() => {
                match inbound {
                    Some(Ok(Message::Close(_))) | Some(Err(_)) | None => break,
                    Some(Ok(_)) => {}
                }
            }
        }
    }

    registry.disconnect(id);
}
