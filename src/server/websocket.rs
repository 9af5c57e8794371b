//! Live update socket
//!
//! On connect the client receives `{"type":"initial","count":N}`; after every
//! ingestion cycle it receives `{"type":"update","message":"..."}`. Anything
//! the client sends is ignored.

use crate::pipeline::context::AppContext;
use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::Response,
};
use futures::{SinkExt, StreamExt};
use std::sync::Arc;
use tokio::sync::mpsc;

/// `GET /ws`
pub async fn live_updates(ws: WebSocketUpgrade, State(ctx): State<Arc<AppContext>>) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, ctx))
}

async fn handle_socket(socket: WebSocket, ctx: Arc<AppContext>) {
    let (mut sink, mut stream) = socket.split();
    let (tx, mut rx) = mpsc::unbounded_channel();

    let id = match ctx.notifier.register(tx).await {
        Ok(id) => id,
        Err(e) => {
            log::error!("❌ Failed to build initial snapshot: {}", e);
            let _ = sink.close().await;
            return;
        }
    };

    let mut send_task = tokio::spawn(async move {
        while let Some(event) = rx.recv().await {
            if sink.send(Message::Text(event.to_json())).await.is_err() {
                break;
            }
        }
    });

    let mut recv_task = tokio::spawn(async move {
        while let Some(message) = stream.next().await {
            match message {
                Ok(Message::Close(_)) | Err(_) => break,
                Ok(_) => {}
            }
        }
    });

    tokio::select! {
        _ = &mut send_task => recv_task.abort(),
        _ = &mut recv_task => send_task.abort(),
    }

    ctx.notifier.unregister(id);
}
