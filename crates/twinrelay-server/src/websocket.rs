//! Relay connection glue between axum WebSockets and the relay hub.

use crate::state::AppState;
use axum::extract::ws::{Message, WebSocket};
use futures::{future, SinkExt, StreamExt};
use std::sync::Arc;
use tracing::info;
use twinrelay_core::{read_loop, write_loop, Inbound, RelayLink};
use twinrelay_types::{FrameKind, RelayFrame};

/// Bind `socket` to `twin_id` and serve it until either side closes.
pub async fn handle_websocket(socket: WebSocket, state: Arc<AppState>, twin_id: String) {
    let RelayLink {
        connection_id,
        commands,
        cancel,
        ..
    } = state.relay.attach(&twin_id);
    info!(target: "twinrelay::ws", "Phone for twin {} connected (#{})", twin_id, connection_id);

    let (ws_tx, ws_rx) = socket.split();

    let sink = Box::pin(
        ws_tx.with(|frame: RelayFrame| future::ready(Ok::<_, axum::Error>(to_message(frame)))),
    );
    let writer = tokio::spawn(write_loop(commands, sink, cancel.clone()));

    let inbound = ws_rx.map(|msg| msg.map(from_message));
    read_loop(&state.relay, &twin_id, connection_id, inbound, cancel.clone()).await;

    cancel.cancel();
    let _ = writer.await;
    info!(target: "twinrelay::ws", "Phone for twin {} disconnected (#{})", twin_id, connection_id);
}

fn to_message(frame: RelayFrame) -> Message {
    match frame.kind {
        FrameKind::Text => Message::Text(String::from_utf8_lossy(&frame.payload).into_owned().into()),
        FrameKind::Binary => Message::Binary(frame.payload.into()),
    }
}

fn from_message(msg: Message) -> Inbound {
    match msg {
        Message::Text(text) => Inbound::Frame(RelayFrame::text(text.as_str())),
        Message::Binary(bytes) => Inbound::Frame(RelayFrame::binary(bytes.to_vec())),
        Message::Ping(_) | Message::Pong(_) => Inbound::Control,
        Message::Close(_) => Inbound::Close,
    }
}
