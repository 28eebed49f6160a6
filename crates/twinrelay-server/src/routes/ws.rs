//! WebSocket route handler.

use super::{required, TwinQuery};
use crate::error::ApiError;
use crate::state::AppState;
use crate::websocket::handle_websocket;
use axum::{
    extract::{
        ws::{rejection::WebSocketUpgradeRejection, WebSocketUpgrade},
        Query, State,
    },
    response::{IntoResponse, Response},
};
use std::sync::Arc;

/// Upgrade to the relay connection of a twin: `GET /ws?id=`.
///
/// The twin must exist before the upgrade is accepted.
pub async fn upgrade(
    State(state): State<Arc<AppState>>,
    Query(query): Query<TwinQuery>,
    ws: Result<WebSocketUpgrade, WebSocketUpgradeRejection>,
) -> Result<Response, ApiError> {
    let id = required(query.id, "id")?;
    let twin = state.registry.find_by_id(&id).await?;

    let ws = match ws {
        Ok(ws) => ws,
        Err(rejection) => {
            tracing::warn!(target: "twinrelay::ws", "Upgrade for twin {} failed: {}", twin.id, rejection);
            return Ok(rejection.into_response());
        }
    };

    Ok(ws
        .on_failed_upgrade({
            let id = twin.id.clone();
            move |e| tracing::error!(target: "twinrelay::ws", "Upgrade for twin {} failed: {}", id, e)
        })
        .on_upgrade(move |socket| handle_websocket(socket, state, twin.id)))
}
