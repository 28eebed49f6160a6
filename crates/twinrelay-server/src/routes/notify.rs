//! Push notification route.

use super::{required, TwinQuery};
use crate::error::ApiError;
use crate::state::AppState;
use axum::{
    extract::{Query, State},
    Json,
};
use std::sync::Arc;
use tracing::info;
use twinrelay_types::Twin;

/// Notify the phone paired with a twin: `GET /send?id=`.
///
/// Responds with the twin even when the provider reports a failed ticket.
pub async fn send(
    State(state): State<Arc<AppState>>,
    Query(query): Query<TwinQuery>,
) -> Result<Json<Twin>, ApiError> {
    let id = required(query.id, "id")?;
    let twin = state.registry.find_by_id(&id).await?;

    let ticket = state.dispatcher.notify(&twin).await?;
    info!(
        target: "twinrelay::api",
        "Notification for twin {} accepted ({:?})",
        twin.id,
        ticket.status
    );

    Ok(Json(twin))
}
