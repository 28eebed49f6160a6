//! Relay reply route.

use super::{required, TwinQuery};
use crate::error::ApiError;
use crate::state::AppState;
use axum::{
    extract::{Query, State},
    Json,
};
use std::sync::Arc;
use twinrelay_types::Twin;

/// Send the last frame received from a twin's phone back to it: `GET /did?id=`.
pub async fn reply(
    State(state): State<Arc<AppState>>,
    Query(query): Query<TwinQuery>,
) -> Result<Json<Twin>, ApiError> {
    let id = required(query.id, "id")?;
    let twin = state.registry.find_by_id(&id).await?;

    state.relay.relay_last_message(&twin.id).await?;
    Ok(Json(twin))
}
