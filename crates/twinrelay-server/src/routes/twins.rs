//! Twin registry routes.

use super::{required, TwinQuery};
use crate::error::ApiError;
use crate::state::AppState;
use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    http::StatusCode,
    Json,
};
use std::sync::Arc;
use tracing::info;
use twinrelay_types::Twin;

pub async fn list(State(state): State<Arc<AppState>>) -> Json<Vec<Twin>> {
    Json(state.registry.list_all().await)
}

pub async fn get(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Twin>, ApiError> {
    Ok(Json(state.registry.find_by_id(&id).await?))
}

pub async fn create(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<Twin>, JsonRejection>,
) -> Result<(StatusCode, Json<Twin>), ApiError> {
    let Json(twin) = payload.map_err(|e| ApiError::InvalidBody(e.body_text()))?;
    let twin = state.registry.create(twin).await?;
    info!(target: "twinrelay::api", "Registered twin {}", twin.id);
    Ok((StatusCode::CREATED, Json(twin)))
}

/// Set a content pointer: `PATCH /addcid?id=&cid=&tpe=N|H`.
pub async fn add_content(
    State(state): State<Arc<AppState>>,
    Query(query): Query<TwinQuery>,
) -> Result<Json<Twin>, ApiError> {
    let id = required(query.id, "id")?;
    let cid = required(query.cid, "cid")?;
    let tpe = required(query.tpe, "tpe")?;

    let twin = state.registry.update_content_pointer(&id, &tpe, &cid).await?;
    info!(target: "twinrelay::api", "Twin {} content pointer {} updated", id, tpe);
    Ok(Json(twin))
}

/// Set the wallet address: `PATCH /addW?id=&w=`.
pub async fn add_wallet(
    State(state): State<Arc<AppState>>,
    Query(query): Query<TwinQuery>,
) -> Result<Json<Twin>, ApiError> {
    let id = required(query.id, "id")?;
    let wallet = required(query.w, "w")?;

    Ok(Json(state.registry.update_wallet(&id, &wallet).await?))
}
