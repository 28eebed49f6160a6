//! HTTP route handlers.

pub mod notify;
pub mod relay;
pub mod twins;
pub mod ws;

use crate::error::ApiError;
use crate::state::AppState;
use axum::{
    extract::State,
    routing::{get, patch},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

/// Query parameters shared by the twin routes.
#[derive(Debug, Default, Deserialize)]
pub struct TwinQuery {
    pub id: Option<String>,
    pub cid: Option<String>,
    pub tpe: Option<String>,
    pub w: Option<String>,
}

/// A query parameter that must be present.
pub(crate) fn required(value: Option<String>, name: &'static str) -> Result<String, ApiError> {
    value.ok_or(ApiError::MissingQuery(name))
}

/// Build the full HTTP/WebSocket router.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/twins", get(twins::list).post(twins::create))
        .route("/twins/{id}", get(twins::get))
        .route("/addcid", patch(twins::add_content))
        .route("/addW", patch(twins::add_wallet))
        .route("/send", get(notify::send))
        .route("/did", get(relay::reply))
        .route("/ws", get(ws::upgrade))
        .route("/health", get(health))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub twins: usize,
    pub connections: usize,
}

pub async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        twins: state.registry.len().await,
        connections: state.relay.connected_count(),
    })
}
