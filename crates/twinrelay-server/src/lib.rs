//! Twin relay server library - HTTP/WebSocket routes, state and configuration.
//!
//! Kept apart from main.rs so integration tests can drive the router directly.

pub mod config;
pub mod error;
pub mod logging;
pub mod routes;
pub mod state;
pub mod websocket;
