//! Mapping of relay errors onto HTTP responses.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use tracing::{debug, warn};
use twinrelay_core::{PushError, TwinError};

/// Error returned by route handlers.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Twin(#[from] TwinError),

    #[error("missing query parameter {0}")]
    MissingQuery(&'static str),

    #[error("invalid request body: {0}")]
    InvalidBody(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::MissingQuery(_) | ApiError::InvalidBody(_) => StatusCode::BAD_REQUEST,
            ApiError::Twin(err) => match err {
                TwinError::NotFound(_) | TwinError::TokenMissing(_) | TwinError::NotConnected(_) => {
                    StatusCode::NOT_FOUND
                }
                TwinError::EmptyId | TwinError::InvalidSlot(_) => StatusCode::BAD_REQUEST,
                TwinError::DuplicateId(_) | TwinError::NothingToRelay(_) => StatusCode::CONFLICT,
                TwinError::DispatchError(PushError::InvalidToken(_)) => {
                    StatusCode::UNPROCESSABLE_ENTITY
                }
                TwinError::WriteError(_) | TwinError::DispatchError(_) => StatusCode::BAD_GATEWAY,
            },
        }
    }

    /// Message shown to clients.
    pub fn message(&self) -> String {
        match self {
            ApiError::MissingQuery("w") => "Missing w(wallet) query parameter".to_string(),
            ApiError::MissingQuery(name) => format!("Missing {} query parameter", name),
            ApiError::InvalidBody(reason) => format!("Invalid twin: {}", reason),
            ApiError::Twin(err) => match err {
                TwinError::NotFound(_) => "Twin not found".to_string(),
                TwinError::EmptyId => "Twin id must not be empty".to_string(),
                TwinError::InvalidSlot(_) => "Missing the correct tpe, N or H".to_string(),
                TwinError::DuplicateId(_) => "Twin already exists".to_string(),
                TwinError::TokenMissing(_) => "Phone not found".to_string(),
                TwinError::NotConnected(_) => "Phone not connected".to_string(),
                TwinError::NothingToRelay(_) => "No message to relay".to_string(),
                TwinError::WriteError(_) => "Failed to relay message".to_string(),
                TwinError::DispatchError(PushError::InvalidToken(_)) => {
                    "Invalid push token".to_string()
                }
                TwinError::DispatchError(_) => "Failed to send notification".to_string(),
            },
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() || status == StatusCode::UNPROCESSABLE_ENTITY {
            warn!(target: "twinrelay::api", "{}", self);
        } else {
            debug!(target: "twinrelay::api", "{}", self);
        }
        (status, Json(json!({ "message": self.message() }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        let cases = [
            (TwinError::NotFound("x".into()), StatusCode::NOT_FOUND, "Twin not found"),
            (TwinError::TokenMissing("x".into()), StatusCode::NOT_FOUND, "Phone not found"),
            (TwinError::EmptyId, StatusCode::BAD_REQUEST, "Twin id must not be empty"),
            (TwinError::InvalidSlot("Z".into()), StatusCode::BAD_REQUEST, "Missing the correct tpe, N or H"),
            (TwinError::DuplicateId("x".into()), StatusCode::CONFLICT, "Twin already exists"),
            (TwinError::NothingToRelay("x".into()), StatusCode::CONFLICT, "No message to relay"),
            (TwinError::WriteError("eof".into()), StatusCode::BAD_GATEWAY, "Failed to relay message"),
            (
                TwinError::DispatchError(PushError::InvalidToken("t".into())),
                StatusCode::UNPROCESSABLE_ENTITY,
                "Invalid push token",
            ),
            (
                TwinError::DispatchError(PushError::NoTickets),
                StatusCode::BAD_GATEWAY,
                "Failed to send notification",
            ),
        ];

        for (err, status, message) in cases {
            let api = ApiError::from(err);
            assert_eq!(api.status(), status);
            assert_eq!(api.message(), message);
        }
    }

    #[test]
    fn test_missing_query_messages() {
        assert_eq!(ApiError::MissingQuery("id").message(), "Missing id query parameter");
        assert_eq!(ApiError::MissingQuery("w").message(), "Missing w(wallet) query parameter");
        assert_eq!(ApiError::MissingQuery("tpe").status(), StatusCode::BAD_REQUEST);
    }
}
