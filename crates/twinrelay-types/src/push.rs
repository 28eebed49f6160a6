//! Push notification envelope and delivery tickets (Expo push API shape).

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Delivery priority requested from the push provider.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PushPriority {
    #[default]
    Default,
    Normal,
    High,
}

/// A single push message addressed to one or more device tokens.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PushMessage {
    pub to: Vec<String>,
    pub title: String,
    pub body: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub data: BTreeMap<String, String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sound: Option<String>,
    #[serde(default)]
    pub priority: PushPriority,
}

/// Per-recipient delivery status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TicketStatus {
    Ok,
    Error,
}

/// Provider receipt for one recipient of a push message.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PushTicket {
    pub status: TicketStatus,
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub details: Option<Value>,
}

impl PushTicket {
    pub fn is_ok(&self) -> bool {
        self.status == TicketStatus::Ok
    }
}

/// Request-level error reported by the provider.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PushApiError {
    #[serde(default)]
    pub code: String,
    #[serde(default)]
    pub message: String,
}

/// Body returned by the provider's send endpoint.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct PushResponse {
    #[serde(default)]
    pub data: Vec<PushTicket>,
    #[serde(default)]
    pub errors: Vec<PushApiError>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_message_serialization() {
        let msg = PushMessage {
            to: vec!["ExponentPushToken[x]".into()],
            title: "T".into(),
            body: "B".into(),
            data: BTreeMap::from([("UserID".to_string(), "123".to_string())]),
            sound: Some("default".into()),
            priority: PushPriority::Default,
        };
        assert_eq!(
            serde_json::to_value(&msg).unwrap(),
            json!({
                "to": ["ExponentPushToken[x]"],
                "title": "T",
                "body": "B",
                "data": { "UserID": "123" },
                "sound": "default",
                "priority": "default"
            })
        );
    }

    #[test]
    fn test_response_with_error_ticket() {
        let body = r#"{"data":[{"status":"error","message":"not registered","details":{"error":"DeviceNotRegistered"}}]}"#;
        let resp: PushResponse = serde_json::from_str(body).unwrap();
        assert_eq!(resp.data.len(), 1);
        assert!(!resp.data[0].is_ok());
        assert_eq!(resp.data[0].details.as_ref().unwrap()["error"], "DeviceNotRegistered");
        assert!(resp.errors.is_empty());
    }

    #[test]
    fn test_response_with_request_errors() {
        let body = r#"{"errors":[{"code":"VALIDATION_ERROR","message":"bad"}]}"#;
        let resp: PushResponse = serde_json::from_str(body).unwrap();
        assert!(resp.data.is_empty());
        assert_eq!(resp.errors[0].code, "VALIDATION_ERROR");
    }
}
