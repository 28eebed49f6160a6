//! Notification dispatch to a twin's paired phone.

use crate::push::{PushError, PushProvider};
use crate::{Result, TwinError};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{info, warn};
use twinrelay_types::{PushMessage, PushPriority, PushTicket, Twin};

/// Fixed text of the notification sent to a twin's phone.
#[derive(Debug, Clone)]
pub struct NotificationTemplate {
    pub title: String,
    pub body: String,
}

impl Default for NotificationTemplate {
    fn default() -> Self {
        Self {
            title: "Notification Title".to_string(),
            body: "This is a test notification".to_string(),
        }
    }
}

/// Resolves push tokens and forwards notifications to a [`PushProvider`].
pub struct NotificationDispatcher {
    provider: Arc<dyn PushProvider>,
    template: NotificationTemplate,
}

impl NotificationDispatcher {
    pub fn new(provider: Arc<dyn PushProvider>, template: NotificationTemplate) -> Self {
        Self { provider, template }
    }

    /// Build the envelope for `twin`, or `TokenMissing` if it has no token.
    pub fn envelope(&self, twin: &Twin) -> Result<PushMessage> {
        let token = twin
            .push_token()
            .ok_or_else(|| TwinError::TokenMissing(twin.id.clone()))?;

        Ok(PushMessage {
            to: vec![token.to_string()],
            title: self.template.title.clone(),
            body: self.template.body.clone(),
            data: BTreeMap::from([("UserID".to_string(), twin.id.clone())]),
            sound: Some("default".to_string()),
            priority: PushPriority::Default,
        })
    }

    /// Send a notification to the phone paired with `twin`.
    ///
    /// A failed per-recipient ticket is logged and still returned as a
    /// successful dispatch.
    pub async fn notify(&self, twin: &Twin) -> Result<PushTicket> {
        let message = self.envelope(twin)?;

        let tickets = self.provider.publish(&message).await?;
        let ticket = tickets.into_iter().next().ok_or(PushError::NoTickets)?;

        if ticket.is_ok() {
            info!(target: "twinrelay::push", "Sent notification to twin {}", twin.id);
        } else {
            warn!(
                target: "twinrelay::push",
                "Delivery to {:?} failed: {} {}",
                message.to,
                ticket.message.as_deref().unwrap_or("no message"),
                ticket.details.as_ref().map(|d| d.to_string()).unwrap_or_default()
            );
        }

        Ok(ticket)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::Mutex;
    use twinrelay_types::TicketStatus;

    #[derive(Default)]
    struct RecordingProvider {
        sent: Mutex<Vec<PushMessage>>,
        fail: bool,
        status: Option<TicketStatus>,
    }

    #[async_trait]
    impl PushProvider for RecordingProvider {
        async fn publish(&self, message: &PushMessage) -> std::result::Result<Vec<PushTicket>, PushError> {
            self.sent.lock().unwrap().push(message.clone());
            if self.fail {
                return Err(PushError::Status {
                    status: 500,
                    body: "boom".into(),
                });
            }
            Ok(vec![PushTicket {
                status: self.status.unwrap_or(TicketStatus::Ok),
                id: Some("ticket-1".into()),
                message: None,
                details: None,
            }])
        }
    }

    fn dispatcher(provider: Arc<RecordingProvider>) -> NotificationDispatcher {
        NotificationDispatcher::new(provider, NotificationTemplate::default())
    }

    #[tokio::test]
    async fn test_missing_token_never_calls_provider() {
        let provider = Arc::new(RecordingProvider::default());
        let dispatcher = dispatcher(provider.clone());

        let mut twin = Twin::default();
        twin.push_token = " ".into();

        let err = dispatcher.notify(&twin).await.unwrap_err();
        assert!(matches!(err, TwinError::TokenMissing(id) if id == "123"));
        assert!(provider.sent.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_envelope_contents() {
        let provider = Arc::new(RecordingProvider::default());
        let dispatcher = dispatcher(provider.clone());

        let ticket = dispatcher.notify(&Twin::default()).await.unwrap();
        assert!(ticket.is_ok());

        let sent = provider.sent.lock().unwrap();
        assert_eq!(sent.len(), 1);
        let msg = &sent[0];
        assert_eq!(msg.to, vec!["ExponentPushToken[hYboGjMd_zeSNnRdMJMjtE]".to_string()]);
        assert_eq!(msg.title, "Notification Title");
        assert_eq!(msg.body, "This is a test notification");
        assert_eq!(msg.data.get("UserID").map(String::as_str), Some("123"));
        assert_eq!(msg.sound.as_deref(), Some("default"));
        assert_eq!(msg.priority, PushPriority::Default);
    }

    #[tokio::test]
    async fn test_provider_failure_is_dispatch_error() {
        let provider = Arc::new(RecordingProvider {
            fail: true,
            ..Default::default()
        });
        let err = dispatcher(provider).notify(&Twin::default()).await.unwrap_err();
        assert!(matches!(err, TwinError::DispatchError(PushError::Status { status: 500, .. })));
    }

    #[tokio::test]
    async fn test_failed_ticket_still_succeeds() {
        let provider = Arc::new(RecordingProvider {
            status: Some(TicketStatus::Error),
            ..Default::default()
        });
        let ticket = dispatcher(provider).notify(&Twin::default()).await.unwrap();
        assert_eq!(ticket.status, TicketStatus::Error);
    }
}
