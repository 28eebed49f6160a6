//! Relay connections between the server and paired phones.
//!
//! Each twin owns at most one live connection. A connection is driven by two
//! loops supplied by the transport glue:
//! - [`read_loop`] records inbound data frames as the connection's last message
//! - [`write_loop`] performs outbound writes and acknowledges each one
//!
//! ```text
//! socket rx --> read_loop --> RelayHub { twin id -> RelayConnection } <-- relay_last_message
//!                                         |
//!                              mpsc<RelayCommand> --> write_loop --> socket tx
//! ```

use crate::{Result, TwinError};
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use futures::{Sink, SinkExt, Stream, StreamExt};
use std::fmt::Display;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::{mpsc, oneshot};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace, warn};
use twinrelay_types::RelayFrame;

/// Outbound commands queued per connection.
const OUTBOUND_CAPACITY: usize = 32;

/// Characters of payload shown in logs.
const PREVIEW_CHARS: usize = 120;

/// Work for a connection's writer.
#[derive(Debug)]
pub enum RelayCommand {
    Send {
        frame: RelayFrame,
        ack: oneshot::Sender<std::result::Result<(), String>>,
    },
}

/// What the transport read from a socket.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Inbound {
    Frame(RelayFrame),
    /// Ping/pong and other frames that carry no relay data.
    Control,
    Close,
}

struct RelayConnection {
    id: u64,
    outbound: mpsc::Sender<RelayCommand>,
    cancel: CancellationToken,
    last_message: Option<RelayFrame>,
    connected_at: DateTime<Utc>,
}

/// The halves of a freshly attached connection, handed to the socket glue.
#[derive(Debug)]
pub struct RelayLink {
    pub connection_id: u64,
    pub commands: mpsc::Receiver<RelayCommand>,
    pub cancel: CancellationToken,
}

/// Per-twin table of live relay connections.
pub struct RelayHub {
    connections: DashMap<String, RelayConnection>,
    next_id: AtomicU64,
    shutdown: CancellationToken,
}

impl Default for RelayHub {
    fn default() -> Self {
        Self::new(CancellationToken::new())
    }
}

impl RelayHub {
    /// Create a hub whose connections all stop when `shutdown` fires.
    pub fn new(shutdown: CancellationToken) -> Self {
        Self {
            connections: DashMap::new(),
            next_id: AtomicU64::new(1),
            shutdown,
        }
    }

    /// Bind a new connection to `twin_id`, cancelling any previous one.
    pub fn attach(&self, twin_id: &str) -> RelayLink {
        let connection_id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let (outbound, commands) = mpsc::channel(OUTBOUND_CAPACITY);
        let cancel = self.shutdown.child_token();

        let previous = self.connections.insert(
            twin_id.to_string(),
            RelayConnection {
                id: connection_id,
                outbound,
                cancel: cancel.clone(),
                last_message: None,
                connected_at: Utc::now(),
            },
        );

        if let Some(old) = previous {
            info!(
                target: "twinrelay::relay",
                "Twin {} reconnected, closing connection #{} (open since {})",
                twin_id, old.id, old.connected_at
            );
            old.cancel.cancel();
        }
        info!(target: "twinrelay::relay", "Attached connection #{} to twin {}", connection_id, twin_id);

        RelayLink {
            connection_id,
            commands,
            cancel,
        }
    }

    /// Remove the connection if it is still the one bound to the twin.
    pub fn detach(&self, twin_id: &str, connection_id: u64) -> bool {
        let removed = self
            .connections
            .remove_if(twin_id, |_, conn| conn.id == connection_id);
        match removed {
            Some((_, conn)) => {
                conn.cancel.cancel();
                info!(target: "twinrelay::relay", "Detached connection #{} from twin {}", connection_id, twin_id);
                true
            }
            None => false,
        }
    }

    /// Publish `frame` as the last message of the twin's connection.
    /// Frames from a replaced connection are dropped.
    pub fn record_inbound(&self, twin_id: &str, connection_id: u64, frame: RelayFrame) -> bool {
        match self.connections.get_mut(twin_id) {
            Some(mut conn) if conn.id == connection_id => {
                conn.last_message = Some(frame);
                true
            }
            _ => false,
        }
    }

    pub fn last_message(&self, twin_id: &str) -> Option<RelayFrame> {
        self.connections
            .get(twin_id)
            .and_then(|conn| conn.last_message.clone())
    }

    pub fn is_connected(&self, twin_id: &str) -> bool {
        self.connections.contains_key(twin_id)
    }

    pub fn connected_count(&self) -> usize {
        self.connections.len()
    }

    /// Write `frame` to the twin's connection and wait for the writer's result.
    pub async fn send(&self, twin_id: &str, frame: RelayFrame) -> Result<()> {
        let outbound = self
            .connections
            .get(twin_id)
            .map(|conn| conn.outbound.clone())
            .ok_or_else(|| TwinError::NotConnected(twin_id.to_string()))?;

        let (ack, done) = oneshot::channel();
        outbound
            .send(RelayCommand::Send { frame, ack })
            .await
            .map_err(|_| TwinError::WriteError("connection closed".to_string()))?;

        done.await
            .map_err(|_| TwinError::WriteError("connection closed before write".to_string()))?
            .map_err(TwinError::WriteError)
    }

    /// Echo the last frame received from the twin's phone back over its connection.
    pub async fn relay_last_message(&self, twin_id: &str) -> Result<()> {
        let frame = {
            let conn = self
                .connections
                .get(twin_id)
                .ok_or_else(|| TwinError::NotConnected(twin_id.to_string()))?;
            conn.last_message
                .clone()
                .ok_or_else(|| TwinError::NothingToRelay(twin_id.to_string()))?
        };

        debug!(
            target: "twinrelay::relay",
            "Relaying {:?} frame ({} bytes) to twin {}",
            frame.kind,
            frame.len(),
            twin_id
        );
        self.send(twin_id, frame).await
    }

    /// Stop every live connection.
    pub fn shutdown(&self) {
        info!(target: "twinrelay::relay", "Closing {} relay connections", self.connections.len());
        self.shutdown.cancel();
    }
}

/// Read frames until the peer closes, a read fails, or `cancel` fires,
/// then detach the connection.
pub async fn read_loop<S, E>(
    hub: &RelayHub,
    twin_id: &str,
    connection_id: u64,
    mut inbound: S,
    cancel: CancellationToken,
) where
    S: Stream<Item = std::result::Result<Inbound, E>> + Unpin,
    E: Display,
{
    loop {
        let next = tokio::select! {
            _ = cancel.cancelled() => {
                debug!(target: "twinrelay::ws", "Read loop for twin {} cancelled", twin_id);
                break;
            }
            next = inbound.next() => next,
        };

        match next {
            Some(Ok(Inbound::Frame(frame))) => {
                debug!(
                    target: "twinrelay::ws",
                    "Twin {} sent {:?}: {}",
                    twin_id,
                    frame.kind,
                    frame.preview(PREVIEW_CHARS)
                );
                hub.record_inbound(twin_id, connection_id, frame);
            }
            Some(Ok(Inbound::Control)) => {
                trace!(target: "twinrelay::ws::ping", "Control frame from twin {}", twin_id);
            }
            Some(Ok(Inbound::Close)) | None => {
                info!(target: "twinrelay::ws", "Twin {} closed the connection", twin_id);
                break;
            }
            Some(Err(e)) => {
                warn!(target: "twinrelay::ws", "Read from twin {} failed: {}", twin_id, e);
                break;
            }
        }
    }

    hub.detach(twin_id, connection_id);
}

/// Perform queued writes until the hub drops the connection or `cancel`
/// fires. A failed write cancels the connection.
pub async fn write_loop<S>(
    mut commands: mpsc::Receiver<RelayCommand>,
    mut sink: S,
    cancel: CancellationToken,
) where
    S: Sink<RelayFrame> + Unpin,
    S::Error: Display,
{
    loop {
        let command = tokio::select! {
            _ = cancel.cancelled() => break,
            command = commands.recv() => match command {
                Some(command) => command,
                None => break,
            },
        };

        match command {
            RelayCommand::Send { frame, ack } => {
                let result = sink.send(frame).await.map_err(|e| e.to_string());
                let failed = result.is_err();
                if let Err(e) = &result {
                    warn!(target: "twinrelay::ws", "Relay write failed: {}", e);
                    cancel.cancel();
                }
                let _ = ack.send(result);
                if failed {
                    break;
                }
            }
        }
    }

    if let Err(e) = sink.close().await {
        trace!(target: "twinrelay::ws", "Closing relay sink failed: {}", e);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::channel::mpsc as fmpsc;
    use std::sync::Arc;
    use std::time::Duration;
    use twinrelay_types::FrameKind;

    /// Attach a connection and run its write loop into an in-memory sink.
    fn attach_with_sink(
        hub: &RelayHub,
        twin_id: &str,
    ) -> (u64, CancellationToken, fmpsc::Receiver<RelayFrame>) {
        let RelayLink {
            connection_id,
            commands,
            cancel,
            ..
        } = hub.attach(twin_id);
        let (tx, rx) = fmpsc::channel(8);
        tokio::spawn(write_loop(commands, tx, cancel.clone()));
        (connection_id, cancel, rx)
    }

    #[tokio::test]
    async fn test_relay_without_connection() {
        let hub = RelayHub::default();
        let err = hub.relay_last_message("123").await.unwrap_err();
        assert!(matches!(err, TwinError::NotConnected(id) if id == "123"));
    }

    #[tokio::test]
    async fn test_relay_before_any_message_is_nothing_to_relay() {
        let hub = RelayHub::default();
        let (_id, _cancel, _rx) = attach_with_sink(&hub, "123");
        let err = hub.relay_last_message("123").await.unwrap_err();
        assert!(matches!(err, TwinError::NothingToRelay(_)));
    }

    #[tokio::test]
    async fn test_relay_echoes_last_message() {
        let hub = RelayHub::default();
        let (id, _cancel, mut rx) = attach_with_sink(&hub, "123");

        assert!(hub.record_inbound("123", id, RelayFrame::text("first")));
        assert!(hub.record_inbound("123", id, RelayFrame::binary(vec![1, 2, 3])));

        hub.relay_last_message("123").await.unwrap();
        let written = rx.next().await.unwrap();
        assert_eq!(written.kind, FrameKind::Binary);
        assert_eq!(written.payload, vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn test_write_to_closed_sink_is_write_error() {
        let hub = RelayHub::default();
        let (id, cancel, rx) = attach_with_sink(&hub, "123");
        drop(rx);

        hub.record_inbound("123", id, RelayFrame::text("hi"));
        let err = hub.relay_last_message("123").await.unwrap_err();
        assert!(matches!(err, TwinError::WriteError(_)));
        assert!(cancel.is_cancelled());
    }

    #[tokio::test]
    async fn test_reattach_cancels_previous_connection() {
        let hub = RelayHub::default();
        let first = hub.attach("123");
        let second = hub.attach("123");

        assert!(first.cancel.is_cancelled());
        assert!(!second.cancel.is_cancelled());
        assert_eq!(hub.connected_count(), 1);

        // Stale frames and detaches from the old connection are ignored.
        assert!(!hub.record_inbound("123", first.connection_id, RelayFrame::text("stale")));
        assert!(!hub.detach("123", first.connection_id));
        assert!(hub.is_connected("123"));
        assert!(hub.last_message("123").is_none());
    }

    #[tokio::test]
    async fn test_connections_are_per_twin() {
        let hub = RelayHub::default();
        let a = hub.attach("a");
        let b = hub.attach("b");
        hub.record_inbound("a", a.connection_id, RelayFrame::text("from a"));

        assert_eq!(hub.last_message("a").unwrap().payload, b"from a");
        assert!(hub.last_message("b").is_none());
        assert!(!b.cancel.is_cancelled());
    }

    #[tokio::test]
    async fn test_read_loop_records_frames_and_detaches_on_close() {
        let hub = Arc::new(RelayHub::default());
        let link = hub.attach("123");
        let (tx, rx) = fmpsc::unbounded::<std::result::Result<Inbound, String>>();

        let reader = {
            let hub = hub.clone();
            let (id, cancel) = (link.connection_id, link.cancel.clone());
            tokio::spawn(async move { read_loop(&hub, "123", id, rx, cancel).await })
        };

        tx.unbounded_send(Ok(Inbound::Frame(RelayFrame::text("one")))).unwrap();
        tx.unbounded_send(Ok(Inbound::Control)).unwrap();
        tx.unbounded_send(Ok(Inbound::Frame(RelayFrame::text("two")))).unwrap();
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(hub.last_message("123").unwrap().payload, b"two");

        tx.unbounded_send(Ok(Inbound::Close)).unwrap();
        reader.await.unwrap();
        assert!(!hub.is_connected("123"));
    }

    #[tokio::test]
    async fn test_read_error_ends_only_that_loop() {
        let hub = RelayHub::default();
        let link = hub.attach("123");
        let frames = futures::stream::iter(vec![Err::<Inbound, _>("connection reset")]);

        read_loop(&hub, "123", link.connection_id, frames, link.cancel.clone()).await;
        assert!(!hub.is_connected("123"));
    }

    #[tokio::test]
    async fn test_shutdown_unblocks_read_loop() {
        let hub = Arc::new(RelayHub::default());
        let link = hub.attach("123");

        let reader = {
            let hub = hub.clone();
            let (id, cancel) = (link.connection_id, link.cancel.clone());
            tokio::spawn(async move {
                let pending = futures::stream::pending::<std::result::Result<Inbound, String>>();
                read_loop(&hub, "123", id, pending, cancel).await
            })
        };

        hub.shutdown();
        tokio::time::timeout(Duration::from_secs(1), reader)
            .await
            .expect("read loop did not stop")
            .unwrap();
        assert_eq!(hub.connected_count(), 0);
    }
}
