use std::collections::HashSet;

use axum::extract::ws::{Message, WebSocket};
use futures::{SinkExt, StreamExt};
use thiserror::Error;
use tokio::{sync::mpsc, task::JoinHandle};
use tracing::{debug, info, warn};

use crate::{
    dto::ws::{ErrorReply, SyncRequest},
    state::{ListenerChannel, SharedState, SubscriptionRegistry},
};

/// Internal error type for sync message handling.
#[derive(Debug, Error)]
pub enum SyncError {
    /// Inbound frame was not JSON; answered with an error reply.
    #[error("invalid message: {0}")]
    InvalidMessage(#[from] serde_json::Error),
    /// Writer channel closed - connection should be terminated immediately.
    #[error("connection closed")]
    ConnectionClosed,
}

/// Per-connection protocol state.
///
/// Tracks which ids this connection listens on so duplicate `listen` and
/// stray `stopListening` requests never reach the registry. The session is
/// consumed by [`SyncSession::close`], which makes the final cleanup run
/// exactly once.
pub struct SyncSession<'a> {
    registry: &'a SubscriptionRegistry,
    channel: ListenerChannel,
    listening: HashSet<String>,
}

impl<'a> SyncSession<'a> {
    /// Open a session pushing events into `channel`.
    pub fn open(registry: &'a SubscriptionRegistry, channel: ListenerChannel) -> Self {
        Self {
            registry,
            channel,
            listening: HashSet::new(),
        }
    }

    /// Handle one inbound text frame.
    ///
    /// Frames that are not JSON get an error reply; every other frame is
    /// either applied or silently ignored.
    pub fn handle_text(&mut self, text: &str) -> Result<(), SyncError> {
        let request = match SyncRequest::from_json_str(text) {
            Ok(request) => request,
            Err(err) => {
                debug!(connection = %self.channel.id, error = %err, "rejecting non-JSON frame");
                self.reply(&ErrorReply::invalid_message())?;
                return Err(SyncError::InvalidMessage(err));
            }
        };

        match request {
            Some(SyncRequest::Listen { id }) => self.listen(id),
            Some(SyncRequest::StopListening { id }) => self.stop_listening(&id),
            Some(SyncRequest::Clear) => self.clear(),
            Some(SyncRequest::Unknown) | None => {
                debug!(connection = %self.channel.id, "ignoring unusable sync request");
            }
        }
        Ok(())
    }

    /// Ids this connection currently listens on.
    pub fn listening(&self) -> &HashSet<String> {
        &self.listening
    }

    /// Tear the session down, dropping every subscription it still holds.
    pub fn close(self) -> usize {
        self.registry.unsubscribe_all(self.channel.id)
    }

    fn listen(&mut self, id: String) {
        if self.listening.contains(&id) {
            return;
        }
        self.registry.subscribe(&id, &self.channel);
        debug!(connection = %self.channel.id, %id, "listening");
        self.listening.insert(id);
    }

    fn stop_listening(&mut self, id: &str) {
        if !self.listening.remove(id) {
            return;
        }
        self.registry.unsubscribe(id, self.channel.id);
        debug!(connection = %self.channel.id, %id, "stopped listening");
    }

    fn clear(&mut self) {
        self.listening.clear();
        let removed = self.registry.unsubscribe_all(self.channel.id);
        debug!(connection = %self.channel.id, removed, "cleared subscriptions");
    }

    fn reply<T>(&self, value: &T) -> Result<(), SyncError>
    where
        T: ?Sized + serde::Serialize + std::fmt::Debug,
    {
        send_message_to_websocket(&self.channel.tx, value)
    }
}

/// Handle the full lifecycle for an individual sync WebSocket connection.
pub async fn handle_socket(state: SharedState, socket: WebSocket) {
    let (mut sender, mut receiver) = socket.split();
    let (outbound_tx, mut outbound_rx) = mpsc::unbounded_channel::<Message>();

    // Dedicated writer task keeps outbound messages flowing even while we await inbound frames.
    let writer_task = tokio::spawn(async move {
        while let Some(message) = outbound_rx.recv().await {
            if sender.send(message).await.is_err() {
                break;
            }
        }
    });

    let channel = ListenerChannel::new(outbound_tx.clone());
    let connection = channel.id;
    let mut session = SyncSession::open(state.registry(), channel);
    info!(%connection, "sync client connected");

    while let Some(message) = receiver.next().await {
        match message {
            Ok(Message::Text(text)) => match session.handle_text(text.as_str()) {
                Ok(()) | Err(SyncError::InvalidMessage(_)) => {}
                Err(SyncError::ConnectionClosed) => {
                    info!(%connection, "writer closed, terminating");
                    break;
                }
            },
            Ok(Message::Ping(payload)) => {
                let _ = outbound_tx.send(Message::Pong(payload));
            }
            Ok(Message::Close(frame)) => {
                let _ = outbound_tx.send(Message::Close(frame));
                break;
            }
            Ok(Message::Binary(_)) => {}
            Ok(Message::Pong(_)) => {}
            Err(err) => {
                warn!(%connection, error = %err, "websocket error");
                break;
            }
        }
    }

    let removed = session.close();
    info!(%connection, removed, "sync client disconnected");

    finalize(writer_task, outbound_tx).await;
}

/// Serialize a payload and push it onto the provided WebSocket sender.
///
/// Serialization failures are logged and swallowed; a closed writer channel
/// is reported as [`SyncError::ConnectionClosed`].
fn send_message_to_websocket<T>(
    tx: &mpsc::UnboundedSender<Message>,
    value: &T,
) -> Result<(), SyncError>
where
    T: ?Sized + serde::Serialize + std::fmt::Debug,
{
    let payload = match serde_json::to_string(value) {
        Ok(p) => p,
        Err(err) => {
            warn!(error = %err, "failed to serialize message `{value:?}`");
            return Ok(());
        }
    };

    tx.send(Message::Text(payload.into()))
        .map_err(|_| SyncError::ConnectionClosed)
}

/// Ensure the writer task winds down before we return from the socket handler.
async fn finalize(writer_task: JoinHandle<()>, outbound_tx: mpsc::UnboundedSender<Message>) {
    drop(outbound_tx);
    let _ = writer_task.await;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{dto::ws::EventKind, state::stopwatch::Stopwatch};

    fn session_parts() -> (
        SubscriptionRegistry,
        ListenerChannel,
        mpsc::UnboundedReceiver<Message>,
    ) {
        let (tx, rx) = mpsc::unbounded_channel();
        (SubscriptionRegistry::new(), ListenerChannel::new(tx), rx)
    }

    fn frames(rx: &mut mpsc::UnboundedReceiver<Message>) -> Vec<serde_json::Value> {
        let mut out = Vec::new();
        while let Ok(Message::Text(text)) = rx.try_recv() {
            out.push(serde_json::from_str(text.as_str()).unwrap());
        }
        out
    }

    #[test]
    fn non_json_frame_gets_exactly_one_error_reply() {
        let (registry, channel, mut rx) = session_parts();
        let mut session = SyncSession::open(&registry, channel);

        let result = session.handle_text("not json");
        assert!(matches!(result, Err(SyncError::InvalidMessage(_))));
        assert_eq!(
            frames(&mut rx),
            vec![serde_json::json!({"error": true, "message": "Invalid message"})]
        );
        assert_eq!(registry.subscription_count(), 0);
    }

    #[test]
    fn listen_subscribes_once() {
        let (registry, channel, mut rx) = session_parts();
        let mut session = SyncSession::open(&registry, channel);

        session.handle_text(r#"{"type":"listen","id":"abc"}"#).unwrap();
        session.handle_text(r#"{"type":"listen","id":"abc"}"#).unwrap();
        assert_eq!(registry.listener_count("abc"), 1);

        registry.broadcast("abc", EventKind::Update, Some(&Stopwatch::default()));
        assert_eq!(frames(&mut rx).len(), 1);
    }

    #[test]
    fn stop_listening_only_affects_held_subscriptions() {
        let (registry, channel, _rx) = session_parts();
        let mut session = SyncSession::open(&registry, channel);

        session
            .handle_text(r#"{"type":"stopListening","id":"abc"}"#)
            .unwrap();
        session.handle_text(r#"{"type":"listen","id":"abc"}"#).unwrap();
        session.handle_text(r#"{"type":"listen","id":"xyz"}"#).unwrap();
        session
            .handle_text(r#"{"type":"stopListening","id":"abc"}"#)
            .unwrap();

        assert_eq!(registry.listener_count("abc"), 0);
        assert_eq!(registry.listener_count("xyz"), 1);
        assert_eq!(session.listening().len(), 1);
    }

    #[test]
    fn clear_drops_everything_and_allows_relisten() {
        let (registry, channel, _rx) = session_parts();
        let mut session = SyncSession::open(&registry, channel);

        session.handle_text(r#"{"type":"listen","id":"a"}"#).unwrap();
        session.handle_text(r#"{"type":"listen","id":"b"}"#).unwrap();
        session.handle_text(r#"{"type":"clear"}"#).unwrap();
        assert_eq!(registry.subscription_count(), 0);
        assert!(session.listening().is_empty());

        session.handle_text(r#"{"type":"listen","id":"a"}"#).unwrap();
        assert_eq!(registry.listener_count("a"), 1);
    }

    #[test]
    fn ignored_frames_get_no_reply() {
        let (registry, channel, mut rx) = session_parts();
        let mut session = SyncSession::open(&registry, channel);

        for frame in [
            r#"{"type":"listen","id":""}"#,
            r#"{"type":"listen","id":7}"#,
            r#"{"type":"subscribe","id":"abc"}"#,
            r#"[1,2,3]"#,
        ] {
            session.handle_text(frame).unwrap();
        }
        assert!(frames(&mut rx).is_empty());
        assert_eq!(registry.subscription_count(), 0);
    }

    #[test]
    fn close_releases_all_subscriptions_and_spares_others() {
        let (registry, channel, _rx) = session_parts();
        let (other_tx, _other_rx) = mpsc::unbounded_channel();
        let other = ListenerChannel::new(other_tx);
        registry.subscribe("a", &other);

        let mut session = SyncSession::open(&registry, channel);
        session.handle_text(r#"{"type":"listen","id":"a"}"#).unwrap();
        session.handle_text(r#"{"type":"listen","id":"b"}"#).unwrap();

        assert_eq!(session.close(), 2);
        assert_eq!(registry.listener_count("a"), 1);
        assert_eq!(registry.listener_count("b"), 0);
    }

    #[tokio::test]
    async fn long_ids_can_be_listened_on() {
        let registry = std::sync::Arc::new(SubscriptionRegistry::new());
        let records = crate::state::RecordStore::new(Default::default(), registry.clone());
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut session = SyncSession::open(&registry, ListenerChannel::new(tx));

        let id = "x".repeat(300);
        let frame = serde_json::json!({"type": "listen", "id": id}).to_string();
        session.handle_text(&frame).unwrap();
        assert_eq!(registry.listener_count(&id), 1);

        let delivered = records.put_stopwatch(&id, Stopwatch::default()).await;
        assert_eq!(delivered, 1);
        let events = frames(&mut rx);
        assert_eq!(events.len(), 1);
        assert_eq!(events[0]["id"], id.as_str());
    }

    #[test]
    fn close_without_subscriptions_is_a_no_op() {
        let (registry, channel, _rx) = session_parts();
        let session = SyncSession::open(&registry, channel);
        assert_eq!(session.close(), 0);
    }

    #[test]
    fn reply_after_writer_closed_reports_connection_closed() {
        let (registry, channel, rx) = session_parts();
        drop(rx);
        let mut session = SyncSession::open(&registry, channel);

        let result = session.handle_text("{{{");
        assert!(matches!(result, Err(SyncError::ConnectionClosed)));
    }
}
