use axum::extract::ws::{Message, Utf8Bytes};
use dashmap::DashMap;
use tokio::sync::mpsc;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::{
    dto::ws::{EventKind, StopwatchEvent},
    state::stopwatch::Stopwatch,
};

/// Identity of one live connection.
pub type ConnectionId = Uuid;

#[derive(Clone, Debug)]
/// Handle used to push messages to one connected client.
pub struct ListenerChannel {
    /// Connection this channel belongs to.
    pub id: ConnectionId,
    /// Outbound queue drained by the connection's writer task.
    pub tx: mpsc::UnboundedSender<Message>,
}

impl ListenerChannel {
    /// Wrap an outbound queue under a freshly generated connection id.
    pub fn new(tx: mpsc::UnboundedSender<Message>) -> Self {
        Self {
            id: Uuid::new_v4(),
            tx,
        }
    }
}

/// Maps stopwatch ids to the connections listening on them.
///
/// Listeners of one id are kept in registration order. Nothing here is
/// persisted: the registry is rebuilt as clients reconnect and resubscribe.
#[derive(Default)]
pub struct SubscriptionRegistry {
    listeners: DashMap<String, Vec<ListenerChannel>>,
}

impl SubscriptionRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `channel` to the listeners of `id`; returns `false` when it was already there.
    pub fn subscribe(&self, id: &str, channel: &ListenerChannel) -> bool {
        let mut entry = self.listeners.entry(id.to_string()).or_default();
        if entry.iter().any(|existing| existing.id == channel.id) {
            return false;
        }
        entry.push(channel.clone());
        true
    }

    /// Remove `connection` from the listeners of `id`; returns whether it was present.
    pub fn unsubscribe(&self, id: &str, connection: ConnectionId) -> bool {
        let removed = match self.listeners.get_mut(id) {
            Some(mut entry) => {
                let before = entry.len();
                entry.retain(|listener| listener.id != connection);
                entry.len() != before
            }
            None => false,
        };
        self.listeners.remove_if(id, |_, entry| entry.is_empty());
        removed
    }

    /// Remove `connection` from every id it listens on, returning how many it left.
    pub fn unsubscribe_all(&self, connection: ConnectionId) -> usize {
        let mut removed = 0;
        self.listeners.retain(|_, entry| {
            let before = entry.len();
            entry.retain(|listener| listener.id != connection);
            removed += before - entry.len();
            !entry.is_empty()
        });
        removed
    }

    /// Deliver an event about `id` to every listener, returning how many accepted it.
    ///
    /// The payload is serialized once. A listener whose queue is closed is
    /// skipped; its own connection teardown will unregister it.
    pub fn broadcast(&self, id: &str, kind: EventKind, record: Option<&Stopwatch>) -> usize {
        let targets = match self.listeners.get(id) {
            Some(entry) => entry.value().clone(),
            None => return 0,
        };

        let event = StopwatchEvent { record, kind, id };
        let payload: Utf8Bytes = match serde_json::to_string(&event) {
            Ok(payload) => payload.into(),
            Err(err) => {
                warn!(%id, error = %err, "failed to serialize stopwatch event");
                return 0;
            }
        };

        let delivered = deliver(id, &targets, &payload).len();
        debug!(%id, ?kind, delivered, "broadcast stopwatch event");
        delivered
    }

    /// Number of connections listening on `id`.
    pub fn listener_count(&self, id: &str) -> usize {
        self.listeners.get(id).map_or(0, |entry| entry.len())
    }

    /// Total number of (id, connection) subscriptions.
    pub fn subscription_count(&self) -> usize {
        self.listeners.iter().map(|entry| entry.len()).sum()
    }
}

/// Push `payload` to each target in order, returning the connections that accepted it.
fn deliver(id: &str, targets: &[ListenerChannel], payload: &Utf8Bytes) -> Vec<ConnectionId> {
    let mut accepted = Vec::with_capacity(targets.len());
    for listener in targets {
        if listener.tx.send(Message::Text(payload.clone())).is_err() {
            warn!(%id, connection = %listener.id, "listener queue closed; skipping");
            continue;
        }
        accepted.push(listener.id);
    }
    accepted
}
