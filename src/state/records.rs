use std::sync::{
    Arc,
    atomic::{AtomicU64, Ordering},
};

use tokio::sync::{Notify, RwLock};

use crate::{
    dao::models::PersistedState,
    dto::ws::EventKind,
    state::{
        registry::SubscriptionRegistry,
        stopwatch::{Stopwatch, StopwatchGroup},
    },
};

/// Authoritative in-memory copy of every stopwatch and group.
///
/// All mutations take the single write lock, so a mutation and the broadcast
/// it triggers are atomic with respect to other requests. Each mutation bumps
/// the revision counter and wakes the persistence worker.
pub struct RecordStore {
    records: RwLock<PersistedState>,
    registry: Arc<SubscriptionRegistry>,
    revision: AtomicU64,
    changed: Notify,
}

impl RecordStore {
    /// Build a store seeded with `initial`, broadcasting through `registry`.
    pub fn new(initial: PersistedState, registry: Arc<SubscriptionRegistry>) -> Self {
        Self {
            records: RwLock::new(initial),
            registry,
            revision: AtomicU64::new(0),
            changed: Notify::new(),
        }
    }

    /// Stored stopwatch, or the default record when `id` was never written.
    pub async fn get_stopwatch(&self, id: &str) -> Stopwatch {
        let records = self.records.read().await;
        records.stopwatchs.get(id).cloned().unwrap_or_default()
    }

    /// Replace the stopwatch stored under `id` and notify its listeners.
    pub async fn put_stopwatch(&self, id: &str, record: Stopwatch) -> usize {
        let mut records = self.records.write().await;
        let delivered = self
            .registry
            .broadcast(id, EventKind::Update, Some(&record));
        records.stopwatchs.insert(id.to_string(), record);
        self.mark_changed();
        delivered
    }

    /// Delete the stopwatch stored under `id`.
    ///
    /// Listeners receive the `delete` event carrying the final stored record
    /// before it is removed; the event is part of the deletion, not a
    /// follow-up, so a listener never observes the id as absent first.
    pub async fn delete_stopwatch(&self, id: &str) -> usize {
        let mut records = self.records.write().await;
        let delivered = self
            .registry
            .broadcast(id, EventKind::Delete, records.stopwatchs.get(id));
        records.stopwatchs.shift_remove(id);
        self.mark_changed();
        delivered
    }

    /// Stored group, or the default group when `id` was never written.
    pub async fn get_group(&self, id: &str) -> StopwatchGroup {
        let records = self.records.read().await;
        records.stopwatch_groups.get(id).cloned().unwrap_or_default()
    }

    /// Replace the group stored under `id`; groups are not live-synced.
    pub async fn put_group(&self, id: &str, group: StopwatchGroup) {
        let mut records = self.records.write().await;
        records.stopwatch_groups.insert(id.to_string(), group);
        self.mark_changed();
    }

    /// Remove the group record only; its member stopwatches stay untouched.
    pub async fn delete_group(&self, id: &str) {
        let mut records = self.records.write().await;
        records.stopwatch_groups.shift_remove(id);
        self.mark_changed();
    }

    /// Current revision together with a copy of the document it describes.
    pub async fn snapshot(&self) -> (u64, PersistedState) {
        let records = self.records.read().await;
        (self.revision(), records.clone())
    }

    /// Number of mutations applied since startup.
    pub fn revision(&self) -> u64 {
        self.revision.load(Ordering::Acquire)
    }

    /// Number of stored stopwatches and groups.
    pub async fn counts(&self) -> (usize, usize) {
        let records = self.records.read().await;
        (records.stopwatchs.len(), records.stopwatch_groups.len())
    }

    /// Resolve once a mutation happened since the previous call returned.
    pub async fn changed(&self) {
        self.changed.notified().await;
    }

    /// Called with the write lock held so a snapshot's revision always
    /// matches its document.
    fn mark_changed(&self) {
        self.revision.fetch_add(1, Ordering::AcqRel);
        self.changed.notify_one();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::registry::ListenerChannel;
    use axum::extract::ws::Message;
    use tokio::sync::mpsc;

    fn store() -> (RecordStore, Arc<SubscriptionRegistry>) {
        let registry = Arc::new(SubscriptionRegistry::new());
        (
            RecordStore::new(PersistedState::default(), registry.clone()),
            registry,
        )
    }

    fn listener(
        registry: &SubscriptionRegistry,
        id: &str,
    ) -> mpsc::UnboundedReceiver<Message> {
        let (tx, rx) = mpsc::unbounded_channel();
        registry.subscribe(id, &ListenerChannel::new(tx));
        rx
    }

    fn next_event(rx: &mut mpsc::UnboundedReceiver<Message>) -> serde_json::Value {
        match rx.try_recv().expect("an event") {
            Message::Text(text) => serde_json::from_str(text.as_str()).unwrap(),
            other => panic!("unexpected frame {other:?}"),
        }
    }

    fn running_record() -> Stopwatch {
        Stopwatch {
            name: "T".into(),
            past_time: 0,
            started_at: Some(1_000),
            running: true,
        }
    }

    #[tokio::test]
    async fn unknown_ids_read_as_defaults() {
        let (store, _) = store();
        assert_eq!(store.get_stopwatch("nope").await, Stopwatch::default());
        assert_eq!(store.get_group("nope").await, StopwatchGroup::default());
        assert_eq!(store.revision(), 0);
    }

    #[tokio::test]
    async fn put_then_get_returns_exactly_the_record() {
        let (store, _) = store();
        store.put_stopwatch("abc", running_record()).await;
        assert_eq!(store.get_stopwatch("abc").await, running_record());

        let replacement = Stopwatch {
            name: "Other".into(),
            ..Stopwatch::default()
        };
        store.put_stopwatch("abc", replacement.clone()).await;
        assert_eq!(store.get_stopwatch("abc").await, replacement);
        assert_eq!(store.revision(), 2);
    }

    #[tokio::test]
    async fn put_broadcasts_the_new_record() {
        let (store, registry) = store();
        let mut rx = listener(&registry, "abc");

        assert_eq!(store.put_stopwatch("abc", running_record()).await, 1);
        assert_eq!(
            next_event(&mut rx),
            serde_json::json!({
                "type": "update",
                "id": "abc",
                "name": "T",
                "pastTime": 0,
                "running": true,
                "startedAt": 1000
            })
        );
    }

    #[tokio::test]
    async fn delete_broadcasts_final_state_before_removal() {
        let (store, registry) = store();
        store.put_stopwatch("x", running_record()).await;
        let mut rx = listener(&registry, "x");

        store.delete_stopwatch("x").await;

        let event = next_event(&mut rx);
        assert_eq!(event["type"], "delete");
        assert_eq!(event["id"], "x");
        assert_eq!(event["name"], "T");
        assert_eq!(event["startedAt"], 1000);
        assert_eq!(store.get_stopwatch("x").await, Stopwatch::default());
    }

    #[tokio::test]
    async fn delete_of_unknown_id_still_notifies() {
        let (store, registry) = store();
        let mut rx = listener(&registry, "ghost");

        store.delete_stopwatch("ghost").await;
        assert_eq!(
            next_event(&mut rx),
            serde_json::json!({"type": "delete", "id": "ghost"})
        );
    }

    #[tokio::test]
    async fn groups_are_stored_without_broadcast() {
        let (store, registry) = store();
        let mut rx = listener(&registry, "home");
        let group = StopwatchGroup {
            name: "none".into(),
            ids: vec!["a".into(), "a".into(), "dangling".into()],
        };

        store.put_group("home", group.clone()).await;
        assert_eq!(store.get_group("home").await, group);
        store.delete_group("home").await;
        assert_eq!(store.get_group("home").await, StopwatchGroup::default());
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn deleting_a_group_leaves_members_alone() {
        let (store, _) = store();
        store.put_stopwatch("a", running_record()).await;
        store
            .put_group("home", StopwatchGroup::default().with_member("a"))
            .await;

        store.delete_group("home").await;
        assert_eq!(store.get_stopwatch("a").await, running_record());
    }

    #[tokio::test]
    async fn snapshot_reports_revision_and_document() {
        let (store, _) = store();
        store.put_stopwatch("a", running_record()).await;
        store.put_group("g", StopwatchGroup::default()).await;

        let (revision, document) = store.snapshot().await;
        assert_eq!(revision, 2);
        assert_eq!(document.stopwatchs["a"], running_record());
        assert!(document.stopwatch_groups.contains_key("g"));
        assert_eq!(store.counts().await, (1, 1));
    }
}
