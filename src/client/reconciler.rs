//! Local, ordered view of the stopwatches a client displays.
//!
//! Edits are applied optimistically: [`Reconciler::toggle`] and
//! [`Reconciler::reset`] change the local record first and hand back the full
//! record to push over HTTP. Broadcast events then converge every other view
//! through [`Reconciler::apply`] without a fresh fetch.

use crate::{
    dto::ws::{EventKind, ReceivedEvent},
    state::stopwatch::Stopwatch,
};

#[derive(Debug, Clone, PartialEq, Eq)]
struct LocalStopwatch {
    id: String,
    record: Stopwatch,
}

/// One line of output produced by [`Reconciler::render`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedStopwatch {
    /// Stopwatch id.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Milliseconds elapsed at render time.
    pub elapsed: u64,
    /// Whether the stopwatch was counting at render time.
    pub running: bool,
}

impl RenderedStopwatch {
    /// Elapsed time formatted for display.
    pub fn display_elapsed(&self) -> String {
        format_duration(self.elapsed)
    }
}

/// Keeps locally displayed stopwatches consistent with inbound events.
#[derive(Debug, Default)]
pub struct Reconciler {
    entries: Vec<LocalStopwatch>,
}

impl Reconciler {
    /// Empty view.
    pub fn new() -> Self {
        Self::default()
    }

    /// Start displaying `id`; an id already tracked has its record replaced in place.
    pub fn track(&mut self, id: impl Into<String>, record: Stopwatch) {
        let id = id.into();
        match self.position(&id) {
            Some(index) => self.entries[index].record = record,
            None => self.entries.push(LocalStopwatch { id, record }),
        }
    }

    /// Stop displaying `id`. Returns whether it was tracked.
    pub fn untrack(&mut self, id: &str) -> bool {
        let before = self.entries.len();
        self.entries.retain(|entry| entry.id != id);
        self.entries.len() != before
    }

    /// Stop displaying everything.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Local record of `id`, if tracked.
    pub fn get(&self, id: &str) -> Option<&Stopwatch> {
        self.position(id).map(|index| &self.entries[index].record)
    }

    /// Tracked ids in display order.
    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|entry| entry.id.as_str())
    }

    /// Number of tracked stopwatches.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether nothing is tracked.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Start or stop `id` locally and return the record to push.
    pub fn toggle(&mut self, id: &str, now: u64) -> Option<Stopwatch> {
        self.edit(id, |record| record.toggle(now))
    }

    /// Zero `id` locally and return the record to push.
    pub fn reset(&mut self, id: &str) -> Option<Stopwatch> {
        self.edit(id, Stopwatch::reset)
    }

    /// Rename `id` locally and return the record to push.
    pub fn rename(&mut self, id: &str, name: impl Into<String>) -> Option<Stopwatch> {
        let name = name.into();
        self.edit(id, |record| Stopwatch { name, ..record })
    }

    /// Fold a broadcast event into the local view.
    ///
    /// Events for ids that are not tracked are ignored. Returns whether the
    /// view changed.
    pub fn apply(&mut self, event: &ReceivedEvent) -> bool {
        match event.kind {
            EventKind::Update => match self.position(&event.id) {
                Some(index) => {
                    self.entries[index].record = event.record.clone();
                    true
                }
                None => false,
            },
            EventKind::Delete => self.untrack(&event.id),
        }
    }

    /// Recompute elapsed time for every tracked stopwatch at `now`.
    pub fn render(&self, now: u64) -> Vec<RenderedStopwatch> {
        self.entries
            .iter()
            .map(|entry| RenderedStopwatch {
                id: entry.id.clone(),
                name: entry.record.name.clone(),
                elapsed: entry.record.elapsed(now),
                running: entry.record.running,
            })
            .collect()
    }

    fn position(&self, id: &str) -> Option<usize> {
        self.entries.iter().position(|entry| entry.id == id)
    }

    fn edit(&mut self, id: &str, change: impl FnOnce(Stopwatch) -> Stopwatch) -> Option<Stopwatch> {
        let index = self.position(id)?;
        let slot = &mut self.entries[index].record;
        *slot = change(std::mem::take(slot));
        Some(slot.clone())
    }
}

/// Format milliseconds as `h:m:s.d`, tenths truncated and fields unpadded.
pub fn format_duration(ms: u64) -> String {
    let hours = ms / 3_600_000;
    let minutes = (ms / 60_000) % 60;
    let seconds = (ms / 1_000) % 60;
    let tenths = (ms % 1_000) / 100;
    format!("{hours}:{minutes}:{seconds}.{tenths}")
}
