//! Stopwatch and group records together with their pure time semantics.
//!
//! Every operation here takes the current wall-clock time as an argument so the
//! server, the client reconciler, and the tests all share one deterministic model.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Name given to records materialized on first read.
pub const DEFAULT_NAME: &str = "Unnamed";

/// A named timer accumulating time while running.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct Stopwatch {
    /// Free-form display name.
    pub name: String,
    /// Milliseconds accumulated during previous running periods.
    pub past_time: u64,
    /// Epoch milliseconds of the current running period, present iff `running`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub started_at: Option<u64>,
    /// Whether the stopwatch is currently counting.
    pub running: bool,
}

impl Default for Stopwatch {
    fn default() -> Self {
        Self {
            name: DEFAULT_NAME.to_string(),
            past_time: 0,
            started_at: None,
            running: false,
        }
    }
}

impl Stopwatch {
    /// Elapsed milliseconds at `now`, never less than `past_time`.
    pub fn elapsed(&self, now: u64) -> u64 {
        match (self.running, self.started_at) {
            (true, Some(started_at)) => self.past_time + now.saturating_sub(started_at),
            _ => self.past_time,
        }
    }

    /// Begin a running period at `now`; running stopwatches are returned unchanged.
    pub fn start(self, now: u64) -> Self {
        if self.running {
            return self;
        }
        Self {
            running: true,
            started_at: Some(now),
            ..self
        }
    }

    /// Close the current running period at `now`, folding it into `past_time`.
    pub fn stop(self, now: u64) -> Self {
        if !self.running {
            return self;
        }
        let past_time = self.elapsed(now);
        Self {
            past_time,
            started_at: None,
            running: false,
            ..self
        }
    }

    /// Zero the stopwatch and leave it stopped, whatever its prior state.
    pub fn reset(self) -> Self {
        Self {
            past_time: 0,
            started_at: None,
            running: false,
            ..self
        }
    }

    /// Stop a running stopwatch or start a stopped one.
    pub fn toggle(self, now: u64) -> Self {
        if self.running {
            self.stop(now)
        } else {
            self.start(now)
        }
    }

    /// Restore the `running == started_at.is_some()` invariant on records
    /// received from clients.
    ///
    /// A record claiming to run without a start timestamp cannot be measured,
    /// so it is treated as stopped; a stopped record simply drops any stale
    /// timestamp.
    pub fn normalized(self) -> Self {
        match (self.running, self.started_at) {
            (true, None) => Self {
                running: false,
                ..self
            },
            (false, Some(_)) => Self {
                started_at: None,
                ..self
            },
            _ => self,
        }
    }
}

/// A named, ordered list of stopwatch identifiers.
///
/// The server never checks membership: duplicates and dangling ids are the
/// owning client's business.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(default)]
pub struct StopwatchGroup {
    /// Free-form display name.
    pub name: String,
    /// Member stopwatch identifiers in display order.
    pub ids: Vec<String>,
}

impl Default for StopwatchGroup {
    fn default() -> Self {
        Self {
            name: DEFAULT_NAME.to_string(),
            ids: Vec::new(),
        }
    }
}

impl StopwatchGroup {
    /// Append `id` to the end of the member list.
    pub fn with_member(mut self, id: impl Into<String>) -> Self {
        self.ids.push(id.into());
        self
    }

    /// Drop every occurrence of `id` from the member list.
    pub fn without_member(mut self, id: &str) -> Self {
        self.ids.retain(|member| member != id);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stopped(past_time: u64) -> Stopwatch {
        Stopwatch {
            past_time,
            ..Stopwatch::default()
        }
    }

    #[test]
    fn default_record_is_unnamed_and_stopped() {
        let sw = Stopwatch::default();
        assert_eq!(sw.name, "Unnamed");
        assert_eq!(sw.past_time, 0);
        assert_eq!(sw.started_at, None);
        assert!(!sw.running);
    }

    #[test]
    fn start_then_stop_accumulates_the_interval() {
        for (past, t0, t1) in [(0, 1_000, 1_000), (250, 1_000, 4_500), (9_999, 0, 1)] {
            let sw = stopped(past).start(t0).stop(t1);
            assert_eq!(sw.elapsed(t1), past + (t1 - t0));
            assert_eq!(sw.elapsed(t1 + 10_000), past + (t1 - t0));
            assert!(!sw.running);
            assert_eq!(sw.started_at, None);
        }
    }

    #[test]
    fn elapsed_counts_while_running() {
        let sw = stopped(500).start(10_000);
        assert_eq!(sw.elapsed(10_000), 500);
        assert_eq!(sw.elapsed(12_345), 2_845);
    }

    #[test]
    fn elapsed_clamps_when_clock_runs_backwards() {
        let sw = stopped(700).start(5_000);
        assert_eq!(sw.elapsed(4_000), 700);
        assert_eq!(sw.clone().stop(4_000).past_time, 700);
    }

    #[test]
    fn start_is_a_no_op_when_running() {
        let sw = stopped(0).start(1_000);
        assert_eq!(sw.clone().start(2_000), sw);
    }

    #[test]
    fn stop_is_a_no_op_when_stopped() {
        let sw = stopped(42);
        assert_eq!(sw.clone().stop(2_000), sw);
    }

    #[test]
    fn reset_always_clears_everything_but_the_name() {
        let running = Stopwatch {
            name: "Tea".into(),
            past_time: 1_234,
            started_at: Some(99),
            running: true,
        };
        for sw in [running, stopped(88), Stopwatch::default()] {
            let name = sw.name.clone();
            let reset = sw.reset();
            assert_eq!(reset.past_time, 0);
            assert!(!reset.running);
            assert_eq!(reset.started_at, None);
            assert_eq!(reset.name, name);
        }
    }

    #[test]
    fn toggle_alternates_between_start_and_stop() {
        let sw = stopped(0).toggle(1_000);
        assert!(sw.running);
        let sw = sw.toggle(3_000);
        assert!(!sw.running);
        assert_eq!(sw.past_time, 2_000);
    }

    #[test]
    fn normalized_enforces_running_iff_started_at() {
        let orphan = Stopwatch {
            running: true,
            started_at: None,
            ..stopped(10)
        };
        let normalized = orphan.normalized();
        assert!(!normalized.running);
        assert_eq!(normalized.past_time, 10);

        let stale = Stopwatch {
            running: false,
            started_at: Some(5),
            ..stopped(10)
        };
        assert_eq!(stale.normalized().started_at, None);

        let healthy = stopped(3).start(7);
        assert_eq!(healthy.clone().normalized(), healthy);
    }

    #[test]
    fn serializes_with_camel_case_and_omits_missing_start() {
        let json = serde_json::to_value(stopped(5)).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"name": "Unnamed", "pastTime": 5, "running": false})
        );

        let json = serde_json::to_value(stopped(0).start(1_000)).unwrap();
        assert_eq!(json["startedAt"], 1_000);
    }

    #[test]
    fn group_membership_appends_and_removes_every_occurrence() {
        let group = StopwatchGroup::default()
            .with_member("a")
            .with_member("b")
            .with_member("a");
        assert_eq!(group.ids, vec!["a", "b", "a"]);

        let group = group.without_member("a");
        assert_eq!(group.ids, vec!["b"]);
        assert_eq!(group.clone().without_member("missing"), group);
    }
}
