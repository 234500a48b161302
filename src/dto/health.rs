use std::time::SystemTime;

use serde::Serialize;
use utoipa::ToSchema;

use crate::dto::format_system_time;

/// Health response returned by the `/healthcheck` route.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    /// Health status ("ok" or "degraded").
    pub status: String,
    /// Number of stored stopwatches.
    pub stopwatches: usize,
    /// Number of stored groups.
    pub groups: usize,
    /// Number of live (stopwatch, connection) subscriptions.
    pub subscriptions: usize,
    /// RFC 3339 time of the last successful state write, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_persisted_at: Option<String>,
}

impl HealthResponse {
    /// Create a health response indicating the system is operational.
    pub fn ok() -> Self {
        Self::with_status("ok")
    }

    /// Create a health response indicating the last state write failed.
    pub fn degraded() -> Self {
        Self::with_status("degraded")
    }

    /// Attach record and subscription counts.
    pub fn with_counts(mut self, stopwatches: usize, groups: usize, subscriptions: usize) -> Self {
        self.stopwatches = stopwatches;
        self.groups = groups;
        self.subscriptions = subscriptions;
        self
    }

    /// Attach the time of the last successful write.
    pub fn with_last_persisted(mut self, at: Option<SystemTime>) -> Self {
        self.last_persisted_at = at.map(format_system_time);
        self
    }

    fn with_status(status: &str) -> Self {
        Self {
            status: status.to_string(),
            stopwatches: 0,
            groups: 0,
            subscriptions: 0,
            last_persisted_at: None,
        }
    }
}
