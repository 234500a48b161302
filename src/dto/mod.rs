use std::time::SystemTime;
use time::{OffsetDateTime, format_description::well_known::Rfc3339};

/// Health report.
pub mod health;
/// Lenient record request bodies.
pub mod stopwatch;
/// Identifier checks.
pub mod validation;
/// Sync socket frames.
pub mod ws;

fn format_system_time(time: SystemTime) -> String {
    OffsetDateTime::from(time)
        .format(&Rfc3339)
        .unwrap_or_else(|_| "invalid-timestamp".into())
}
