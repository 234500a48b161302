//! Client side of the live-sync protocol: an HTTP mutation interface and a
//! local view kept in step with broadcast events.

/// HTTP interface of the record routes.
pub mod api;
/// Local view of tracked stopwatches.
pub mod reconciler;

use rand::{Rng, distr::Alphanumeric};
use thiserror::Error;
use time::OffsetDateTime;

pub use api::ApiClient;
pub use reconciler::{Reconciler, RenderedStopwatch, format_duration};

/// Errors surfaced by the terminal client.
#[derive(Debug, Error)]
pub enum ClientError {
    /// The HTTP interface rejected or failed a request.
    #[error("http request failed: {0}")]
    Http(#[from] reqwest::Error),
    /// The sync socket failed to connect or broke mid-session.
    #[error("websocket error: {0}")]
    Socket(#[from] tokio_tungstenite::tungstenite::Error),
    /// A frame or body could not be encoded or decoded.
    #[error("invalid json: {0}")]
    Json(#[from] serde_json::Error),
    /// The base URL cannot be turned into a sync socket URL.
    #[error("unsupported base url `{0}`")]
    BaseUrl(String),
}

/// Length of identifiers generated for new stopwatches and groups.
pub const GENERATED_ID_LEN: usize = 40;

/// Random alphanumeric identifier of `len` characters.
pub fn random_id(len: usize) -> String {
    rand::rng()
        .sample_iter(Alphanumeric)
        .take(len)
        .map(char::from)
        .collect()
}

/// Current wall-clock time in epoch milliseconds.
pub fn now_millis() -> u64 {
    let nanos = OffsetDateTime::now_utc().unix_timestamp_nanos();
    u64::try_from(nanos / 1_000_000).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn now_is_after_2020() {
        assert!(now_millis() > 1_577_836_800_000);
    }

    #[test]
    fn random_ids_are_alphanumeric() {
        let id = random_id(GENERATED_ID_LEN);
        assert_eq!(id.len(), GENERATED_ID_LEN);
        assert!(id.chars().all(|c| c.is_ascii_alphanumeric()));
        assert_ne!(id, random_id(GENERATED_ID_LEN));
    }
}
