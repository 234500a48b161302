use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::{dto::validation::validate_stopwatch_id, state::stopwatch::Stopwatch};

#[derive(Debug, Deserialize, Serialize, ToSchema)]
/// Messages accepted from sync WebSocket clients.
#[serde(tag = "type")]
pub enum SyncRequest {
    /// Start receiving events for a stopwatch.
    #[serde(rename = "listen")]
    Listen {
        /// Stopwatch to follow.
        id: String,
    },
    /// Stop receiving events for a stopwatch.
    #[serde(rename = "stopListening")]
    StopListening {
        /// Stopwatch to stop following.
        id: String,
    },
    /// Drop every subscription held by the connection.
    #[serde(rename = "clear")]
    Clear,
    /// Any other `type`; ignored.
    #[serde(other)]
    Unknown,
}

impl SyncRequest {
    /// Parse a text frame into a request.
    ///
    /// `Err` means the frame is not JSON at all. A JSON value that does not
    /// describe a usable request (wrong shape, wrong `id` type, blank `id`)
    /// yields `Ok(None)` and is meant to be ignored.
    pub fn from_json_str(text: &str) -> Result<Option<Self>, serde_json::Error> {
        let value: serde_json::Value = serde_json::from_str(text)?;
        let Ok(request) = serde_json::from_value::<Self>(value) else {
            return Ok(None);
        };
        Ok(request.validated())
    }

    /// Drop requests whose `id` does not name a stopwatch.
    fn validated(self) -> Option<Self> {
        let id = match &self {
            Self::Listen { id } | Self::StopListening { id } => id,
            Self::Clear | Self::Unknown => return Some(self),
        };
        if validate_stopwatch_id(id).is_err() {
            return None;
        }
        Some(self)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
/// Kind of change carried by a [`StopwatchEvent`].
pub enum EventKind {
    /// The stopwatch was replaced; the payload is the new record.
    Update,
    /// The stopwatch is being deleted; the payload is its final record.
    Delete,
}

#[derive(Debug, Serialize)]
/// Event pushed to every connection listening on `id`.
///
/// Record fields are flattened next to `type` and `id`; a delete of a record
/// that was never stored carries no record fields.
pub struct StopwatchEvent<'a> {
    /// Record after the change, or the final record on delete.
    #[serde(flatten)]
    pub record: Option<&'a Stopwatch>,
    /// What happened.
    #[serde(rename = "type")]
    pub kind: EventKind,
    /// Stopwatch the event is about.
    pub id: &'a str,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
/// Owned form of [`StopwatchEvent`] as read back by clients.
pub struct ReceivedEvent {
    /// What happened.
    #[serde(rename = "type")]
    pub kind: EventKind,
    /// Stopwatch the event is about.
    pub id: String,
    /// Record fields, defaulted when the event carries none.
    #[serde(flatten)]
    pub record: Stopwatch,
}

#[derive(Debug, Serialize, ToSchema)]
/// Reply sent when an inbound frame is not valid JSON.
pub struct ErrorReply {
    /// Always `true`.
    pub error: bool,
    /// Human-readable reason.
    pub message: String,
}

impl ErrorReply {
    /// The single error reply the sync protocol emits.
    pub fn invalid_message() -> Self {
        Self {
            error: true,
            message: "Invalid message".into(),
        }
    }
}
