use serde_json::{Map, Value};
use tracing::{debug, info};

use crate::{
    dto::stopwatch::{GroupPayload, StopwatchPayload},
    error::AppError,
    state::{
        SharedState,
        stopwatch::{Stopwatch, StopwatchGroup},
    },
};

/// Decode a request body as JSON regardless of its declared content type.
///
/// Only a body that is not JSON at all is rejected. Any JSON value other than
/// an object is read as `{}`, so every field takes its default.
fn decode<T: serde::de::DeserializeOwned>(body: &[u8]) -> Result<T, AppError> {
    let value = match serde_json::from_slice::<Value>(body)? {
        object @ Value::Object(_) => object,
        _ => Value::Object(Map::new()),
    };
    Ok(serde_json::from_value(value)?)
}

/// Stored stopwatch or its default.
pub async fn get_stopwatch(state: &SharedState, id: &str) -> Stopwatch {
    state.records().get_stopwatch(id).await
}

/// Replace a stopwatch from a raw request body and notify its listeners.
pub async fn put_stopwatch(state: &SharedState, id: &str, body: &[u8]) -> Result<(), AppError> {
    let record: Stopwatch = decode::<StopwatchPayload>(body)?.into();
    let running = record.running;
    let delivered = state.records().put_stopwatch(id, record).await;
    debug!(%id, running, delivered, "stopwatch replaced");
    Ok(())
}

/// Delete a stopwatch after notifying its listeners.
pub async fn delete_stopwatch(state: &SharedState, id: &str) {
    let delivered = state.records().delete_stopwatch(id).await;
    info!(%id, delivered, "stopwatch deleted");
}

/// Stored group or its default.
pub async fn get_group(state: &SharedState, id: &str) -> StopwatchGroup {
    state.records().get_group(id).await
}

/// Replace a group from a raw request body.
pub async fn put_group(state: &SharedState, id: &str, body: &[u8]) -> Result<(), AppError> {
    let group: StopwatchGroup = decode::<GroupPayload>(body)?.into();
    debug!(%id, members = group.ids.len(), "group replaced");
    state.records().put_group(id, group).await;
    Ok(())
}

/// Delete a group record; member stopwatches are kept.
pub async fn delete_group(state: &SharedState, id: &str) {
    state.records().delete_group(id).await;
    info!(%id, "group deleted");
}
