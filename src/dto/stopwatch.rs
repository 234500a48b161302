//! Request bodies for the record routes.
//!
//! Browser clients send bodies without a JSON content type and occasionally
//! with fields of the wrong type. Bodies are decoded leniently: any field that
//! is missing or mistyped takes its default instead of failing the request.

use serde::Deserialize;
use serde_with::{DefaultOnError, serde_as};

use crate::state::stopwatch::{DEFAULT_NAME, Stopwatch, StopwatchGroup};

#[serde_as]
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
/// Body of `PUT /stopwatch/{id}`.
pub struct StopwatchPayload {
    #[serde_as(deserialize_as = "DefaultOnError")]
    #[serde(default)]
    pub name: Option<String>,
    #[serde_as(deserialize_as = "DefaultOnError")]
    #[serde(default)]
    pub past_time: u64,
    #[serde_as(deserialize_as = "DefaultOnError")]
    #[serde(default)]
    pub started_at: Option<u64>,
    #[serde_as(deserialize_as = "DefaultOnError")]
    #[serde(default)]
    pub running: bool,
}

impl From<StopwatchPayload> for Stopwatch {
    fn from(payload: StopwatchPayload) -> Self {
        Stopwatch {
            name: payload.name.unwrap_or_else(|| DEFAULT_NAME.to_string()),
            past_time: payload.past_time,
            started_at: payload.started_at,
            running: payload.running,
        }
        .normalized()
    }
}

#[serde_as]
#[derive(Debug, Deserialize)]
/// Body of `PUT /stopwatchgroup/{id}`.
pub struct GroupPayload {
    #[serde_as(deserialize_as = "DefaultOnError")]
    #[serde(default)]
    pub name: Option<String>,
    #[serde_as(deserialize_as = "DefaultOnError")]
    #[serde(default)]
    pub ids: Vec<String>,
}

impl From<GroupPayload> for StopwatchGroup {
    fn from(payload: GroupPayload) -> Self {
        StopwatchGroup {
            name: payload.name.unwrap_or_else(|| DEFAULT_NAME.to_string()),
            ids: payload.ids,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stopwatch(raw: &str) -> Stopwatch {
        serde_json::from_str::<StopwatchPayload>(raw).unwrap().into()
    }

    #[test]
    fn well_formed_body_is_taken_verbatim() {
        let sw = stopwatch(r#"{"name":"T","pastTime":0,"running":true,"startedAt":1000}"#);
        assert_eq!(
            sw,
            Stopwatch {
                name: "T".into(),
                past_time: 0,
                started_at: Some(1_000),
                running: true,
            }
        );
    }

    #[test]
    fn mistyped_fields_fall_back_to_defaults() {
        let sw = stopwatch(r#"{"name":12,"pastTime":"lots","running":"yes"}"#);
        assert_eq!(sw, Stopwatch::default());
    }

    #[test]
    fn negative_past_time_becomes_zero() {
        let sw = stopwatch(r#"{"name":"x","pastTime":-5,"running":false}"#);
        assert_eq!(sw.past_time, 0);
    }

    #[test]
    fn empty_object_is_the_default_record() {
        assert_eq!(stopwatch("{}"), Stopwatch::default());
    }

    #[test]
    fn running_without_start_is_stored_stopped() {
        let sw = stopwatch(r#"{"name":"x","pastTime":10,"running":true}"#);
        assert!(!sw.running);
        assert_eq!(sw.past_time, 10);
    }

    #[test]
    fn null_start_reads_as_absent() {
        let sw = stopwatch(r#"{"name":"x","pastTime":10,"running":false,"startedAt":null}"#);
        assert_eq!(sw.started_at, None);
    }

    #[test]
    fn group_body_defaults_mistyped_fields() {
        let group: StopwatchGroup = serde_json::from_str::<GroupPayload>(r#"{"ids":"abc"}"#)
            .unwrap()
            .into();
        assert_eq!(group, StopwatchGroup::default());

        let group: StopwatchGroup =
            serde_json::from_str::<GroupPayload>(r#"{"name":"none","ids":["a","a"]}"#)
                .unwrap()
                .into();
        assert_eq!(group.name, "none");
        assert_eq!(group.ids, vec!["a", "a"]);
    }
}
