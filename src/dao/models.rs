use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::state::stopwatch::{Stopwatch, StopwatchGroup};

/// Whole persisted document, rewritten on every flush.
///
/// Field names match the on-disk layout shared with earlier deployments,
/// including the `stopwatchs` spelling.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PersistedState {
    /// Stopwatch records keyed by their opaque id.
    pub stopwatchs: IndexMap<String, Stopwatch>,
    /// Group records keyed by their opaque id.
    #[serde(rename = "stopwatchGroups")]
    pub stopwatch_groups: IndexMap<String, StopwatchGroup>,
}
