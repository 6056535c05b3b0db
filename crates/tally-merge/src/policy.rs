use serde::{Deserialize, Serialize};

/// Run-wide leaf policy for the merge fold.
///
/// Selected once per merge invocation; there is no per-field override.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MergePolicy {
    /// Real values beat defaults; two differing real values conflict and
    /// are left for a human to resolve.
    #[default]
    NonDefaultWins,
    /// The incoming value always overwrites. Never conflicts.
    LastWins,
    /// The first value sticks. Never conflicts.
    FirstWins,
}
