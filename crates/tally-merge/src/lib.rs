//! Merge engine for Tally.
//!
//! Reconciles an ordered list of independently authored scorecard
//! snapshots into one merged record plus an explicit, addressable list of
//! genuine conflicts. The fold is strictly sequential and the engine is
//! total: malformed input degrades, it never aborts.
//!
//! # Key Types
//!
//! - [`MergePolicy`] — Run-wide leaf policy (non-default-wins / last-wins / first-wins)
//! - [`FieldKind`] / [`is_default`] — Default-vs-real value classification
//! - [`merge_into`] — Nested answer-tree merger
//! - [`merge_kpi_lines`] / [`find_match`] — KPI-line merger and composite-key matcher
//! - [`merge`] / [`merge_documents`] — The scorecard fold
//! - [`MergeResult`] / [`MergeStats`] — The outcome of one invocation

pub mod classify;
pub mod conflicts;
pub mod kpi;
pub mod policy;
pub mod scorecard;
pub mod tree;

pub use classify::{is_default, FieldKind};
pub use conflicts::ConflictSet;
pub use kpi::{find_match, merge_kpi_lines};
pub use policy::MergePolicy;
pub use scorecard::{merge, merge_documents, MergeResult, MergeStats, SnapshotInput};
pub use tree::merge_into;
