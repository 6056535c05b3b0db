//! Foundation types for Tally.
//!
//! This crate provides the data model shared by the merge engine and the
//! resolution applier. Every other Tally crate depends on `tally-types`.
//!
//! # Key Types
//!
//! - [`Snapshot`] — One contributor's full scorecard record
//! - [`AnswerNode`] / [`AnswerTree`] — Tagged nested answer values (scalar / sequence / mapping)
//! - [`AnswerEntry`] — The conventional answer leaf (primary value + description)
//! - [`KpiLine`] / [`KpiKey`] — A KPI record and its composite identity
//! - [`Conflict`] / [`SectionPath`] — A recorded disagreement and its structured address
//! - [`ParsedSnapshot`] / [`SectionIssue`] — Lenient document decoding with observable degradation

pub mod answer;
pub mod conflict;
pub mod kpi;
pub mod snapshot;

pub use answer::{AnswerEntry, AnswerNode, AnswerTree};
pub use conflict::{Conflict, ConflictValue, PathSegment, SectionPath, PREVIOUS_SOURCE};
pub use kpi::{find_match, KpiKey, KpiLine};
pub use snapshot::{ParsedSnapshot, Section, SectionIssue, Snapshot};
