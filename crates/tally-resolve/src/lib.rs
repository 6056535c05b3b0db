//! Resolution applier for Tally.
//!
//! Takes a merged snapshot, the conflicts the merge emitted, and a
//! mapping of conflict index to chosen alternative, and produces a new
//! record in which each chosen conflict's field holds exactly the chosen
//! value. Stale or out-of-range choices are skipped, never fatal.
//!
//! # Key Types
//!
//! - [`apply_resolutions`] — The one entry point
//! - [`ApplyOutcome`] — New record plus applied/skipped accounting
//! - [`SkippedResolution`] / [`SkipReason`] — Observable no-ops

pub mod apply;

pub use apply::{apply_resolutions, ApplyOutcome, SkipReason, SkippedResolution};
