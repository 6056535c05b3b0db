//! KPI-line merger and composite-key matcher.
//!
//! KPI lines are identified by (area, category, sub-category), never by
//! list position. Merging is scoped to the `actual` field; the rest of a
//! line travels with whichever record supplies the winning actual, so a
//! line's provenance is atomic.

use tally_types::{Conflict, KpiLine, SectionPath};

use crate::classify::{is_default, FieldKind};
use crate::policy::MergePolicy;

pub use tally_types::kpi::find_match;

/// Merge two lines that share a composite key.
///
/// Under [`MergePolicy::NonDefaultWins`], a real actual beats a default
/// one in either direction. When both actuals are real and differ, the
/// incoming line wins (the most recent non-default actual) and the
/// returned conflict carries both alternatives for human resolution.
///
/// Matching lines up is the orchestrator's job; callers must only pass
/// lines whose keys already match.
pub fn merge_kpi_lines(
    existing: &KpiLine,
    incoming: &KpiLine,
    source: &str,
    policy: MergePolicy,
) -> (KpiLine, Option<Conflict>) {
    match policy {
        MergePolicy::LastWins => (incoming.clone(), None),
        MergePolicy::FirstWins => (existing.clone(), None),
        MergePolicy::NonDefaultWins => {
            if is_default(&incoming.actual, FieldKind::Numeric) {
                return (existing.clone(), None);
            }
            if is_default(&existing.actual, FieldKind::Numeric) {
                return (incoming.clone(), None);
            }
            if existing.actual == incoming.actual {
                return (existing.clone(), None);
            }
            let conflict = Conflict::between(
                SectionPath::root("kpi_lines").kpi(existing.key()),
                "actual",
                existing.actual.clone(),
                incoming.actual.clone(),
                source,
            );
            (incoming.clone(), Some(conflict))
        }
    }
}
