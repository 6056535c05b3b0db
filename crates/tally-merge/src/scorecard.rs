//! Scorecard merge orchestrator: folds an ordered list of snapshots into
//! one merged record, dispatching each top-level section to the matching
//! merger and aggregating conflicts and statistics.

use std::collections::btree_map::Entry;
use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use tally_types::{Conflict, SectionPath, Snapshot};

use crate::classify::{is_default, FieldKind};
use crate::conflicts::ConflictSet;
use crate::kpi::{find_match, merge_kpi_lines};
use crate::policy::MergePolicy;
use crate::tree::merge_into;

/// One snapshot queued for reconciliation, tagged with provenance.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SnapshotInput {
    /// Where this snapshot came from (typically a file name); surfaced
    /// verbatim in conflict records.
    pub source: String,
    pub snapshot: Snapshot,
}

impl SnapshotInput {
    pub fn new(source: impl Into<String>, snapshot: Snapshot) -> Self {
        Self {
            source: source.into(),
            snapshot,
        }
    }
}

/// Counters describing one merge invocation.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MergeStats {
    pub snapshots: usize,
    /// Question identifiers in the merged result: top-level keys in
    /// `answers` plus each per-scope bucket.
    pub answer_keys: usize,
    pub kpi_lines: usize,
    pub conflicts: usize,
    /// Sections (across all inputs) that failed to decode and were
    /// treated as empty. Only populated by [`merge_documents`].
    pub malformed_sections: usize,
}

/// The outcome of one merge invocation. Immutable once produced; the
/// resolution applier builds a new record rather than editing this one.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MergeResult {
    pub merged: Snapshot,
    pub conflicts: Vec<Conflict>,
    pub sources: Vec<String>,
    pub stats: MergeStats,
}

/// Fold an ordered list of snapshots into one merged record.
///
/// Zero inputs produce an empty result; one input produces a deep copy
/// of it. The fold is strictly sequential: later snapshots' precedence
/// in tie-breaking depends on fold order, so it must not be parallelized.
/// Inputs are borrowed and never retained in the output.
pub fn merge(inputs: &[SnapshotInput], policy: MergePolicy) -> MergeResult {
    let sources: Vec<String> = inputs.iter().map(|input| input.source.clone()).collect();

    let mut merged = inputs
        .first()
        .map(|first| first.snapshot.clone())
        .unwrap_or_default();
    let mut conflicts = ConflictSet::new();

    for input in inputs.iter().skip(1) {
        fold_snapshot(
            &mut merged,
            &input.snapshot,
            &input.source,
            policy,
            &mut conflicts,
        );
    }

    let conflicts = conflicts.into_vec();
    let stats = MergeStats {
        snapshots: inputs.len(),
        answer_keys: answer_key_count(&merged),
        kpi_lines: merged.kpi_lines.len(),
        conflicts: conflicts.len(),
        malformed_sections: 0,
    };

    MergeResult {
        merged,
        conflicts,
        sources,
        stats,
    }
}

/// Decode raw documents leniently, then merge them.
///
/// Sections that fail to decode are treated as empty for that snapshot
/// and counted in `stats.malformed_sections`; one malformed file never
/// blocks reconciliation of the rest.
pub fn merge_documents(documents: &[(String, Value)], policy: MergePolicy) -> MergeResult {
    let mut malformed = 0;
    let inputs: Vec<SnapshotInput> = documents
        .iter()
        .map(|(source, doc)| {
            let parsed = Snapshot::from_document(doc);
            malformed += parsed.issues.len();
            SnapshotInput::new(source.clone(), parsed.snapshot)
        })
        .collect();

    let mut result = merge(&inputs, policy);
    result.stats.malformed_sections = malformed;
    result
}

fn fold_snapshot(
    acc: &mut Snapshot,
    incoming: &Snapshot,
    source: &str,
    policy: MergePolicy,
    conflicts: &mut ConflictSet,
) {
    merge_meta(&mut acc.meta, &incoming.meta);

    merge_into(
        &mut acc.answers,
        &incoming.answers,
        source,
        &SectionPath::root("answers"),
        policy,
        conflicts,
    );

    for (scope, bucket) in &incoming.per_scope_answers {
        match acc.per_scope_answers.entry(scope.clone()) {
            Entry::Vacant(slot) => {
                slot.insert(bucket.clone());
            }
            Entry::Occupied(mut slot) => merge_into(
                slot.get_mut(),
                bucket,
                source,
                &SectionPath::root("per_scope_answers").child(scope.as_str()),
                policy,
                conflicts,
            ),
        }
    }

    for line in &incoming.kpi_lines {
        match find_match(&acc.kpi_lines, &line.key()) {
            Some(at) => {
                let (merged_line, conflict) =
                    merge_kpi_lines(&acc.kpi_lines[at], line, source, policy);
                acc.kpi_lines[at] = merged_line;
                if let Some(conflict) = conflict {
                    conflicts.record(conflict);
                }
            }
            None => acc.kpi_lines.push(line.clone()),
        }
    }

    // A regenerated narrative supersedes an older one; an absent
    // narrative never erases one.
    if incoming.narrative_result.is_some() {
        acc.narrative_result = incoming.narrative_result.clone();
    }

    if let Some(notes) = &incoming.notes {
        if !notes.trim().is_empty() {
            match &mut acc.notes {
                Some(existing) if !existing.trim().is_empty() => {
                    existing.push_str("\n\n");
                    existing.push_str(notes);
                }
                slot => *slot = Some(notes.clone()),
            }
        }
    }
}

// Meta disagreement is not a data-loss risk worth blocking on: later
// non-empty values overwrite, empties never clobber, no conflicts.
fn merge_meta(target: &mut BTreeMap<String, Value>, incoming: &BTreeMap<String, Value>) {
    for (key, value) in incoming {
        if !is_default(value, FieldKind::Text) {
            target.insert(key.clone(), value.clone());
        }
    }
}

fn answer_key_count(snapshot: &Snapshot) -> usize {
    snapshot.answers.len()
        + snapshot
            .per_scope_answers
            .values()
            .map(|bucket| bucket.len())
            .sum::<usize>()
}
