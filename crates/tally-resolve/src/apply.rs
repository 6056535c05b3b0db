use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;

use tally_types::{
    find_match, AnswerNode, AnswerTree, Conflict, KpiKey, PathSegment, SectionPath, Snapshot,
};

/// Why a requested resolution could not be applied.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum SkipReason {
    /// The conflict index does not exist in the conflict list.
    UnknownConflict,
    /// The chosen value index is out of range for that conflict.
    ChoiceOutOfRange { choice: usize, available: usize },
    /// The conflict addresses a KPI line no longer present.
    UnmatchedKpi(KpiKey),
    /// The conflict's path no longer leads to a mapping in the record.
    UnmatchedPath(SectionPath),
}

/// A resolution that was requested but not applied.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SkippedResolution {
    pub conflict_index: usize,
    pub reason: SkipReason,
}

/// The result of applying chosen resolutions to a merged record.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ApplyOutcome {
    pub snapshot: Snapshot,
    /// Number of resolutions applied.
    pub applied: usize,
    /// Requested resolutions that were no-ops. A stale choice must not
    /// corrupt the record, but it stays observable for audit.
    pub skipped: Vec<SkippedResolution>,
}

/// Rewrite `merged` so that each chosen conflict's field holds exactly
/// the chosen value.
///
/// Returns a new record; the input is not mutated. Conflicts absent from
/// `choices` keep the deterministic fallback selected at merge time.
/// Applying the same choices twice produces the same record.
pub fn apply_resolutions(
    merged: &Snapshot,
    conflicts: &[Conflict],
    choices: &BTreeMap<usize, usize>,
) -> ApplyOutcome {
    let mut snapshot = merged.clone();
    let mut applied = 0;
    let mut skipped = Vec::new();

    for (&conflict_index, &choice_index) in choices {
        let Some(conflict) = conflicts.get(conflict_index) else {
            skip(&mut skipped, conflict_index, SkipReason::UnknownConflict);
            continue;
        };
        let Some(chosen) = conflict.values.get(choice_index) else {
            skip(
                &mut skipped,
                conflict_index,
                SkipReason::ChoiceOutOfRange {
                    choice: choice_index,
                    available: conflict.values.len(),
                },
            );
            continue;
        };
        match apply_one(&mut snapshot, conflict, chosen.value.clone()) {
            Ok(()) => applied += 1,
            Err(reason) => skip(&mut skipped, conflict_index, reason),
        }
    }

    ApplyOutcome {
        snapshot,
        applied,
        skipped,
    }
}

fn skip(skipped: &mut Vec<SkippedResolution>, conflict_index: usize, reason: SkipReason) {
    warn!(
        "skipping resolution for conflict {}: {:?}",
        conflict_index, reason
    );
    skipped.push(SkippedResolution {
        conflict_index,
        reason,
    });
}

fn apply_one(snapshot: &mut Snapshot, conflict: &Conflict, value: Value) -> Result<(), SkipReason> {
    let segments = conflict.section.segments();

    // KPI conflicts address their line by composite key, not position.
    if let Some(PathSegment::Kpi(key)) = segments.last() {
        return apply_kpi(snapshot, key, &conflict.key, value);
    }

    match segments.split_first() {
        Some((PathSegment::Key(root), rest)) if root == "answers" => {
            let tree = navigate(&mut snapshot.answers, rest)
                .ok_or_else(|| SkipReason::UnmatchedPath(conflict.section.clone()))?;
            tree.insert(conflict.key.clone(), AnswerNode::from(value));
            Ok(())
        }
        Some((PathSegment::Key(root), rest)) if root == "per_scope_answers" => {
            let Some((PathSegment::Key(scope), rest)) = rest.split_first() else {
                return Err(SkipReason::UnmatchedPath(conflict.section.clone()));
            };
            let bucket = snapshot
                .per_scope_answers
                .get_mut(scope)
                .ok_or_else(|| SkipReason::UnmatchedPath(conflict.section.clone()))?;
            let tree = navigate(bucket, rest)
                .ok_or_else(|| SkipReason::UnmatchedPath(conflict.section.clone()))?;
            tree.insert(conflict.key.clone(), AnswerNode::from(value));
            Ok(())
        }
        _ => Err(SkipReason::UnmatchedPath(conflict.section.clone())),
    }
}

fn apply_kpi(
    snapshot: &mut Snapshot,
    key: &KpiKey,
    field: &str,
    value: Value,
) -> Result<(), SkipReason> {
    let at = find_match(&snapshot.kpi_lines, key).ok_or_else(|| SkipReason::UnmatchedKpi(key.clone()))?;
    let line = &mut snapshot.kpi_lines[at];
    if field == "actual" {
        line.actual = value;
    } else {
        line.extra.insert(field.to_string(), value);
    }
    Ok(())
}

fn navigate<'a>(root: &'a mut AnswerTree, segments: &[PathSegment]) -> Option<&'a mut AnswerTree> {
    let mut current = root;
    for segment in segments {
        let PathSegment::Key(key) = segment else {
            return None;
        };
        current = current.get_mut(key)?.as_mapping_mut()?;
    }
    Some(current)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn choices(pairs: &[(usize, usize)]) -> BTreeMap<usize, usize> {
        pairs.iter().copied().collect()
    }

    fn merged_with_kpi_conflict() -> (Snapshot, Vec<Conflict>) {
        let parsed = Snapshot::from_document(&json!({
            "kpi_lines": [
                {"area": "f", "category": "r", "sub_category": "s", "actual": 150}
            ]
        }));
        let conflicts = vec![Conflict::between(
            SectionPath::root("kpi_lines").kpi(KpiKey::new("f", "r", "s")),
            "actual",
            json!(100),
            json!(150),
            "second.json",
        )];
        (parsed.snapshot, conflicts)
    }

    #[test]
    fn choosing_the_previous_value_restores_it() {
        let (merged, conflicts) = merged_with_kpi_conflict();
        let outcome = apply_resolutions(&merged, &conflicts, &choices(&[(0, 0)]));
        assert_eq!(outcome.snapshot.kpi_lines[0].actual, json!(100));
        assert_eq!(outcome.applied, 1);
        assert!(outcome.skipped.is_empty());
    }

    #[test]
    fn choosing_the_incoming_value_keeps_it() {
        let (merged, conflicts) = merged_with_kpi_conflict();
        let outcome = apply_resolutions(&merged, &conflicts, &choices(&[(0, 1)]));
        assert_eq!(outcome.snapshot.kpi_lines[0].actual, json!(150));
    }

    #[test]
    fn resolved_record_roundtrips_through_serialization() {
        let (merged, conflicts) = merged_with_kpi_conflict();
        let outcome = apply_resolutions(&merged, &conflicts, &choices(&[(0, 0)]));
        let doc = outcome.snapshot.to_document();
        let reparsed = Snapshot::from_document(&doc);
        assert!(reparsed.is_clean());
        assert_eq!(reparsed.snapshot.kpi_lines[0].actual, json!(100));
    }

    #[test]
    fn input_record_is_not_mutated() {
        let (merged, conflicts) = merged_with_kpi_conflict();
        let _ = apply_resolutions(&merged, &conflicts, &choices(&[(0, 0)]));
        assert_eq!(merged.kpi_lines[0].actual, json!(150));
    }

    #[test]
    fn applying_twice_is_idempotent() {
        let (merged, conflicts) = merged_with_kpi_conflict();
        let selection = choices(&[(0, 0)]);
        let once = apply_resolutions(&merged, &conflicts, &selection);
        let twice = apply_resolutions(&once.snapshot, &conflicts, &selection);
        assert_eq!(once.snapshot, twice.snapshot);
    }

    #[test]
    fn unresolved_conflicts_keep_the_merge_fallback() {
        let (merged, conflicts) = merged_with_kpi_conflict();
        let outcome = apply_resolutions(&merged, &conflicts, &choices(&[]));
        assert_eq!(outcome.snapshot, merged);
        assert_eq!(outcome.applied, 0);
    }

    #[test]
    fn out_of_range_choice_is_skipped_not_fatal() {
        let (merged, conflicts) = merged_with_kpi_conflict();
        let outcome = apply_resolutions(&merged, &conflicts, &choices(&[(0, 9)]));
        assert_eq!(outcome.snapshot, merged);
        assert_eq!(
            outcome.skipped,
            vec![SkippedResolution {
                conflict_index: 0,
                reason: SkipReason::ChoiceOutOfRange {
                    choice: 9,
                    available: 2
                },
            }]
        );
    }

    #[test]
    fn unknown_conflict_index_is_skipped() {
        let (merged, conflicts) = merged_with_kpi_conflict();
        let outcome = apply_resolutions(&merged, &conflicts, &choices(&[(7, 0)]));
        assert_eq!(outcome.skipped.len(), 1);
        assert_eq!(outcome.skipped[0].reason, SkipReason::UnknownConflict);
    }

    #[test]
    fn vanished_kpi_line_is_an_observable_no_op() {
        let (_, conflicts) = merged_with_kpi_conflict();
        let empty = Snapshot::default();
        let outcome = apply_resolutions(&empty, &conflicts, &choices(&[(0, 0)]));
        assert_eq!(outcome.applied, 0);
        assert_eq!(
            outcome.skipped[0].reason,
            SkipReason::UnmatchedKpi(KpiKey::new("f", "r", "s"))
        );
    }

    #[test]
    fn answer_conflicts_resolve_through_the_structured_path() {
        let parsed = Snapshot::from_document(&json!({
            "answers": {"group": {"q1": {"primary": "alpha"}}}
        }));
        let conflicts = vec![Conflict::between(
            SectionPath::root("answers").child("group").child("q1"),
            "primary",
            json!("alpha"),
            json!("beta"),
            "b.json",
        )];
        let outcome = apply_resolutions(&parsed.snapshot, &conflicts, &choices(&[(0, 1)]));
        assert_eq!(outcome.applied, 1);
        let group = outcome.snapshot.answers["group"].as_mapping().unwrap();
        let q1 = group["q1"].as_mapping().unwrap();
        assert_eq!(q1["primary"], AnswerNode::Scalar(json!("beta")));
    }

    #[test]
    fn per_scope_conflicts_resolve_inside_their_bucket() {
        let parsed = Snapshot::from_document(&json!({
            "per_scope_answers": {"Fin::EMEA": {"q1": {"primary": "a"}}}
        }));
        let conflicts = vec![Conflict::between(
            SectionPath::root("per_scope_answers")
                .child("Fin::EMEA")
                .child("q1"),
            "primary",
            json!("a"),
            json!("b"),
            "b.json",
        )];
        let outcome = apply_resolutions(&parsed.snapshot, &conflicts, &choices(&[(0, 1)]));
        assert_eq!(outcome.applied, 1);
        let bucket = &outcome.snapshot.per_scope_answers["Fin::EMEA"];
        let q1 = bucket["q1"].as_mapping().unwrap();
        assert_eq!(q1["primary"], AnswerNode::Scalar(json!("b")));
    }

    #[test]
    fn dangling_answer_path_is_skipped() {
        let parsed = Snapshot::from_document(&json!({"answers": {}}));
        let section = SectionPath::root("answers").child("gone").child("deeper");
        let conflicts = vec![Conflict::between(
            section.clone(),
            "primary",
            json!(1),
            json!(2),
            "b.json",
        )];
        let outcome = apply_resolutions(&parsed.snapshot, &conflicts, &choices(&[(0, 0)]));
        assert_eq!(outcome.applied, 0);
        assert_eq!(outcome.skipped[0].reason, SkipReason::UnmatchedPath(section));
    }
}
