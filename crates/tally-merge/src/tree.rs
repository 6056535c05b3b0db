//! Nested-tree merger: recursively merges two answer trees, classifying
//! leaves and recording a conflict wherever two real values disagree.

use std::collections::btree_map::Entry;

use tally_types::{AnswerNode, AnswerTree, Conflict, SectionPath};

use crate::classify::{is_default, FieldKind};
use crate::conflicts::ConflictSet;
use crate::policy::MergePolicy;

/// Merge `incoming` into `target`.
///
/// Keys absent from `target` are deep-copied in. Keys present in both
/// sides recurse when both values are mappings, extending `path`;
/// otherwise the leaf `policy` applies. Conflicts are recorded against
/// the structured path, never a joined display string.
pub fn merge_into(
    target: &mut AnswerTree,
    incoming: &AnswerTree,
    source: &str,
    path: &SectionPath,
    policy: MergePolicy,
    conflicts: &mut ConflictSet,
) {
    for (key, incoming_node) in incoming {
        match target.entry(key.clone()) {
            Entry::Vacant(slot) => {
                slot.insert(incoming_node.clone());
            }
            Entry::Occupied(mut slot) => match (slot.get_mut(), incoming_node) {
                (AnswerNode::Mapping(existing_map), AnswerNode::Mapping(incoming_map)) => {
                    merge_into(
                        existing_map,
                        incoming_map,
                        source,
                        &path.child(key.as_str()),
                        policy,
                        conflicts,
                    );
                }
                (existing, incoming_node) => {
                    merge_leaf(existing, incoming_node, key, source, path, policy, conflicts);
                }
            },
        }
    }
}

fn merge_leaf(
    existing: &mut AnswerNode,
    incoming: &AnswerNode,
    key: &str,
    source: &str,
    path: &SectionPath,
    policy: MergePolicy,
    conflicts: &mut ConflictSet,
) {
    match policy {
        MergePolicy::LastWins => *existing = incoming.clone(),
        MergePolicy::FirstWins => {}
        MergePolicy::NonDefaultWins => {
            if node_is_default(incoming) {
                return;
            }
            if node_is_default(existing) {
                *existing = incoming.clone();
                return;
            }
            if existing == incoming {
                return;
            }
            // Both real, values differ: the accumulator's value stands
            // until a human resolves the conflict.
            conflicts.record(Conflict::between(
                path.clone(),
                key,
                existing.to_value(),
                incoming.to_value(),
                source,
            ));
        }
    }
}

fn node_is_default(node: &AnswerNode) -> bool {
    match node {
        AnswerNode::Mapping(map) => map.is_empty(),
        AnswerNode::Sequence(items) => items.is_empty(),
        AnswerNode::Scalar(value) => is_default(value, FieldKind::Text),
    }
}
