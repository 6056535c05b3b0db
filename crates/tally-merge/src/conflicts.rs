use std::collections::BTreeMap;

use tally_types::{Conflict, SectionPath};
use tracing::debug;

/// Discovery-ordered conflict accumulator.
///
/// Keeps one conflict per (section, key) address across the whole fold:
/// a later disagreement at an address that already conflicted extends
/// the existing record with any value not yet listed, rather than
/// opening a second conflict for the same field.
#[derive(Debug, Default)]
pub struct ConflictSet {
    conflicts: Vec<Conflict>,
    index: BTreeMap<(SectionPath, String), usize>,
}

impl ConflictSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a disagreement, merging into the existing conflict at the
    /// same address if there is one.
    pub fn record(&mut self, conflict: Conflict) {
        let address = (conflict.section.clone(), conflict.key.clone());
        match self.index.get(&address).copied() {
            Some(at) => {
                let existing = &mut self.conflicts[at];
                for candidate in conflict.values {
                    if existing.values.iter().all(|v| v.value != candidate.value) {
                        existing.values.push(candidate);
                    }
                }
            }
            None => {
                debug!(
                    "conflict at {} key {} ({} alternatives)",
                    conflict.section,
                    conflict.key,
                    conflict.values.len()
                );
                self.index.insert(address, self.conflicts.len());
                self.conflicts.push(conflict);
            }
        }
    }

    pub fn len(&self) -> usize {
        self.conflicts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.conflicts.is_empty()
    }

    /// The accumulated conflicts, in discovery order.
    pub fn into_vec(self) -> Vec<Conflict> {
        self.conflicts
    }
}
