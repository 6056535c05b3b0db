use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Composite identity of a KPI line: (area, category, sub-category).
///
/// Two lines with the same key are the same KPI regardless of their
/// position in the list or of their `actual` values. Equality is exact,
/// case-sensitive string equality; callers are expected to supply
/// already-normalized labels.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct KpiKey {
    pub area: String,
    pub category: String,
    pub sub_category: String,
}

impl KpiKey {
    pub fn new(
        area: impl Into<String>,
        category: impl Into<String>,
        sub_category: impl Into<String>,
    ) -> Self {
        Self {
            area: area.into(),
            category: category.into(),
            sub_category: sub_category.into(),
        }
    }
}

impl fmt::Display for KpiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} / {} / {}", self.area, self.category, self.sub_category)
    }
}

/// One KPI line in a scorecard.
///
/// `actual` is kept as a raw JSON value rather than a number so that
/// unusual input survives classification verbatim instead of being
/// coerced or dropped. Descriptive fields beyond the key and the actual
/// are carried through the merge unchanged in `extra`.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct KpiLine {
    pub area: String,
    pub category: String,
    pub sub_category: String,
    #[serde(default)]
    pub actual: Value,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl KpiLine {
    pub fn new(
        area: impl Into<String>,
        category: impl Into<String>,
        sub_category: impl Into<String>,
        actual: impl Into<Value>,
    ) -> Self {
        Self {
            area: area.into(),
            category: category.into(),
            sub_category: sub_category.into(),
            actual: actual.into(),
            extra: BTreeMap::new(),
        }
    }

    /// The line's composite identity.
    pub fn key(&self) -> KpiKey {
        KpiKey::new(
            self.area.clone(),
            self.category.clone(),
            self.sub_category.clone(),
        )
    }
}

/// Locate the line with the given composite key, if any.
///
/// Matching is structural and independent of list position.
pub fn find_match(candidates: &[KpiLine], key: &KpiKey) -> Option<usize> {
    candidates.iter().position(|line| line.key() == *key)
}
