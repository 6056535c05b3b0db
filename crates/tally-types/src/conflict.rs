use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::kpi::KpiKey;

/// Provenance label for the value already held by the accumulator when a
/// disagreement is first recorded.
pub const PREVIOUS_SOURCE: &str = "previous";

/// One step in a structured path into a merged snapshot.
///
/// Paths address fields structurally rather than through a joined display
/// string, so a key that happens to contain a separator character cannot
/// misaddress a resolution.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum PathSegment {
    /// Descend into a mapping by key.
    Key(String),
    /// Select a KPI line by composite key.
    Kpi(KpiKey),
}

/// Structured address of the mapping or line that holds a conflicted
/// field. The `Display` form is for humans only; resolution navigates
/// the segments.
#[derive(Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SectionPath(pub Vec<PathSegment>);

impl SectionPath {
    /// A path rooted at a top-level section.
    pub fn root(section: impl Into<String>) -> Self {
        Self(vec![PathSegment::Key(section.into())])
    }

    /// This path extended by a mapping key.
    pub fn child(&self, key: impl Into<String>) -> Self {
        let mut segments = self.0.clone();
        segments.push(PathSegment::Key(key.into()));
        Self(segments)
    }

    /// This path extended by a KPI composite key.
    pub fn kpi(&self, key: KpiKey) -> Self {
        let mut segments = self.0.clone();
        segments.push(PathSegment::Kpi(key));
        Self(segments)
    }

    pub fn segments(&self) -> &[PathSegment] {
        &self.0
    }
}

impl fmt::Display for SectionPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, segment) in self.0.iter().enumerate() {
            match segment {
                PathSegment::Key(key) => {
                    if i > 0 {
                        write!(f, ".")?;
                    }
                    write!(f, "{key}")?;
                }
                PathSegment::Kpi(key) => write!(f, "[{key}]")?,
            }
        }
        Ok(())
    }
}

/// One alternative recorded in a conflict, tagged with its provenance.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ConflictValue {
    pub value: Value,
    pub source: String,
}

impl ConflictValue {
    pub fn new(value: impl Into<Value>, source: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            source: source.into(),
        }
    }
}

/// A field where two or more snapshots supplied differing real values.
///
/// Immutable once the merge completes. `section` plus `key` address the
/// field unambiguously inside the merged snapshot; `values` lists the
/// alternatives in discovery order.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Conflict {
    pub section: SectionPath,
    pub key: String,
    pub values: Vec<ConflictValue>,
}

impl Conflict {
    /// A freshly discovered two-way disagreement: the accumulator's value
    /// labeled [`PREVIOUS_SOURCE`], then the incoming value.
    pub fn between(
        section: SectionPath,
        key: impl Into<String>,
        previous: Value,
        incoming: Value,
        source: impl Into<String>,
    ) -> Self {
        Self {
            section,
            key: key.into(),
            values: vec![
                ConflictValue::new(previous, PREVIOUS_SOURCE),
                ConflictValue::new(incoming, source),
            ],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn display_dots_mapping_keys() {
        let path = SectionPath::root("answers").child("finance").child("q1");
        assert_eq!(path.to_string(), "answers.finance.q1");
    }

    #[test]
    fn display_brackets_kpi_segment() {
        let path =
            SectionPath::root("kpi_lines").kpi(KpiKey::new("Ops", "Throughput", "Daily"));
        assert_eq!(path.to_string(), "kpi_lines[Ops / Throughput / Daily]");
    }

    #[test]
    fn dotted_keys_stay_distinct_structurally() {
        // "a.b" as one key and "a" -> "b" as two keys render identically,
        // but the structured paths never compare equal.
        let joined = SectionPath::root("a.b");
        let nested = SectionPath::root("a").child("b");
        assert_eq!(joined.to_string(), nested.to_string());
        assert_ne!(joined, nested);
    }

    #[test]
    fn between_labels_previous_first() {
        let conflict = Conflict::between(
            SectionPath::root("answers"),
            "q1",
            json!(100),
            json!(150),
            "draft-b.json",
        );
        assert_eq!(conflict.values.len(), 2);
        assert_eq!(conflict.values[0].source, PREVIOUS_SOURCE);
        assert_eq!(conflict.values[0].value, json!(100));
        assert_eq!(conflict.values[1].source, "draft-b.json");
    }

    #[test]
    fn serde_roundtrip() {
        let conflict = Conflict::between(
            SectionPath::root("kpi_lines").kpi(KpiKey::new("a", "b", "c")),
            "actual",
            json!(1),
            json!(2),
            "s2",
        );
        let encoded = serde_json::to_string(&conflict).unwrap();
        let decoded: Conflict = serde_json::from_str(&encoded).unwrap();
        assert_eq!(conflict, decoded);
    }
}
