use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;

use crate::answer::{AnswerNode, AnswerTree};
use crate::kpi::KpiLine;

/// One contributor's full scorecard record.
///
/// Snapshots are read-only inputs to the merge; the engine deep-copies
/// whatever it keeps, so mutating a snapshot after merging never alters
/// an already-produced result.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    /// Report identity (department, scope, period) as flat scalar fields.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub meta: BTreeMap<String, Value>,
    /// Current-scope answers, keyed by question identifier.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub answers: AnswerTree,
    /// All scopes the author touched, keyed by composite scope label.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub per_scope_answers: BTreeMap<String, AnswerTree>,
    /// KPI actuals, identified by (area, category, sub-category).
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub kpi_lines: Vec<KpiLine>,
    /// Free-text notes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    /// Opaque output of the external narrative generator.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub narrative_result: Option<Value>,
}

impl Snapshot {
    /// Decode a snapshot document leniently.
    ///
    /// A section with the wrong shape is treated as empty and recorded as
    /// a [`SectionIssue`]; decoding itself never fails. This keeps one
    /// malformed file from blocking reconciliation of everyone else's
    /// work.
    pub fn from_document(doc: &Value) -> ParsedSnapshot {
        let mut issues = Vec::new();

        let Some(root) = doc.as_object() else {
            push_issue(&mut issues, Section::Document, json_kind(doc).into());
            return ParsedSnapshot {
                snapshot: Snapshot::default(),
                issues,
            };
        };

        let mut snapshot = Snapshot::default();

        match root.get("meta") {
            None | Some(Value::Null) => {}
            Some(Value::Object(map)) => {
                snapshot.meta = map
                    .iter()
                    .map(|(k, v)| (k.clone(), v.clone()))
                    .collect();
            }
            Some(other) => push_issue(&mut issues, Section::Meta, json_kind(other).into()),
        }

        match root.get("answers") {
            None | Some(Value::Null) => {}
            Some(Value::Object(map)) => {
                snapshot.answers = map
                    .iter()
                    .map(|(k, v)| (k.clone(), AnswerNode::from(v.clone())))
                    .collect();
            }
            Some(other) => push_issue(&mut issues, Section::Answers, json_kind(other).into()),
        }

        match root.get("per_scope_answers") {
            None | Some(Value::Null) => {}
            Some(Value::Object(scopes)) => {
                for (scope, bucket) in scopes {
                    match bucket {
                        Value::Object(map) => {
                            let tree: AnswerTree = map
                                .iter()
                                .map(|(k, v)| (k.clone(), AnswerNode::from(v.clone())))
                                .collect();
                            snapshot.per_scope_answers.insert(scope.clone(), tree);
                        }
                        other => push_issue(
                            &mut issues,
                            Section::PerScopeAnswers,
                            format!("{} for scope \"{scope}\"", json_kind(other)),
                        ),
                    }
                }
            }
            Some(other) => {
                push_issue(&mut issues, Section::PerScopeAnswers, json_kind(other).into())
            }
        }

        match root.get("kpi_lines") {
            None | Some(Value::Null) => {}
            Some(Value::Array(items)) => {
                for item in items {
                    match serde_json::from_value::<KpiLine>(item.clone()) {
                        Ok(line) => snapshot.kpi_lines.push(line),
                        Err(_) => push_issue(
                            &mut issues,
                            Section::KpiLines,
                            format!("unusable {} line", json_kind(item)),
                        ),
                    }
                }
            }
            Some(other) => push_issue(&mut issues, Section::KpiLines, json_kind(other).into()),
        }

        match root.get("notes") {
            None | Some(Value::Null) => {}
            Some(Value::String(text)) => snapshot.notes = Some(text.clone()),
            Some(other) => push_issue(&mut issues, Section::Notes, json_kind(other).into()),
        }

        // The narrative is opaque to the engine; any non-null shape is
        // carried through verbatim.
        match root.get("narrative_result") {
            None | Some(Value::Null) => {}
            Some(blob) => snapshot.narrative_result = Some(blob.clone()),
        }

        ParsedSnapshot { snapshot, issues }
    }

    /// Serialize back to the document shape [`from_document`] accepts, so
    /// a merged record can be re-submitted as a new snapshot.
    ///
    /// [`from_document`]: Snapshot::from_document
    pub fn to_document(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}

fn push_issue(issues: &mut Vec<SectionIssue>, section: Section, found: String) {
    warn!("treating malformed {} section as empty: found {}", section, found);
    issues.push(SectionIssue { section, found });
}

/// A recognized top-level region of a snapshot document.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Section {
    /// The whole record (used when the document itself is not a mapping).
    Document,
    Meta,
    Answers,
    PerScopeAnswers,
    KpiLines,
    Notes,
}

impl Section {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Document => "document",
            Self::Meta => "meta",
            Self::Answers => "answers",
            Self::PerScopeAnswers => "per_scope_answers",
            Self::KpiLines => "kpi_lines",
            Self::Notes => "notes",
        }
    }
}

impl fmt::Display for Section {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A section that could not be decoded and was treated as empty.
///
/// Distinguishes "the author supplied nothing" (no issue recorded) from
/// "the author supplied something unusable" (issue recorded), so
/// degradation is observable rather than silent.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SectionIssue {
    pub section: Section,
    /// Short description of what was found instead of the expected shape.
    pub found: String,
}

/// Outcome of leniently decoding one snapshot document.
#[derive(Clone, Debug, PartialEq)]
pub struct ParsedSnapshot {
    pub snapshot: Snapshot,
    pub issues: Vec<SectionIssue>,
}

impl ParsedSnapshot {
    /// Returns `true` if every supplied section decoded cleanly.
    pub fn is_clean(&self) -> bool {
        self.issues.is_empty()
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn document() -> Value {
        json!({
            "meta": {"department": "Finance", "period": "2025-06"},
            "answers": {
                "q1": {"primary": "yes", "description": "on track"},
                "q2": {"primary": 5}
            },
            "per_scope_answers": {
                "Finance::EMEA": {"q1": {"primary": "no"}}
            },
            "kpi_lines": [
                {"area": "Finance", "category": "Revenue", "sub_category": "Recurring", "actual": 100000}
            ],
            "notes": "first draft"
        })
    }

    #[test]
    fn well_formed_document_is_clean() {
        let parsed = Snapshot::from_document(&document());
        assert!(parsed.is_clean());
        assert_eq!(parsed.snapshot.meta.len(), 2);
        assert_eq!(parsed.snapshot.answers.len(), 2);
        assert_eq!(parsed.snapshot.per_scope_answers.len(), 1);
        assert_eq!(parsed.snapshot.kpi_lines.len(), 1);
        assert_eq!(parsed.snapshot.notes.as_deref(), Some("first draft"));
    }

    #[test]
    fn missing_sections_are_empty_not_issues() {
        let parsed = Snapshot::from_document(&json!({}));
        assert!(parsed.is_clean());
        assert_eq!(parsed.snapshot, Snapshot::default());
    }

    #[test]
    fn wrong_typed_section_degrades_to_empty() {
        let parsed = Snapshot::from_document(&json!({
            "answers": "not a mapping",
            "kpi_lines": [{"area": "Ops", "category": "T", "sub_category": "D", "actual": 1}]
        }));
        assert!(parsed.snapshot.answers.is_empty());
        assert_eq!(parsed.snapshot.kpi_lines.len(), 1);
        assert_eq!(parsed.issues.len(), 1);
        assert_eq!(parsed.issues[0].section, Section::Answers);
        assert_eq!(parsed.issues[0].found, "string");
    }

    #[test]
    fn malformed_scope_bucket_skips_only_that_bucket() {
        let parsed = Snapshot::from_document(&json!({
            "per_scope_answers": {
                "Finance::EMEA": {"q1": {"primary": 1}},
                "Finance::APAC": 42
            }
        }));
        assert_eq!(parsed.snapshot.per_scope_answers.len(), 1);
        assert!(parsed.snapshot.per_scope_answers.contains_key("Finance::EMEA"));
        assert_eq!(parsed.issues.len(), 1);
        assert_eq!(parsed.issues[0].section, Section::PerScopeAnswers);
        assert!(parsed.issues[0].found.contains("Finance::APAC"));
    }

    #[test]
    fn unusable_kpi_line_skips_only_that_line() {
        let parsed = Snapshot::from_document(&json!({
            "kpi_lines": [
                {"area": "Ops", "category": "T", "sub_category": "D", "actual": 1},
                "garbage",
                {"category": "missing area"}
            ]
        }));
        assert_eq!(parsed.snapshot.kpi_lines.len(), 1);
        assert_eq!(parsed.issues.len(), 2);
        assert!(parsed.issues.iter().all(|i| i.section == Section::KpiLines));
    }

    #[test]
    fn non_object_document_is_fully_degraded() {
        let parsed = Snapshot::from_document(&json!([1, 2, 3]));
        assert_eq!(parsed.snapshot, Snapshot::default());
        assert_eq!(parsed.issues.len(), 1);
        assert_eq!(parsed.issues[0].section, Section::Document);
        assert_eq!(parsed.issues[0].found, "array");
    }

    #[test]
    fn document_roundtrip() {
        let doc = document();
        let parsed = Snapshot::from_document(&doc);
        let back = parsed.snapshot.to_document();
        assert_eq!(back, doc);
        let reparsed = Snapshot::from_document(&back);
        assert_eq!(reparsed.snapshot, parsed.snapshot);
    }

    #[test]
    fn narrative_blob_carried_verbatim() {
        let parsed = Snapshot::from_document(&json!({
            "narrative_result": {"model": "ext", "text": "All good."}
        }));
        assert_eq!(
            parsed.snapshot.narrative_result,
            Some(json!({"model": "ext", "text": "All good."}))
        );
    }
}
