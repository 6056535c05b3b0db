//! Default-vs-real value classification.
//!
//! A "default" value is one indistinguishable from a field nobody
//! touched. Defaults never beat real values during a merge and never
//! participate in conflicts.

use serde_json::Value;

/// How a field's values are interpreted when deciding defaultness.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FieldKind {
    /// Numeric actuals: any spelling that converts to zero is a default.
    Numeric,
    /// Everything else: empty or whitespace-only text is a default.
    Text,
}

/// Decide whether `value` is a default (effectively untouched) value.
///
/// Classification never fails. Input that cannot be classified is
/// treated as real, so unusual data surfaces as a conflict for a human
/// instead of being silently discarded.
pub fn is_default(value: &Value, kind: FieldKind) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(_) => false,
        Value::Number(n) => match kind {
            FieldKind::Numeric => n.as_f64() == Some(0.0),
            FieldKind::Text => false,
        },
        Value::String(s) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                return true;
            }
            match kind {
                FieldKind::Numeric => trimmed.parse::<f64>().map(|n| n == 0.0).unwrap_or(false),
                FieldKind::Text => false,
            }
        }
        Value::Array(items) => items.is_empty(),
        Value::Object(map) => map.is_empty(),
    }
}
