//! `BodyShape`: Narrowed view over an optional request body
//!
//! Request bodies arrive as arbitrary JSON. Routing only ever reads or writes
//! top-level keys of a JSON object, so every body is first narrowed into one of
//! three shapes. Anything that is not an object is opaque: routing treats it as
//! absent on every axis and never rewrites it.

use crate::{PIT, PROJECT_ROUTING};
use serde_json::{Map, Value};

/// The routing-relevant shape of a request body.
///
/// # Example
///
/// ```
/// use cps::BodyShape;
/// use serde_json::json;
///
/// let body = json!({ "pit": { "id": "abc123" } });
/// let shape = BodyShape::of(Some(&body));
/// assert!(shape.is_point_in_time());
///
/// let ndjson = json!([{ "index": "logs" }, { "query": {} }]);
/// assert!(BodyShape::of(Some(&ndjson)).is_opaque());
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BodyShape<'a> {
    /// No body at all.
    Absent,
    /// A JSON object: the only shape routing reads or writes.
    Record(&'a Map<String, Value>),
    /// Any other JSON value (array, string, number, bool, null).
    Opaque(&'a Value),
}

impl<'a> BodyShape<'a> {
    /// Narrow an optional body.
    #[must_use]
    pub fn of(body: Option<&'a Value>) -> Self {
        match body {
            None => Self::Absent,
            Some(Value::Object(map)) => Self::Record(map),
            Some(other) => Self::Opaque(other),
        }
    }

    /// Returns the record if this body is a JSON object.
    #[inline]
    #[must_use]
    pub fn as_record(&self) -> Option<&'a Map<String, Value>> {
        match self {
            Self::Record(map) => Some(map),
            _ => None,
        }
    }

    /// Returns `true` for [`BodyShape::Absent`].
    #[inline]
    #[must_use]
    pub fn is_absent(&self) -> bool {
        matches!(self, Self::Absent)
    }

    /// Returns `true` for [`BodyShape::Opaque`].
    #[inline]
    #[must_use]
    pub fn is_opaque(&self) -> bool {
        matches!(self, Self::Opaque(_))
    }

    /// Returns `true` when the record carries a `pit` key.
    ///
    /// The value itself is not inspected: the presence of the key is what marks
    /// a point-in-time search.
    #[must_use]
    pub fn is_point_in_time(&self) -> bool {
        self.as_record().is_some_and(|map| map.contains_key(PIT))
    }

    /// Returns the raw `project_routing` value, if the key is present.
    #[must_use]
    pub fn routing(&self) -> Option<&'a Value> {
        self.as_record().and_then(|map| map.get(PROJECT_ROUTING))
    }

    /// Returns `true` when the caller already supplied a non-empty routing value.
    ///
    /// Empty values (`null`, `false`, `0`, `""`) do not count and are replaced
    /// on injection.
    #[must_use]
    pub fn has_caller_routing(&self) -> bool {
        self.routing().is_some_and(is_truthy)
    }
}

/// JSON truthiness: `null`, `false`, `0` and `""` are empty, everything else is set.
///
/// ```
/// use cps::is_truthy;
/// use serde_json::json;
///
/// assert!(is_truthy(&json!("_alias:_origin")));
/// assert!(!is_truthy(&json!("")));
/// assert!(!is_truthy(&json!(null)));
/// assert!(is_truthy(&json!({})));
/// ```
#[must_use]
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0 && !f.is_nan()),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// Mutable access to the record inside an optional body.
pub(crate) fn record_mut(body: &mut Option<Value>) -> Option<&mut Map<String, Value>> {
    match body {
        Some(Value::Object(map)) => Some(map),
        _ => None,
    }
}
