//! Document parsing.
//!
//! This is a syntax-only gate: it turns raw text into a loosely typed
//! [`SaveDocument`] and rejects anything that is not a well-formed JSON object.
//! No field is inspected here.

use serde_json::{Map, Value};

use crate::errors::{DrydockError, DrydockResult};

/// A parsed, not yet migrated design document.
///
/// No invariants beyond "is a JSON object": fields may be missing, stale, or
/// unknown. Migration steps never mutate a document in place; each produces a
/// new value.
#[derive(Debug, Clone, PartialEq)]
pub struct SaveDocument(Value);

impl SaveDocument {
    /// Wrap an already parsed value. Non-object values are rejected.
    pub fn from_value(v: Value) -> DrydockResult<Self> {
        if !v.is_object() {
            return Err(DrydockError::parse(format!(
                "design document must be a JSON object, got {}",
                json_kind(&v)
            )));
        }
        Ok(Self(v))
    }

    /// Wrap a value produced by a migration step. Steps only rewrite fields
    /// inside the top-level object, so object-ness is preserved.
    pub(crate) fn from_migrated(v: Value) -> Self {
        debug_assert!(v.is_object());
        Self(v)
    }

    pub fn as_value(&self) -> &Value {
        &self.0
    }

    pub fn into_value(self) -> Value {
        self.0
    }

    /// Top-level object. Always present by construction.
    pub fn fields(&self) -> Option<&Map<String, Value>> {
        self.0.as_object()
    }
}

/// Parse raw text into a document with a hard size limit.
pub fn parse_document(raw: &str, max_bytes: usize) -> DrydockResult<SaveDocument> {
    if raw.len() > max_bytes {
        return Err(DrydockError::parse(format!(
            "document too large ({} bytes > limit {})",
            raw.len(),
            max_bytes
        )));
    }

    // Some editors prepend a byte-order mark.
    let text = raw.strip_prefix('\u{feff}').unwrap_or(raw);

    let v: Value = serde_json::from_str(text)
        .map_err(|e| DrydockError::parse(format!("failed to parse document JSON: {e}")))?;
    SaveDocument::from_value(v)
}

fn json_kind(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
