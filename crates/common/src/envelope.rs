//! Plain and transformed object shapes.
//!
//! A transformed object keeps every unselected key in place and adds one
//! reserved key, [`ENCRYPTED_KEY`], holding the ciphertexts of the selected
//! keys:
//!
//! ```text
//! { "a": 1, "b": "x" }  --select b-->  { "a": 1, "_encrypted": { "b": "<base64>" } }
//! ```

use std::collections::BTreeSet;

use serde_json::{Map, Value};

use crate::error::ObjError;

/// Reserved top-level key under which ciphertexts are nested.
pub const ENCRYPTED_KEY: &str = "_encrypted";

/// Flat JSON object. Iteration order is insertion order.
pub type PlainObject = Map<String, Value>;

/// Mapping from original key name to base64 ciphertext.
pub type EncryptedEnvelope = Map<String, Value>;

/// Set of key names whose values are moved into the envelope.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KeySelection(BTreeSet<String>);

impl KeySelection {
    /// Parse a comma-separated key list such as `"password,token"`.
    ///
    /// Empty segments are dropped; the rest are taken verbatim, so key names
    /// with surrounding whitespace remain addressable.
    pub fn parse_list(list: &str) -> Self {
        list.split(',').filter(|k| !k.is_empty()).collect()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.0.contains(key)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }
}

impl<S: Into<String>> FromIterator<S> for KeySelection {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self(iter.into_iter().map(Into::into).collect())
    }
}

/// Borrow the `(key, ciphertext)` pairs held under [`ENCRYPTED_KEY`].
///
/// # Errors
///
/// Returns [`ObjError::MalformedEnvelope`] if the envelope is absent, is not
/// an object, or holds a non-string entry.
pub fn envelope_entries(obj: &PlainObject) -> Result<Vec<(&str, &str)>, ObjError> {
    let envelope = match obj.get(ENCRYPTED_KEY) {
        Some(Value::Object(map)) => map,
        Some(other) => {
            return Err(ObjError::MalformedEnvelope(format!(
                "{ENCRYPTED_KEY} must be an object, found {}",
                json_type_name(other)
            )))
        }
        None => {
            return Err(ObjError::MalformedEnvelope(format!(
                "{ENCRYPTED_KEY} is missing"
            )))
        }
    };

    envelope
        .iter()
        .map(|(key, value)| match value {
            Value::String(ciphertext) => Ok((key.as_str(), ciphertext.as_str())),
            other => Err(ObjError::MalformedEnvelope(format!(
                "ciphertext for {key} must be a string, found {}",
                json_type_name(other)
            ))),
        })
        .collect()
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
