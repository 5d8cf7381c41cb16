//! Reading the input document and rendering the result.

use std::path::Path;

use serde_json::Value;

use common::{ObjError, PlainObject};

/// Read `path` and parse it as a flat JSON object.
///
/// # Errors
///
/// Returns [`ObjError::InputParse`] if the file cannot be read, is not valid
/// JSON, or its top-level value is not an object.
pub async fn read_object(path: &Path) -> Result<PlainObject, ObjError> {
    let bytes = tokio::fs::read(path).await.map_err(|e| parse_error(path, e))?;

    match serde_json::from_slice::<Value>(&bytes).map_err(|e| parse_error(path, e))? {
        Value::Object(map) => Ok(map),
        _ => Err(parse_error(path, "top-level value must be a JSON object")),
    }
}

/// Render `obj` as JSON indented by two spaces.
pub fn render(obj: &PlainObject) -> Result<String, ObjError> {
    serde_json::to_string_pretty(obj).map_err(|e| ObjError::Serialization(e.to_string()))
}

fn parse_error(path: &Path, detail: impl std::fmt::Display) -> ObjError {
    ObjError::InputParse(format!(
        "error while opening & parsing file {}: {detail}",
        path.display()
    ))
}
