//! YAML document helpers shared by both codecs.
//!
//! Decoding is two-phase: text is parsed into an untyped value (failures are
//! [`CodecError::Parse`]), then required keys are checked and the value is
//! converted into typed records (failures are [`CodecError::Schema`]).

use super::CodecError;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_yaml::{Mapping, Value};

/// Parse a single-document file.
pub(crate) fn parse_document(file: &str, text: &str) -> Result<Value, CodecError> {
    serde_yaml::from_str(text).map_err(|e| CodecError::parse(file, e.to_string()))
}

/// Parse a multi-document stream, skipping empty documents.
pub(crate) fn parse_documents(file: &str, text: &str) -> Result<Vec<Value>, CodecError> {
    let mut docs = Vec::new();
    for document in serde_yaml::Deserializer::from_str(text) {
        let value = Value::deserialize(document).map_err(|e| CodecError::parse(file, e.to_string()))?;
        if !value.is_null() {
            docs.push(value);
        }
    }
    Ok(docs)
}

/// View a value as a mapping or fail with a schema error at `path`.
pub(crate) fn as_mapping<'a>(
    file: &str,
    path: &str,
    value: &'a Value,
) -> Result<&'a Mapping, CodecError> {
    value
        .as_mapping()
        .ok_or_else(|| CodecError::schema(file, path, format!("expected a mapping, found {}", kind_of(value))))
}

/// Look up a required key of a mapping value.
pub(crate) fn require_key<'a>(
    file: &str,
    path: &str,
    value: &'a Value,
    key: &str,
) -> Result<&'a Value, CodecError> {
    let mapping = as_mapping(file, path, value)?;
    mapping
        .get(key)
        .ok_or_else(|| CodecError::schema(file, join_path(path, key), "required field is missing"))
}

/// Check every listed key is present before attempting typed conversion, so
/// a missing field is reported by its full path.
pub(crate) fn require_keys(
    file: &str,
    path: &str,
    value: &Value,
    keys: &[&str],
) -> Result<(), CodecError> {
    for key in keys {
        require_key(file, path, value, key)?;
    }
    Ok(())
}

/// View a value as a list or fail with a schema error at `path`.
pub(crate) fn as_sequence<'a>(
    file: &str,
    path: &str,
    value: &'a Value,
) -> Result<&'a [Value], CodecError> {
    value
        .as_sequence()
        .map(Vec::as_slice)
        .ok_or_else(|| CodecError::schema(file, path, format!("expected a list, found {}", kind_of(value))))
}

/// Convert an untyped value into a typed record.
pub(crate) fn typed<T: DeserializeOwned>(
    file: &str,
    path: &str,
    value: &Value,
) -> Result<T, CodecError> {
    serde_yaml::from_value(value.clone()).map_err(|e| CodecError::schema(file, path, e.to_string()))
}

/// Serialize a value to YAML text.
pub(crate) fn to_yaml<T: Serialize>(file: &str, value: &T) -> Result<String, CodecError> {
    serde_yaml::to_string(value).map_err(|e| CodecError::Encode {
        file: file.to_string(),
        message: e.to_string(),
    })
}

/// Join serialized documents into one multi-document stream.
pub(crate) fn join_documents(docs: &[String]) -> String {
    docs.join("---\n")
}

fn join_path(path: &str, key: &str) -> String {
    if path.is_empty() {
        key.to_string()
    } else {
        format!("{path}.{key}")
    }
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "nothing",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Sequence(_) => "a list",
        Value::Mapping(_) => "a mapping",
        Value::Tagged(_) => "a tagged value",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_error_names_file() {
        let err = parse_document("servers.yaml", "servers: [unclosed").unwrap_err();
        assert!(matches!(err, CodecError::Parse { ref file, .. } if file == "servers.yaml"));
    }

    #[test]
    fn test_require_key_path() {
        let value = parse_document("f.yaml", "spec:\n  role: leaf\n").unwrap();
        let spec = require_key("f.yaml", "", &value, "spec").unwrap();
        let err = require_key("f.yaml", "spec", spec, "model").unwrap_err();
        assert_eq!(err, CodecError::schema("f.yaml", "spec.model", "required field is missing"));
    }

    #[test]
    fn test_non_mapping_root() {
        let value = parse_document("f.yaml", "just a string").unwrap();
        let err = require_key("f.yaml", "", &value, "servers").unwrap_err();
        match err {
            CodecError::Schema { field, message, .. } => {
                assert_eq!(field, "");
                assert!(message.contains("a string"));
            }
            other => panic!("expected schema error, got {other:?}"),
        }
    }

    #[test]
    fn test_multi_document_skips_empty() {
        let docs = parse_documents("f.yaml", "---\na: 1\n---\n---\nb: 2\n").unwrap();
        assert_eq!(docs.len(), 2);
    }
}
