//! Checks synthesized examples against the schema they were built from.

use serde_json::Value;

use crate::error::{SchemaError, ValidateError};
use crate::loader::SchemaDocument;

/// Validate an example against a schema node of `doc`.
///
/// The document's `definitions` are attached to the compiled schema so that
/// `#/definitions/...` references resolve.
///
/// # Errors
///
/// Returns `ValidateError::Schema` if the node cannot be compiled, or
/// `ValidateError::Invalid` if the example does not match it.
pub fn validate_example(
    doc: &SchemaDocument,
    schema: &Value,
    example: &Value,
) -> Result<(), ValidateError> {
    let compiled = with_definitions(doc, schema);
    let validator = jsonschema::validator_for(&compiled).map_err(|e| ValidateError::Schema {
        message: e.to_string(),
    })?;

    let errors: Vec<SchemaError> = validator
        .iter_errors(example)
        .map(|e| SchemaError {
            path: e.instance_path.to_string(),
            message: e.to_string(),
        })
        .collect();

    if errors.is_empty() {
        Ok(())
    } else {
        Err(ValidateError::Invalid { errors })
    }
}

fn with_definitions(doc: &SchemaDocument, schema: &Value) -> Value {
    let mut root = schema.clone();
    if let (Some(map), Some(definitions)) = (root.as_object_mut(), doc.definitions()) {
        map.entry("definitions")
            .or_insert_with(|| Value::Object(definitions.clone()));
    }
    root
}
