//! Table flattening - turns a nested schema into path-annotated rows.
//!
//! Rows come out in pre-order: a field's row precedes the rows of its
//! nested properties. `$ref` targets are linked, never expanded, so the walk
//! is bounded by the size of the inline tree.

use std::collections::HashSet;

use serde_json::Value;
use tracing::debug;

use crate::describe::type_label;
use crate::reference::RefLinker;
use crate::types::{
    escape_html, FieldPath, NodeKind, RenderedRow, DEFINITION_EXCLUDED_KEYS,
    PARAMETER_EXCLUDED_KEYS,
};

/// Property names required at the current depth, accumulated from every
/// enclosing object.
pub type RequiredSet = HashSet<String>;

/// Walks schema trees into [`RenderedRow`]s.
#[derive(Debug, Clone, Copy)]
pub struct Flattener<'a> {
    linker: RefLinker<'a>,
    excluded: &'static [&'static str],
}

impl<'a> Flattener<'a> {
    /// Flattener for definition tables.
    pub fn for_definitions(linker: RefLinker<'a>) -> Self {
        Self {
            linker,
            excluded: DEFINITION_EXCLUDED_KEYS,
        }
    }

    /// Flattener for parameter tables (`schema` and `in` are hidden too).
    pub fn for_parameters(linker: RefLinker<'a>) -> Self {
        Self {
            linker,
            excluded: PARAMETER_EXCLUDED_KEYS,
        }
    }

    /// Rows for the field at `path` and everything nested below it.
    pub fn flatten(&self, path: &FieldPath, node: &Value, required: &RequiredSet) -> Vec<RenderedRow> {
        let mut rows = Vec::new();
        self.walk(path, node, node, required, &mut rows);
        rows
    }

    /// Rows for a named property of an object whose required set is `required`.
    pub fn flatten_property(
        &self,
        parent: &FieldPath,
        name: &str,
        node: &Value,
        required: &RequiredSet,
    ) -> Vec<RenderedRow> {
        let path = parent.child(name, required.contains(name));
        self.flatten(&path, node, required)
    }

    /// Rows for one operation parameter.
    ///
    /// Body parameters are typed and expanded through their `schema`; the
    /// other locations carry their type inline. The details column always
    /// comes from the parameter itself.
    pub fn flatten_parameter(&self, param: &Value) -> Vec<RenderedRow> {
        let name = param.get("name").and_then(Value::as_str).unwrap_or("");
        let required = param
            .get("required")
            .and_then(Value::as_bool)
            .unwrap_or(false);

        let path = if name.is_empty() {
            FieldPath::new()
        } else {
            FieldPath::new().child(name, required)
        };

        let shape = parameter_shape(param);
        let mut rows = Vec::new();
        self.walk(&path, shape, param, &RequiredSet::new(), &mut rows);
        rows
    }

    fn walk(
        &self,
        path: &FieldPath,
        node: &Value,
        details_node: &Value,
        required: &RequiredSet,
        rows: &mut Vec<RenderedRow>,
    ) {
        rows.push(RenderedRow {
            id: path.id_repr(),
            path_label: path.path_repr(),
            type_label: type_label(node, &self.linker),
            details: details(details_node, self.excluded),
        });

        match NodeKind::of(node) {
            NodeKind::Object {
                properties,
                required: own_required,
            } => {
                let Some(properties) = properties else {
                    return;
                };
                let mut accumulated = required.clone();
                accumulated.extend(own_required.into_iter().map(String::from));

                for (name, child) in properties {
                    let child_path = path.child(name.as_str(), accumulated.contains(name));
                    self.walk(&child_path, child, child, &accumulated, rows);
                }
            }
            NodeKind::Array(Some(items)) => {
                if has_inline_object_items(items) {
                    self.walk(&path.item(), items, items, required, rows);
                }
            }
            NodeKind::Array(None) => {
                debug!(path = %path.id_repr(), "array without items, not expanded");
            }
            NodeKind::Reference(_) | NodeKind::Primitive { .. } => {}
        }
    }
}

/// Schema node that types a parameter.
///
/// A body parameter without `schema` falls back to the parameter itself.
pub fn parameter_shape(param: &Value) -> &Value {
    let is_body = param.get("in").and_then(Value::as_str) == Some("body");
    if is_body {
        if let Some(schema) = param.get("schema").filter(|s| s.is_object()) {
            return schema;
        }
        let name = param.get("name").and_then(Value::as_str).unwrap_or("");
        debug!(
            parameter = name,
            "body parameter without schema, using the parameter itself"
        );
    }
    param
}

/// Whether an array's items lead to an inline object, possibly through
/// nested arrays. Only then does the walk descend into `[0]`.
fn has_inline_object_items(items: &Value) -> bool {
    match NodeKind::of(items) {
        NodeKind::Object { .. } => true,
        NodeKind::Array(Some(inner)) => has_inline_object_items(inner),
        _ => false,
    }
}

/// `label: value` spans for every metadata key, in declaration order.
pub fn details(node: &Value, excluded: &[&str]) -> String {
    let Some(map) = node.as_object() else {
        return String::new();
    };

    map.iter()
        .filter(|(key, _)| !excluded.contains(&key.as_str()))
        .filter_map(|(key, value)| {
            detail_value(value).map(|value| {
                format!(
                    "<span class=\"sw-label\">{}:</span> <span class=\"sw-value\">{}</span>",
                    escape_html(key),
                    value
                )
            })
        })
        .collect::<Vec<_>>()
        .join("<br>")
}

/// Rendered detail value; `None` for falsy values (null, false, zero, empty).
fn detail_value(value: &Value) -> Option<String> {
    match value {
        Value::Null | Value::Bool(false) => None,
        Value::Number(n) if n.as_f64() == Some(0.0) => None,
        Value::String(s) if s.is_empty() => None,
        Value::Array(arr) if arr.is_empty() => None,
        Value::Object(map) if map.is_empty() => None,
        Value::Array(arr) if arr.iter().all(|v| !v.is_array() && !v.is_object()) => Some(
            arr.iter()
                .map(scalar_text)
                .collect::<Vec<_>>()
                .join(", "),
        ),
        Value::Array(_) | Value::Object(_) => Some(escape_html(&value.to_string())),
        scalar => Some(scalar_text(scalar)),
    }
}

fn scalar_text(value: &Value) -> String {
    match value {
        Value::String(s) => escape_html(s),
        other => other.to_string(),
    }
}
