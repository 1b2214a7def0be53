//! Example synthesis - builds a representative value for a schema.
//!
//! Unlike the table flattener this walk follows `$ref` into the document's
//! definitions, so it keeps the chain of pointers currently being expanded
//! and cuts cycles with the pointer string.

use serde_json::{json, Map, Value};
use tracing::warn;

use crate::flatten::parameter_shape;
use crate::loader::SchemaDocument;
use crate::types::NodeKind;

/// Example value for `node`.
///
/// Returns `None` only when the node itself is an unresolvable `$ref`.
pub fn synthesize(node: &Value, doc: &SchemaDocument) -> Option<Value> {
    Synthesis::new(doc).node(node)
}

/// Example value plus the JSON pointers (into the example) where a `$ref`
/// cycle was cut and the pointer string stands in for the value.
pub(crate) fn synthesize_with_cuts(node: &Value, doc: &SchemaDocument) -> (Option<Value>, Vec<String>) {
    let mut synthesis = Synthesis::new(doc);
    let value = synthesis.node(node);
    (value, synthesis.cuts)
}

/// Example request body for an operation's parameters.
///
/// A body parameter's schema is the whole payload. Without one, every other
/// parameter contributes a key named after it. `None` when there is nothing
/// to show.
pub fn synthesize_request(parameters: &[&Value], doc: &SchemaDocument) -> Option<Value> {
    let body = parameters
        .iter()
        .find(|p| p.get("in").and_then(Value::as_str) == Some("body"));
    if let Some(body) = body {
        return synthesize(parameter_shape(body), doc);
    }

    let mut payload = Map::new();
    for param in parameters {
        let Some(name) = param.get("name").and_then(Value::as_str) else {
            continue;
        };
        if let Some(value) = synthesize(param, doc) {
            payload.insert(name.to_string(), value);
        }
    }

    if payload.is_empty() {
        None
    } else {
        Some(Value::Object(payload))
    }
}

struct Synthesis<'d> {
    doc: &'d SchemaDocument,
    /// `$ref` pointers currently being expanded.
    expanding: Vec<String>,
    /// Position in the example being built, as pointer tokens.
    location: Vec<String>,
    cuts: Vec<String>,
}

impl<'d> Synthesis<'d> {
    fn new(doc: &'d SchemaDocument) -> Self {
        Self {
            doc,
            expanding: Vec::new(),
            location: Vec::new(),
            cuts: Vec::new(),
        }
    }

    fn node(&mut self, node: &Value) -> Option<Value> {
        match NodeKind::of(node) {
            NodeKind::Array(items) => {
                let item = items.and_then(|items| self.nested("0", items));
                Some(Value::Array(item.into_iter().collect()))
            }
            NodeKind::Object { properties, .. } => {
                let mut result = Map::new();
                for (name, child) in properties.into_iter().flatten() {
                    if let Some(value) = self.nested(name, child) {
                        result.insert(name.clone(), value);
                    }
                }
                Some(Value::Object(result))
            }
            NodeKind::Reference(pointer) => {
                if self.expanding.iter().any(|p| p == pointer) {
                    let here = self.here();
                    self.cuts.push(here);
                    return Some(Value::String(pointer.to_string()));
                }
                let doc = self.doc;
                let Some(target) = doc.resolve_pointer(pointer) else {
                    warn!(pointer, source = doc.source(), "unresolved reference left out of example");
                    return None;
                };

                self.expanding.push(pointer.to_string());
                let value = self.node(target);
                self.expanding.pop();
                value
            }
            NodeKind::Primitive { .. } => Some(scalar_example(node)),
        }
    }

    fn nested(&mut self, token: &str, node: &Value) -> Option<Value> {
        self.location.push(token.replace('~', "~0").replace('/', "~1"));
        let value = self.node(node);
        self.location.pop();
        value
    }

    fn here(&self) -> String {
        self.location.iter().map(|t| format!("/{}", t)).collect()
    }
}

/// Example for a leaf node: `example`, else the first `enum` entry, else a
/// default picked by type and format.
pub fn scalar_example(node: &Value) -> Value {
    if let Some(example) = node.get("example").filter(|v| !v.is_null()) {
        return example.clone();
    }
    if let Some(first) = node
        .get("enum")
        .and_then(Value::as_array)
        .and_then(|values| values.first())
    {
        return first.clone();
    }

    let format = node.get("format").and_then(Value::as_str);
    match node.get("type").and_then(Value::as_str) {
        Some("integer") | Some("number") => json!(123),
        Some("string") => match format {
            Some("date") => json!("2019-07-21"),
            Some("date-time") => json!("2017-07-21T17:32:28Z"),
            Some("password") => json!("*****"),
            _ => json!("lorem ipsum"),
        },
        Some("boolean") => json!(true),
        Some(other) => Value::String(other.to_string()),
        None => Value::Null,
    }
}
