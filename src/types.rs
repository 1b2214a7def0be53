//! Core types shared by the table flattener, example synthesizer and renderer.

use serde_json::{Map, Value};

/// Keys never shown in the details column of a definition row.
pub const DEFINITION_EXCLUDED_KEYS: &[&str] = &[
    "type",
    "items",
    "properties",
    "required",
    "$ref",
    "xml",
    "format",
    "name",
];

/// Keys never shown in the details column of a parameter row.
pub const PARAMETER_EXCLUDED_KEYS: &[&str] = &[
    "type",
    "items",
    "properties",
    "required",
    "$ref",
    "xml",
    "format",
    "name",
    "schema",
    "in",
];

/// Path item keys that declare an operation, in Swagger 2 order.
pub const HTTP_VERBS: &[&str] = &["get", "put", "post", "delete", "options", "head", "patch"];

/// File extensions accepted as an explicit schema document argument.
pub const SCHEMA_EXTENSIONS: &[&str] = &[".json", ".yaml", ".yml"];

/// Path segment used for the representative element of an array.
pub const ITEM_SEGMENT: &str = "[0]";

/// Returns the JSON type name for diagnostics.
pub fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Escape text for inclusion in HTML element content or attribute values.
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
    out
}

/// Escape text for element content only; quotes are kept so code samples
/// stay readable.
pub fn escape_text(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

/// Structural shape of a schema node.
///
/// Metadata keys (description, example, enum, ...) are not part of the shape;
/// they stay on the underlying JSON object.
#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind<'a> {
    /// `{"$ref": "#/definitions/Name"}`
    Reference(&'a str),
    /// `{"type": "array", "items": ...}`. `None` when `items` is missing.
    Array(Option<&'a Value>),
    /// `{"type": "object", "properties": ..., "required": [...]}`, or a node
    /// without `type` that declares `properties`.
    Object {
        properties: Option<&'a Map<String, Value>>,
        required: Vec<&'a str>,
    },
    /// Any other node. `ty` is `None` when the node declares no type at all.
    Primitive {
        ty: Option<&'a str>,
        format: Option<&'a str>,
    },
}

impl<'a> NodeKind<'a> {
    /// Classify a schema node. `type` wins over `$ref`.
    pub fn of(node: &'a Value) -> Self {
        let ty = node.get("type").and_then(Value::as_str);
        let properties = node.get("properties").and_then(Value::as_object);

        match ty {
            Some("array") => NodeKind::Array(node.get("items").filter(|i| i.is_object())),
            Some("object") => NodeKind::Object {
                properties,
                required: required_names(node),
            },
            Some(other) => NodeKind::Primitive {
                ty: Some(other),
                format: node.get("format").and_then(Value::as_str),
            },
            None => {
                if let Some(pointer) = node.get("$ref").and_then(Value::as_str) {
                    NodeKind::Reference(pointer)
                } else if properties.is_some() {
                    NodeKind::Object {
                        properties,
                        required: required_names(node),
                    }
                } else {
                    NodeKind::Primitive {
                        ty: None,
                        format: node.get("format").and_then(Value::as_str),
                    }
                }
            }
        }
    }
}

/// Names listed in a node's `required` array.
///
/// Parameters use `required: true` instead; that form yields no names here.
pub fn required_names(node: &Value) -> Vec<&str> {
    node.get("required")
        .and_then(Value::as_array)
        .map(|arr| arr.iter().filter_map(Value::as_str).collect())
        .unwrap_or_default()
}

/// One segment of a [`FieldPath`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segment {
    pub name: String,
    pub required: bool,
}

/// Position of a field inside a flattened schema.
///
/// The optional anchor (the definition name) takes part in row ids only.
/// Segments render dot-joined, except `[0]` which is glued to its predecessor.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FieldPath {
    anchor: Option<String>,
    segments: Vec<Segment>,
}

impl FieldPath {
    /// An empty path without anchor (parameter tables).
    pub fn new() -> Self {
        Self::default()
    }

    /// An empty path anchored under a definition name.
    pub fn anchored(anchor: impl Into<String>) -> Self {
        Self {
            anchor: Some(anchor.into()),
            segments: Vec::new(),
        }
    }

    /// Returns a new path extended with a named field.
    pub fn child(&self, name: impl Into<String>, required: bool) -> Self {
        let mut next = self.clone();
        next.segments.push(Segment {
            name: name.into(),
            required,
        });
        next
    }

    /// Returns a new path extended with the array item segment.
    pub fn item(&self) -> Self {
        self.child(ITEM_SEGMENT, false)
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Raw dot-joined names including the anchor, used as the row `id`.
    pub fn id_repr(&self) -> String {
        self.anchor
            .iter()
            .map(String::as_str)
            .chain(self.segments.iter().map(|s| s.name.as_str()))
            .collect::<Vec<_>>()
            .join(".")
    }

    /// Display label: required segments in `<strong>`, `[0]` glued without a dot.
    pub fn path_repr(&self) -> String {
        let mut out = String::new();
        for (i, segment) in self.segments.iter().enumerate() {
            if i > 0 && segment.name != ITEM_SEGMENT {
                out.push('.');
            }
            if segment.required {
                out.push_str("<strong>");
                out.push_str(&segment.name);
                out.push_str("</strong>");
            } else {
                out.push_str(&segment.name);
            }
        }
        out
    }
}

/// One row of a flattened table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedRow {
    /// Anchor id (raw dot-joined path).
    pub id: String,
    /// Path cell content, with required segments bolded.
    pub path_label: String,
    /// Type cell content.
    pub type_label: String,
    /// Details cell content (`<br>`-joined label/value spans).
    pub details: String,
}
