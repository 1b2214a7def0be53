//! Short human-readable type labels for schema nodes.

use serde_json::Value;

use crate::reference::RefLinker;
use crate::types::NodeKind;

/// Type label of a schema node.
///
/// - `integer int32`, `string` for primitives
/// - a link for `$ref` nodes
/// - `array of X`, recursively; untyped items read `array of object`
pub fn type_label(node: &Value, linker: &RefLinker<'_>) -> String {
    match NodeKind::of(node) {
        NodeKind::Primitive {
            ty: Some(ty),
            format: Some(format),
        } => format!("{} {}", ty, format),
        NodeKind::Primitive { ty: Some(ty), .. } => ty.to_string(),
        NodeKind::Primitive { ty: None, .. } => String::new(),
        NodeKind::Reference(pointer) => linker.link(pointer),
        NodeKind::Object { .. } => "object".to_string(),
        NodeKind::Array(None) => "array of object".to_string(),
        NodeKind::Array(Some(items)) => match NodeKind::of(items) {
            NodeKind::Primitive { ty: None, .. } | NodeKind::Object { .. } => {
                "array of object".to_string()
            }
            _ => format!("array of {}", type_label(items, linker)),
        },
    }
}

/// Type label of a parameter or response body.
///
/// Uses the nested `schema` when present, otherwise the object itself, since
/// non-body parameters carry `type`/`format` inline.
pub fn content_type_label(obj: &Value, linker: &RefLinker<'_>) -> String {
    let schema = obj.get("schema").filter(|s| s.is_object()).unwrap_or(obj);
    type_label(schema, linker)
}
