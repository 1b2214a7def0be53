//! Swagger Markdown
//!
//! Renders Swagger 2 definitions and paths as HTML tables inside Markdown
//! documents.
//!
//! Two directives are recognised, each on a line of its own:
//!
//! ```text
//! :swg-def: [file] DefinitionName
//! :swg-path: [file] /path/{template}
//! ```
//!
//! A directive may be followed by a configuration block indented by four
//! spaces (YAML) to hide properties, override descriptions, choose which
//! sections are rendered and restrict the verbs of a path.
//!
//! # Example
//!
//! ```
//! use swagger_markdown::{
//!     DefinitionRegistry, DirectiveConfig, Renderer, SchemaDocument,
//! };
//! use serde_json::json;
//!
//! let doc = SchemaDocument::new("inline", json!({
//!     "definitions": {
//!         "Pet": {
//!             "type": "object",
//!             "required": ["name"],
//!             "properties": {
//!                 "name": { "type": "string" },
//!                 "tags": { "type": "array", "items": { "$ref": "#/definitions/Tag" } }
//!             }
//!         },
//!         "Tag": { "type": "object", "properties": { "id": { "type": "integer" } } }
//!     }
//! }));
//!
//! let registry: DefinitionRegistry = ["Pet", "Tag"].into_iter().collect();
//! let renderer = Renderer::new(&doc, &registry, "");
//! let html = renderer.render_definition("Pet", &DirectiveConfig::default()).unwrap();
//!
//! assert!(html.contains("<td><strong>name</strong></td>"));
//! assert!(html.contains(r##"array of <a href="#/definitions/Tag">Tag</a>"##));
//! ```
//!
//! # Configuration block
//!
//! ```yaml
//! properties:
//!   id: { hide: true }
//!   name: { description: "Display name" }
//! sections:
//!   responseExamples: false
//! verbs: [get, post]
//! ```

mod config;
mod describe;
mod error;
mod example;
mod flatten;
mod linter;
mod loader;
mod preprocess;
mod reference;
mod render;
mod types;
mod validator;

pub use config::{DirectiveConfig, PropertyOverride, RenderOptions, Sections, VerbFilter};
pub use describe::{content_type_label, type_label};
pub use error::{RenderError, SchemaError, ValidateError};
pub use example::{scalar_example, synthesize, synthesize_request};
pub use flatten::{details, parameter_shape, Flattener, RequiredSet};
pub use linter::{lint_file, lint_markdown, Diagnostic, LintResult, Severity};
pub use loader::{
    has_schema_extension, is_url, load_document, load_document_auto, load_document_str,
    navigate_fragment, DocumentFormat, SchemaDocument,
};
pub use preprocess::{
    collect_registry, render_markdown, scan, Block, Directive, DirectiveKind, Preprocessor,
};
pub use reference::{ref_name, DefinitionRegistry, RefLinker};
pub use render::{Operation, Renderer};
pub use types::{FieldPath, NodeKind, RenderedRow, Segment};
pub use validator::validate_example;

#[cfg(feature = "remote")]
pub use loader::load_document_url;
