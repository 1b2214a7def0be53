//! Document linting - checks every directive of a Markdown file without
//! producing HTML.
//!
//! Reports:
//! - schema documents that fail to load, unknown definitions and paths,
//!   malformed configuration blocks (errors)
//! - arrays without `items`, `$ref` pointers that do not resolve in the same
//!   document, examples that do not match their schema (warnings)

use std::path::{Path, PathBuf};

use serde::Serialize;
use serde_json::{json, Value};

use crate::config::{DirectiveConfig, RenderOptions};
use crate::error::{RenderError, ValidateError};
use crate::example::synthesize_with_cuts;
use crate::flatten::parameter_shape;
use crate::loader::SchemaDocument;
use crate::preprocess::{collect_registry, scan, Block, Directive, DirectiveKind, DocumentCache};
use crate::reference::DefinitionRegistry;
use crate::render::Renderer;
use crate::types::{json_type_name, NodeKind};
use crate::validator::validate_example;

/// Severity level for diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
}

/// A single diagnostic message from linting.
#[derive(Debug, Clone, Serialize)]
pub struct Diagnostic {
    pub severity: Severity,
    pub code: String,
    /// 1-based line of the directive (0 when the file itself is unreadable).
    pub line: usize,
    /// Definition name or path the directive targets.
    pub target: String,
    pub message: String,
}

/// Result of linting one Markdown document.
#[derive(Debug, Clone, Serialize)]
pub struct LintResult {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file: Option<PathBuf>,
    pub directives_checked: usize,
    pub errors: usize,
    pub warnings: usize,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub diagnostics: Vec<Diagnostic>,
}

impl LintResult {
    /// Returns true if no errors were found.
    pub fn is_ok(&self) -> bool {
        self.errors == 0
    }

    fn from_diagnostics(file: Option<PathBuf>, directives_checked: usize, diagnostics: Vec<Diagnostic>) -> Self {
        let errors = diagnostics
            .iter()
            .filter(|d| d.severity == Severity::Error)
            .count();
        Self {
            file,
            directives_checked,
            errors,
            warnings: diagnostics.len() - errors,
            diagnostics,
        }
    }
}

/// Lint a Markdown file.
///
/// An unreadable file is reported as a single error diagnostic.
pub fn lint_file(path: &Path, options: &RenderOptions) -> LintResult {
    match std::fs::read_to_string(path) {
        Ok(text) => LintResult {
            file: Some(path.to_path_buf()),
            ..lint_markdown(&text, options)
        },
        Err(e) => LintResult::from_diagnostics(
            Some(path.to_path_buf()),
            0,
            vec![Diagnostic {
                severity: Severity::Error,
                code: "io".to_string(),
                line: 0,
                target: path.display().to_string(),
                message: format!("cannot read file: {}", e),
            }],
        ),
    }
}

/// Lint Markdown text.
pub fn lint_markdown(text: &str, options: &RenderOptions) -> LintResult {
    let lines: Vec<&str> = text.lines().collect();
    let registry = collect_registry(&lines);
    let mut cache = DocumentCache::default();
    let mut diagnostics = Vec::new();
    let mut checked = 0;

    for block in scan(&lines) {
        let Block::Directive {
            line,
            directive,
            config,
        } = block
        else {
            continue;
        };
        checked += 1;

        let mut sink = Sink {
            line,
            target: &directive.target,
            diagnostics: &mut diagnostics,
        };
        if let Err(e) = lint_directive(&directive, &config, options, &registry, &mut cache, &mut sink) {
            sink.push(Severity::Error, error_code(&e), e.to_string());
        }
    }

    LintResult::from_diagnostics(None, checked, diagnostics)
}

/// Collects diagnostics for one directive.
struct Sink<'a> {
    line: usize,
    target: &'a str,
    diagnostics: &'a mut Vec<Diagnostic>,
}

impl Sink<'_> {
    fn push(&mut self, severity: Severity, code: &str, message: String) {
        self.diagnostics.push(Diagnostic {
            severity,
            code: code.to_string(),
            line: self.line,
            target: self.target.to_string(),
            message,
        });
    }
}

fn lint_directive(
    directive: &Directive,
    config: &str,
    options: &RenderOptions,
    registry: &DefinitionRegistry,
    cache: &mut DocumentCache,
    sink: &mut Sink<'_>,
) -> Result<(), RenderError> {
    let config = DirectiveConfig::parse(config)?;
    let doc = cache.get(directive.source(options))?;

    match directive.kind {
        DirectiveKind::Definition => {
            let definition = doc.definition(&directive.target)?;
            let location = format!("#/definitions/{}", directive.target);
            inspect(doc, definition, &location, sink);

            // Entering through the reference makes a self-reference the first repeat.
            let pointer = format!(
                "#/definitions/{}",
                directive.target.replace('~', "~0").replace('/', "~1")
            );
            check_example(doc, &json!({ "$ref": pointer }), &location, sink);
        }
        DirectiveKind::Path => {
            let renderer = Renderer::new(doc, registry, &options.definitions_url_root);
            for op in renderer.operations(&directive.target, &config)? {
                let location = format!("{} {}", op.verb.to_uppercase(), directive.target);
                for param in &op.parameters {
                    let name = param.get("name").and_then(Value::as_str).unwrap_or("");
                    let schema = parameter_shape(param);
                    let where_ = format!("{} parameter {}", location, name);
                    inspect(doc, schema, &where_, sink);
                    if param.get("in").and_then(Value::as_str) == Some("body") {
                        check_example(doc, schema, &where_, sink);
                    }
                }
                for (code, response) in &op.responses {
                    if let Some(schema) = response.get("schema") {
                        let where_ = format!("{} response {}", location, code);
                        inspect(doc, schema, &where_, sink);
                        check_example(doc, schema, &where_, sink);
                    }
                }
            }
        }
    }
    Ok(())
}

/// Structural warnings for a schema tree; `$ref` targets are not entered.
fn inspect(doc: &SchemaDocument, node: &Value, location: &str, sink: &mut Sink<'_>) {
    if let Some(reference) = node.get("$ref") {
        match reference.as_str() {
            Some(pointer) if doc.resolve_pointer(pointer).is_none() => sink.push(
                Severity::Warning,
                "unresolved-ref",
                format!("{}: {} does not resolve in {}", location, pointer, doc.source()),
            ),
            Some(_) => {}
            None => sink.push(
                Severity::Warning,
                "invalid-ref",
                format!(
                    "{}: $ref must be a string, got {}",
                    location,
                    json_type_name(reference)
                ),
            ),
        }
    }

    match NodeKind::of(node) {
        NodeKind::Array(None) => sink.push(
            Severity::Warning,
            "array-items",
            format!("{}: array without items", location),
        ),
        NodeKind::Array(Some(items)) => inspect(doc, items, &format!("{}[0]", location), sink),
        NodeKind::Object {
            properties: Some(properties),
            ..
        } => {
            for (name, child) in properties {
                inspect(doc, child, &format!("{}.{}", location, name), sink);
            }
        }
        _ => {}
    }
}

/// Validate the synthesized example. Values standing in for a cut `$ref`
/// cycle are not checked.
fn check_example(doc: &SchemaDocument, schema: &Value, location: &str, sink: &mut Sink<'_>) {
    let (Some(example), cuts) = synthesize_with_cuts(schema, doc) else {
        return;
    };
    let is_cut = |path: &str| {
        cuts.iter().any(|cut| match path.strip_prefix(cut.as_str()) {
            Some(rest) => rest.is_empty() || rest.starts_with('/'),
            None => false,
        })
    };

    match validate_example(doc, schema, &example) {
        Ok(()) => {}
        Err(ValidateError::Invalid { errors }) => {
            for error in errors.into_iter().filter(|e| !is_cut(&e.path)) {
                sink.push(
                    Severity::Warning,
                    "example",
                    format!("{}: example does not match schema at {}", location, error),
                );
            }
        }
        Err(ValidateError::Schema { message }) => sink.push(
            Severity::Warning,
            "schema",
            format!("{}: cannot validate example: {}", location, message),
        ),
    }
}

fn error_code(error: &RenderError) -> &'static str {
    match error {
        RenderError::FileNotFound { .. } | RenderError::ReadError { .. } => "load",
        #[cfg(feature = "remote")]
        RenderError::NetworkError { .. } => "load",
        RenderError::InvalidJson { .. } | RenderError::InvalidYaml { .. } => "parse",
        RenderError::MissingDefinition { .. } => "missing-definition",
        RenderError::MissingPath { .. } => "missing-path",
        RenderError::UnresolvedRef { .. } => "unresolved-ref",
        RenderError::InvalidConfig { .. } => "config",
        RenderError::AtLine { source, .. } => error_code(source),
    }
}
