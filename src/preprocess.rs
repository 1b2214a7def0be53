//! Markdown preprocessing: finds directives, renders them, splices the HTML
//! back in place.
//!
//! ```text
//! :swg-def: [file] DefinitionName
//! :swg-path: [file] /path/{template}
//!     <indented YAML configuration block>
//! ```
//!
//! Rendering is a two-stage pipeline. The first pass collects every
//! definition named by a `:swg-def:` directive; the second renders with that
//! registry frozen, so links to definitions further down the page are local.

use std::collections::HashMap;

use tracing::{debug, info};

use crate::config::{DirectiveConfig, RenderOptions, CONFIG_INDENT};
use crate::error::RenderError;
use crate::loader::{has_schema_extension, load_document_auto, SchemaDocument};
use crate::reference::DefinitionRegistry;
use crate::render::Renderer;

const DEFINITION_PREFIX: &str = ":swg-def:";
const PATH_PREFIX: &str = ":swg-path:";

/// What a directive renders.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DirectiveKind {
    Definition,
    Path,
}

/// A parsed directive line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Directive {
    pub kind: DirectiveKind,
    /// Explicit schema document, when the first argument names one.
    pub file: Option<String>,
    /// Definition name or path key.
    pub target: String,
}

impl Directive {
    /// Parse a line; `None` if it is not a directive.
    pub fn parse(line: &str) -> Option<Self> {
        let (kind, rest) = if let Some(rest) = line.strip_prefix(DEFINITION_PREFIX) {
            (DirectiveKind::Definition, rest)
        } else if let Some(rest) = line.strip_prefix(PATH_PREFIX) {
            (DirectiveKind::Path, rest)
        } else {
            return None;
        };
        if !rest.starts_with(char::is_whitespace) {
            return None;
        }

        let args: Vec<&str> = rest.split_whitespace().collect();
        let target = args.last()?.to_string();
        let file = match args.as_slice() {
            [first, _, ..] if has_schema_extension(first) => Some(first.to_string()),
            _ => None,
        };

        Some(Self { kind, file, target })
    }

    /// Schema document this directive reads.
    pub fn source<'a>(&'a self, options: &'a RenderOptions) -> &'a str {
        self.file.as_deref().unwrap_or(&options.file)
    }
}

/// A piece of the scanned document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Block<'t> {
    Text(&'t str),
    Directive {
        /// 1-based line number of the directive line.
        line: usize,
        directive: Directive,
        /// Configuration block with the indentation stripped.
        config: String,
    },
}

/// Split lines into text and directives with their configuration blocks.
pub fn scan<S: AsRef<str>>(lines: &[S]) -> Vec<Block<'_>> {
    let mut blocks = Vec::new();
    let mut i = 0;
    while i < lines.len() {
        let line = lines[i].as_ref();
        let Some(directive) = Directive::parse(line) else {
            blocks.push(Block::Text(line));
            i += 1;
            continue;
        };

        let start = i;
        let mut config = Vec::new();
        i += 1;
        while let Some(stripped) = lines.get(i).and_then(|l| l.as_ref().strip_prefix(CONFIG_INDENT)) {
            config.push(stripped);
            i += 1;
        }

        blocks.push(Block::Directive {
            line: start + 1,
            directive,
            config: config.join("\n"),
        });
    }
    blocks
}

/// First pass: every definition named by a `:swg-def:` directive, in
/// document order.
pub fn collect_registry<S: AsRef<str>>(lines: &[S]) -> DefinitionRegistry {
    lines
        .iter()
        .filter_map(|line| Directive::parse(line.as_ref()))
        .filter(|d| d.kind == DirectiveKind::Definition)
        .map(|d| d.target)
        .collect()
}

/// Loads each schema document at most once per run.
#[derive(Debug, Default)]
pub(crate) struct DocumentCache {
    documents: HashMap<String, SchemaDocument>,
}

impl DocumentCache {
    pub(crate) fn get(&mut self, source: &str) -> Result<&SchemaDocument, RenderError> {
        if !self.documents.contains_key(source) {
            debug!(source, "loading schema document");
            let document = load_document_auto(source)?;
            self.documents.insert(source.to_string(), document);
        }
        self.documents
            .get(source)
            .ok_or_else(|| RenderError::FileNotFound {
                path: source.into(),
            })
    }
}

/// Replaces directives in a Markdown document by rendered HTML.
#[derive(Debug, Clone, Default)]
pub struct Preprocessor {
    options: RenderOptions,
}

impl Preprocessor {
    pub fn new(options: RenderOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &RenderOptions {
        &self.options
    }

    /// Render every directive and return the new lines.
    ///
    /// # Errors
    ///
    /// The first directive that fails aborts the run; the error carries the
    /// directive's line number.
    pub fn run<S: AsRef<str>>(&self, lines: &[S]) -> Result<Vec<String>, RenderError> {
        let registry = collect_registry(lines);
        info!(definitions = registry.len(), "collected definition registry");

        let mut cache = DocumentCache::default();
        let mut out = Vec::new();
        for block in scan(lines) {
            match block {
                Block::Text(text) => out.push(text.to_string()),
                Block::Directive {
                    line,
                    directive,
                    config,
                } => {
                    let html = self
                        .render_directive(&directive, &config, &registry, &mut cache)
                        .map_err(|e| e.at_line(line))?;
                    out.extend(html.lines().map(String::from));
                }
            }
        }
        Ok(out)
    }

    fn render_directive(
        &self,
        directive: &Directive,
        config: &str,
        registry: &DefinitionRegistry,
        cache: &mut DocumentCache,
    ) -> Result<String, RenderError> {
        let config = DirectiveConfig::parse(config)?;
        let doc = cache.get(directive.source(&self.options))?;
        let renderer = Renderer::new(doc, registry, &self.options.definitions_url_root);

        match directive.kind {
            DirectiveKind::Definition => renderer.render_definition(&directive.target, &config),
            DirectiveKind::Path => Ok(renderer.render_path(&directive.target, &config)?.join("\n")),
        }
    }
}

/// Render a whole Markdown text.
///
/// # Errors
///
/// See [`Preprocessor::run`].
pub fn render_markdown(text: &str, options: &RenderOptions) -> Result<String, RenderError> {
    let lines: Vec<&str> = text.lines().collect();
    let mut rendered = Preprocessor::new(options.clone()).run(&lines)?.join("\n");
    if text.ends_with('\n') {
        rendered.push('\n');
    }
    Ok(rendered)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn swagger_file() -> NamedTempFile {
        let mut file = NamedTempFile::with_suffix(".json").unwrap();
        write!(
            file,
            r##"{{
                "definitions": {{
                    "First": {{"properties": {{"second": {{"$ref": "#/definitions/Second"}}}}}},
                    "Second": {{"properties": {{"note": {{"type": "string", "description": "another def"}}}}}}
                }},
                "paths": {{
                    "/ping": {{"get": {{"summary": "Ping", "responses": {{"200": {{"description": "pong"}}}}}}}}
                }}
            }}"##
        )
        .unwrap();
        file
    }

    #[test]
    fn parse_definition_directive() {
        let d = Directive::parse(":swg-def: Pet").unwrap();
        assert_eq!(d.kind, DirectiveKind::Definition);
        assert_eq!(d.file, None);
        assert_eq!(d.target, "Pet");

        let d = Directive::parse(":swg-def: api/swagger.json Pet").unwrap();
        assert_eq!(d.file.as_deref(), Some("api/swagger.json"));
        assert_eq!(d.target, "Pet");
    }

    #[test]
    fn parse_path_directive_ignores_non_schema_file() {
        let d = Directive::parse(":swg-path: notes.txt /users/{userId}").unwrap();
        assert_eq!(d.kind, DirectiveKind::Path);
        assert_eq!(d.file, None);
        assert_eq!(d.target, "/users/{userId}");

        let d = Directive::parse(":swg-path: api.yaml /users").unwrap();
        assert_eq!(d.file.as_deref(), Some("api.yaml"));
    }

    #[test]
    fn parse_rejects_other_lines() {
        assert_eq!(Directive::parse("some text"), None);
        assert_eq!(Directive::parse(":swg-def:"), None);
        assert_eq!(Directive::parse(":swg-def:Pet"), None);
        assert_eq!(Directive::parse(":swg-definition: Pet"), None);
    }

    #[test]
    fn directive_source_falls_back_to_default() {
        let options = RenderOptions::new().file("default.json");
        let d = Directive::parse(":swg-def: Pet").unwrap();
        assert_eq!(d.source(&options), "default.json");
        let d = Directive::parse(":swg-def: other.json Pet").unwrap();
        assert_eq!(d.source(&options), "other.json");
    }

    #[test]
    fn scan_collects_config_block() {
        let lines = [
            "# Title",
            ":swg-path: /pets",
            "    verbs: [get]",
            "    sections:",
            "      responseTable: false",
            "after",
        ];
        let blocks = scan(&lines);
        assert_eq!(blocks.len(), 3);
        assert_eq!(blocks[0], Block::Text("# Title"));
        match &blocks[1] {
            Block::Directive { line, config, .. } => {
                assert_eq!(*line, 2);
                assert_eq!(config, "verbs: [get]\nsections:\n  responseTable: false");
            }
            other => panic!("unexpected block {:?}", other),
        }
        assert_eq!(blocks[2], Block::Text("after"));
    }

    #[test]
    fn registry_collects_definitions_only() {
        let lines = [":swg-path: /pets", ":swg-def: Second", "text", ":swg-def: x.json First"];
        let registry = collect_registry(&lines);
        assert_eq!(registry.names(), ["Second", "First"]);
    }

    #[test]
    fn forward_reference_links_locally() {
        let file = swagger_file();
        let options = RenderOptions::new()
            .file(file.path().to_str().unwrap())
            .definitions_url_root("/types");
        let text = ":swg-def: First\n\n:swg-def: Second\n";

        let html = render_markdown(text, &options).unwrap();
        assert!(html.contains(r##"<a href="#/definitions/Second">Second</a>"##));
        assert!(html.contains("another def"));
        assert!(html.ends_with("</table>\n"));
    }

    #[test]
    fn unregistered_reference_uses_url_root() {
        let file = swagger_file();
        let options = RenderOptions::new()
            .file(file.path().to_str().unwrap())
            .definitions_url_root("/types");

        let html = render_markdown(":swg-def: First", &options).unwrap();
        assert!(html.contains(r##"<a href="/types#/definitions/Second">Second</a>"##));
    }

    #[test]
    fn plain_text_passes_through() {
        let html = render_markdown("some text\nmore", &RenderOptions::default()).unwrap();
        assert_eq!(html, "some text\nmore");
    }

    #[test]
    fn config_block_is_consumed() {
        let file = swagger_file();
        let options = RenderOptions::new().file(file.path().to_str().unwrap());
        let text = ":swg-path: /ping\n    sections:\n      responseTable: false\nend";

        let html = render_markdown(text, &options).unwrap();
        assert!(!html.contains("responseTable"));
        assert!(!html.contains("<table"));
        assert!(html.contains("<p class=\"sw-summary\">Ping</p>"));
        assert!(html.ends_with("\nend"));
    }

    #[test]
    fn errors_carry_line_number() {
        let file = swagger_file();
        let options = RenderOptions::new().file(file.path().to_str().unwrap());
        let err = render_markdown("intro\n:swg-def: Missing", &options).unwrap_err();
        assert!(matches!(err, RenderError::AtLine { line: 2, .. }));

        let err = render_markdown(":swg-def: /nonexistent/api.json Pet", &options).unwrap_err();
        assert_eq!(err.exit_code(), 3);
    }

    #[test]
    fn invalid_config_block_errors() {
        let file = swagger_file();
        let options = RenderOptions::new().file(file.path().to_str().unwrap());
        let err = render_markdown(":swg-path: /ping\n    verbs: [get", &options).unwrap_err();
        match err {
            RenderError::AtLine { source, .. } => {
                assert!(matches!(*source, RenderError::InvalidConfig { .. }))
            }
            other => panic!("unexpected error {:?}", other),
        }
    }
}
