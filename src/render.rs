//! HTML rendering for `:swg-def:` and `:swg-path:` directives.
//!
//! Fragments never contain blank lines so that Markdown treats each of them
//! as one raw HTML block.

use std::borrow::Cow;
use std::collections::HashSet;

use serde_json::Value;
use tracing::debug;

use crate::config::DirectiveConfig;
use crate::describe::content_type_label;
use crate::error::RenderError;
use crate::example::{synthesize, synthesize_request};
use crate::flatten::{Flattener, RequiredSet};
use crate::loader::{string_list, SchemaDocument};
use crate::reference::{DefinitionRegistry, RefLinker};
use crate::types::{escape_html, escape_text, required_names, FieldPath, RenderedRow, HTTP_VERBS};

/// Media type used by code samples when nothing is declared.
const DEFAULT_CONSUMES: &str = "application/json";

/// One operation of a path item, with references resolved.
#[derive(Debug, Clone)]
pub struct Operation<'a> {
    /// Lowercase verb as declared (`get`, `post`, ...).
    pub verb: &'a str,
    pub summary: Option<&'a str>,
    /// Path-level parameters merged with the operation's own.
    pub parameters: Vec<&'a Value>,
    /// `(status code, response)` in declaration order.
    pub responses: Vec<(&'a str, &'a Value)>,
    /// Operation `consumes`, falling back to the document-level list.
    pub consumes: Vec<&'a str>,
    /// Operation `produces`, falling back to the document-level list.
    pub produces: Vec<&'a str>,
}

/// Renders directives against one loaded document.
#[derive(Debug, Clone, Copy)]
pub struct Renderer<'a> {
    doc: &'a SchemaDocument,
    linker: RefLinker<'a>,
}

impl<'a> Renderer<'a> {
    pub fn new(doc: &'a SchemaDocument, registry: &'a DefinitionRegistry, url_root: &'a str) -> Self {
        Self {
            doc,
            linker: RefLinker::new(registry, url_root),
        }
    }

    /// Rows of a definition table.
    ///
    /// Each top-level property is flattened on its own, under the
    /// definition's `required` list. Hidden properties are skipped and
    /// description overrides replace the property's own description.
    ///
    /// # Errors
    ///
    /// Returns `RenderError::MissingDefinition` if the name is not declared.
    pub fn definition_rows(
        &self,
        name: &str,
        config: &DirectiveConfig,
    ) -> Result<Vec<RenderedRow>, RenderError> {
        let definition = self.doc.definition(name)?;
        let required: RequiredSet = required_names(definition)
            .into_iter()
            .map(String::from)
            .collect();
        let anchor = FieldPath::anchored(name);
        let flattener = Flattener::for_definitions(self.linker);

        let mut rows = Vec::new();
        let properties = definition.get("properties").and_then(Value::as_object);
        for (property, node) in properties.into_iter().flatten() {
            if config.is_hidden(property) {
                debug!(definition = name, property = property.as_str(), "property hidden");
                continue;
            }
            let node = match config.property(property).and_then(|p| p.description.as_deref()) {
                Some(description) => Cow::Owned(with_description(node, description)),
                None => Cow::Borrowed(node),
            };
            rows.extend(flattener.flatten_property(&anchor, property, &node, &required));
        }
        Ok(rows)
    }

    /// `<table>` for a definition, with id `/definitions/<name>`.
    ///
    /// # Errors
    ///
    /// Returns `RenderError::MissingDefinition` if the name is not declared.
    pub fn render_definition(&self, name: &str, config: &DirectiveConfig) -> Result<String, RenderError> {
        let rows = self.definition_rows(name, config)?;
        debug!(definition = name, rows = rows.len(), "rendered definition");

        let body: Vec<String> = rows
            .iter()
            .map(|row| {
                format!(
                    "<tr id=\"{}\"><td>{}</td><td>{}</td><td>{}</td></tr>",
                    escape_html(&row.id),
                    row.path_label,
                    row.type_label,
                    row.details
                )
            })
            .collect();

        Ok(table(
            &format!("/definitions/{}", name),
            None,
            ["Name", "Type", "Details"],
            &body,
        ))
    }

    /// Operations of a path, in declaration order, filtered by `verbs`.
    ///
    /// # Errors
    ///
    /// Returns `RenderError::MissingPath` if the path is not declared, or
    /// `RenderError::UnresolvedRef` for a parameter/response `$ref` that
    /// does not resolve in the same document.
    pub fn operations(&self, path: &str, config: &DirectiveConfig) -> Result<Vec<Operation<'a>>, RenderError> {
        let item = self.doc.path_item(path)?;
        let Some(entries) = item.as_object() else {
            return Ok(Vec::new());
        };

        let shared = self.parameters(item.get("parameters"))?;
        let mut operations = Vec::new();
        for (verb, operation) in entries {
            if !HTTP_VERBS.contains(&verb.as_str()) || !config.verbs.allows(verb) {
                continue;
            }

            let mut parameters = shared.clone();
            for param in self.parameters(operation.get("parameters"))? {
                match parameters.iter().position(|p| same_parameter(p, param)) {
                    Some(i) => parameters[i] = param,
                    None => parameters.push(param),
                }
            }

            let mut responses = Vec::new();
            for (code, response) in operation
                .get("responses")
                .and_then(Value::as_object)
                .into_iter()
                .flatten()
            {
                responses.push((code.as_str(), self.deref(response)?));
            }

            let consumes = match string_list(operation.get("consumes")) {
                list if list.is_empty() => self.doc.consumes(),
                list => list,
            };
            let produces = match string_list(operation.get("produces")) {
                list if list.is_empty() => self.doc.produces(),
                list => list,
            };

            operations.push(Operation {
                verb: verb.as_str(),
                summary: operation.get("summary").and_then(Value::as_str),
                parameters,
                responses,
                consumes,
                produces,
            });
        }
        Ok(operations)
    }

    /// HTML fragments for every selected operation of a path.
    ///
    /// # Errors
    ///
    /// See [`Renderer::operations`].
    pub fn render_path(&self, path: &str, config: &DirectiveConfig) -> Result<Vec<String>, RenderError> {
        let sections = config.sections;
        let mut out = Vec::new();

        for op in self.operations(path, config)? {
            debug!(path, verb = op.verb, parameters = op.parameters.len(), "rendering operation");

            out.push(format!(
                "<p class=\"sw-path\"><span class=\"sw-verb\">{}</span> <span class=\"sw-path-url\">{}</span></p>",
                op.verb.to_uppercase(),
                escape_html(path)
            ));
            if let Some(summary) = op.summary {
                out.push(format!("<p class=\"sw-summary\">{}</p>", escape_html(summary)));
            }

            if sections.parameters_table && !op.parameters.is_empty() {
                out.push(self.parameters_table(path, &op));
            }

            let request = synthesize_request(&op.parameters, self.doc);
            if let Some(request) = &request {
                if sections.request_examples {
                    out.push(example_block("Request example", request));
                }
                if sections.request_code_examples {
                    out.push(self.code_sample(path, &op, request));
                }
            }

            if sections.response_table && !op.responses.is_empty() {
                out.push(self.responses_table(path, &op));
            }

            if sections.response_examples {
                for (code, response) in &op.responses {
                    let Some(schema) = response.get("schema") else {
                        continue;
                    };
                    if let Some(example) = synthesize(schema, self.doc) {
                        out.push(example_block(&format!("Response example ({})", code), &example));
                    }
                }
            }
        }
        Ok(out)
    }

    fn parameters_table(&self, path: &str, op: &Operation<'_>) -> String {
        let flattener = Flattener::for_parameters(self.linker);
        let body: Vec<String> = op
            .parameters
            .iter()
            .flat_map(|param| flattener.flatten_parameter(param))
            .map(|row| {
                format!(
                    "<tr><td>{}</td><td>{}</td><td>{}</td></tr>",
                    row.path_label, row.type_label, row.details
                )
            })
            .collect();

        table(
            &format!("/paths{}/parameters", path),
            Some("Parameters".to_string()),
            ["Name", "Type", "Details"],
            &body,
        )
    }

    fn responses_table(&self, path: &str, op: &Operation<'_>) -> String {
        let caption = if op.produces.is_empty() {
            "Responses".to_string()
        } else {
            format!("Responses ({})", escape_html(&op.produces.join(", ")))
        };

        let body: Vec<String> = op
            .responses
            .iter()
            .map(|(code, response)| {
                let description = response
                    .get("description")
                    .and_then(Value::as_str)
                    .unwrap_or("");
                format!(
                    "<tr><td>{}</td><td>{}</td><td>{}</td></tr>",
                    escape_html(code),
                    escape_html(description),
                    content_type_label(response, &self.linker)
                )
            })
            .collect();

        table(
            &format!("/paths{}/responses", path),
            Some(caption),
            ["Code", "Description", "Body"],
            &body,
        )
    }

    /// `curl` invocation sending the example body.
    fn code_sample(&self, path: &str, op: &Operation<'_>, body: &Value) -> String {
        let content_type = op.consumes.first().copied().unwrap_or(DEFAULT_CONSUMES);
        let payload = body.to_string().replace('\'', "'\\''");
        let command = format!(
            "curl -X {} \"{}{}\" \\\n  -H \"Content-Type: {}\" \\\n  -d '{}'",
            op.verb.to_uppercase(),
            self.doc.base_url(),
            path,
            content_type,
            payload
        );
        format!(
            "<p class=\"sw-example-title\">Request code example</p>\n<pre><code class=\"language-shell\">{}</code></pre>",
            escape_text(&command)
        )
    }

    /// Resolved parameter list; `$ref` entries are looked up in the document.
    fn parameters(&self, list: Option<&'a Value>) -> Result<Vec<&'a Value>, RenderError> {
        list.and_then(Value::as_array)
            .into_iter()
            .flatten()
            .map(|param| self.deref(param))
            .collect()
    }

    /// Follow a `$ref` on a parameter or response object, guarding against
    /// reference chains that loop.
    fn deref(&self, value: &'a Value) -> Result<&'a Value, RenderError> {
        let mut current = value;
        let mut seen = HashSet::new();
        while let Some(pointer) = current.get("$ref").and_then(Value::as_str) {
            if !seen.insert(pointer) {
                return Err(RenderError::UnresolvedRef {
                    pointer: pointer.to_string(),
                });
            }
            current = self
                .doc
                .resolve_pointer(pointer)
                .ok_or_else(|| RenderError::UnresolvedRef {
                    pointer: pointer.to_string(),
                })?;
        }
        Ok(current)
    }
}

/// Parameters are identified by `(name, in)`.
fn same_parameter(a: &Value, b: &Value) -> bool {
    a.get("name") == b.get("name") && a.get("in") == b.get("in")
}

fn with_description(node: &Value, description: &str) -> Value {
    let mut node = node.clone();
    if let Some(map) = node.as_object_mut() {
        map.insert(
            "description".to_string(),
            Value::String(description.to_string()),
        );
    }
    node
}

/// Marked with `data-type`, not `class`: some Markdown themes drop all
/// table styling when a class is present.
fn table(id: &str, caption: Option<String>, headers: [&str; 3], body: &[String]) -> String {
    let mut out = vec![format!("<table data-type=\"sw-table\" id=\"{}\">", escape_html(id))];
    if let Some(caption) = caption {
        out.push(format!("<caption>{}</caption>", caption));
    }
    out.push(format!(
        "<thead><tr><th>{}</th><th>{}</th><th>{}</th></tr></thead>",
        headers[0], headers[1], headers[2]
    ));
    out.push("<tbody>".to_string());
    out.extend(body.iter().cloned());
    out.push("</tbody>".to_string());
    out.push("</table>".to_string());
    out.join("\n")
}

fn example_block(title: &str, value: &Value) -> String {
    let json = serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string());
    format!(
        "<p class=\"sw-example-title\">{}</p>\n<pre><code class=\"language-json\">{}</code></pre>",
        escape_html(title),
        escape_text(&json)
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::VerbFilter;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn petstore() -> SchemaDocument {
        SchemaDocument::new(
            "petstore.json",
            json!({
                "host": "petstore.swagger.io",
                "basePath": "/v2",
                "schemes": ["https"],
                "produces": ["application/json"],
                "parameters": {
                    "petId": {"name": "petId", "in": "path", "required": true, "type": "integer", "format": "int64"}
                },
                "paths": {
                    "/pets/{petId}": {
                        "parameters": [{"$ref": "#/parameters/petId"}],
                        "get": {
                            "summary": "Find pet by ID",
                            "responses": {
                                "200": {"description": "successful operation", "schema": {"$ref": "#/definitions/Pet"}},
                                "404": {"description": "Pet not found"}
                            }
                        },
                        "post": {
                            "summary": "Update a pet",
                            "consumes": ["application/x-www-form-urlencoded"],
                            "parameters": [
                                {"name": "name", "in": "formData", "type": "string"},
                                {"name": "petId", "in": "path", "required": true, "type": "integer", "description": "Pet to update"}
                            ],
                            "responses": {"405": {"description": "Invalid input"}}
                        },
                        "x-internal": true
                    }
                },
                "definitions": {
                    "Pet": {
                        "type": "object",
                        "required": ["name"],
                        "properties": {
                            "id": {"type": "integer", "format": "int64"},
                            "name": {"type": "string", "description": "Pet name", "example": "doggie"},
                            "tags": {"type": "array", "items": {"$ref": "#/definitions/Tag"}}
                        }
                    },
                    "Tag": {"type": "object", "properties": {"id": {"type": "integer"}}}
                }
            }),
        )
    }

    #[test]
    fn definition_table_layout() {
        let doc = petstore();
        let registry: DefinitionRegistry = ["Pet", "Tag"].into_iter().collect();
        let renderer = Renderer::new(&doc, &registry, "");

        let html = renderer
            .render_definition("Pet", &DirectiveConfig::default())
            .unwrap();
        assert_eq!(
            html,
            concat!(
                "<table data-type=\"sw-table\" id=\"/definitions/Pet\">\n",
                "<thead><tr><th>Name</th><th>Type</th><th>Details</th></tr></thead>\n",
                "<tbody>\n",
                "<tr id=\"Pet.id\"><td>id</td><td>integer int64</td><td></td></tr>\n",
                "<tr id=\"Pet.name\"><td><strong>name</strong></td><td>string</td><td>",
                "<span class=\"sw-label\">description:</span> <span class=\"sw-value\">Pet name</span><br>",
                "<span class=\"sw-label\">example:</span> <span class=\"sw-value\">doggie</span></td></tr>\n",
                "<tr id=\"Pet.tags\"><td>tags</td><td>array of <a href=\"#/definitions/Tag\">Tag</a></td><td></td></tr>\n",
                "</tbody>\n",
                "</table>"
            )
        );
    }

    #[test]
    fn definition_overrides() {
        let doc = petstore();
        let registry = DefinitionRegistry::new();
        let renderer = Renderer::new(&doc, &registry, "");
        let config = DirectiveConfig::parse(
            "properties:\n  id:\n    hide: true\n  name:\n    description: Overridden\n",
        )
        .unwrap();

        let rows = renderer.definition_rows("Pet", &config).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].id, "Pet.name");
        assert!(rows[0].details.contains("Overridden"));
        assert!(!rows[0].details.contains("Pet name"));
        // description keeps its position before example
        assert!(rows[0].details.find("Overridden") < rows[0].details.find("doggie"));
    }

    #[test]
    fn missing_definition_errors() {
        let doc = petstore();
        let registry = DefinitionRegistry::new();
        let renderer = Renderer::new(&doc, &registry, "");
        let result = renderer.render_definition("Nope", &DirectiveConfig::default());
        assert!(matches!(result, Err(RenderError::MissingDefinition { .. })));
    }

    #[test]
    fn operations_merge_path_parameters_and_skip_non_verbs() {
        let doc = petstore();
        let registry = DefinitionRegistry::new();
        let renderer = Renderer::new(&doc, &registry, "");

        let ops = renderer
            .operations("/pets/{petId}", &DirectiveConfig::default())
            .unwrap();
        let verbs: Vec<&str> = ops.iter().map(|o| o.verb).collect();
        assert_eq!(verbs, vec!["get", "post"]);

        assert_eq!(ops[0].parameters.len(), 1);
        assert_eq!(ops[0].parameters[0]["format"], "int64");
        assert_eq!(ops[0].produces, vec!["application/json"]);

        // operation-level petId overrides the shared one in place
        assert_eq!(ops[1].parameters.len(), 2);
        assert_eq!(ops[1].parameters[0]["description"], "Pet to update");
        assert_eq!(ops[1].consumes, vec!["application/x-www-form-urlencoded"]);
    }

    #[test]
    fn verb_filter_limits_operations() {
        let doc = petstore();
        let registry = DefinitionRegistry::new();
        let renderer = Renderer::new(&doc, &registry, "");
        let config = DirectiveConfig {
            verbs: VerbFilter::Only(vec!["POST".to_string()]),
            ..DirectiveConfig::default()
        };
        let ops = renderer.operations("/pets/{petId}", &config).unwrap();
        assert_eq!(ops.len(), 1);
        assert_eq!(ops[0].verb, "post");
    }

    #[test]
    fn unresolved_parameter_ref_errors() {
        let doc = SchemaDocument::new(
            "inline",
            json!({"paths": {"/x": {"get": {"parameters": [{"$ref": "#/parameters/nope"}], "responses": {}}}}}),
        );
        let registry = DefinitionRegistry::new();
        let renderer = Renderer::new(&doc, &registry, "");
        let result = renderer.render_path("/x", &DirectiveConfig::default());
        assert!(matches!(
            result,
            Err(RenderError::UnresolvedRef { pointer }) if pointer == "#/parameters/nope"
        ));
    }

    #[test]
    fn looping_response_refs_error() {
        let doc = SchemaDocument::new(
            "inline",
            json!({
                "responses": {"A": {"$ref": "#/responses/B"}, "B": {"$ref": "#/responses/A"}},
                "paths": {"/x": {"get": {"responses": {"200": {"$ref": "#/responses/A"}}}}}
            }),
        );
        let registry = DefinitionRegistry::new();
        let renderer = Renderer::new(&doc, &registry, "");
        assert!(renderer
            .operations("/x", &DirectiveConfig::default())
            .is_err());
    }

    #[test]
    fn path_fragments_in_order() {
        let doc = petstore();
        let registry = DefinitionRegistry::new();
        let renderer = Renderer::new(&doc, &registry, "/types");
        let config = DirectiveConfig {
            verbs: VerbFilter::Only(vec!["get".to_string()]),
            ..DirectiveConfig::default()
        };

        let fragments = renderer.render_path("/pets/{petId}", &config).unwrap();
        assert_eq!(fragments.len(), 7);
        assert_eq!(
            fragments[0],
            "<p class=\"sw-path\"><span class=\"sw-verb\">GET</span> <span class=\"sw-path-url\">/pets/{petId}</span></p>"
        );
        assert_eq!(fragments[1], "<p class=\"sw-summary\">Find pet by ID</p>");
        assert!(fragments[2].starts_with("<table data-type=\"sw-table\" id=\"/paths/pets/{petId}/parameters\">"));
        assert!(fragments[2].contains("<tr><td><strong>petId</strong></td><td>integer int64</td><td></td></tr>"));
        assert!(fragments[3].contains("Request example"));
        assert!(fragments[3].contains("\"petId\": 123"));
        assert!(fragments[4].contains("curl -X GET \"https://petstore.swagger.io/v2/pets/{petId}\""));
        assert!(fragments[5].starts_with("<table data-type=\"sw-table\" id=\"/paths/pets/{petId}/responses\">"));
        assert!(fragments[5].contains("<caption>Responses (application/json)</caption>"));
        assert!(fragments[5].contains(
            "<tr><td>200</td><td>successful operation</td><td><a href=\"/types#/definitions/Pet\">Pet</a></td></tr>"
        ));
        assert!(fragments[5].contains("<tr><td>404</td><td>Pet not found</td><td></td></tr>"));
        assert!(fragments[6].contains("Response example (200)"));
        assert!(fragments[6].contains("\"name\": \"doggie\""));
        assert!(fragments.iter().all(|f| !f.contains("\n\n")));
    }

    #[test]
    fn sections_can_be_disabled() {
        let doc = petstore();
        let registry = DefinitionRegistry::new();
        let renderer = Renderer::new(&doc, &registry, "");
        let config = DirectiveConfig::parse(
            "verbs: [get]\nsections:\n  parametersTable: false\n  requestExamples: false\n  requestCodeExamples: false\n  responseTable: false\n  responseExamples: false\n",
        )
        .unwrap();

        let fragments = renderer.render_path("/pets/{petId}", &config).unwrap();
        assert_eq!(fragments.len(), 2);
    }

    #[test]
    fn code_sample_uses_first_consumes() {
        let doc = petstore();
        let registry = DefinitionRegistry::new();
        let renderer = Renderer::new(&doc, &registry, "");
        let config = DirectiveConfig {
            verbs: VerbFilter::Only(vec!["post".to_string()]),
            ..DirectiveConfig::default()
        };

        let fragments = renderer.render_path("/pets/{petId}", &config).unwrap();
        let sample = fragments
            .iter()
            .find(|f| f.contains("language-shell"))
            .unwrap();
        assert!(sample.contains("-H \"Content-Type: application/x-www-form-urlencoded\""));
        assert!(sample.contains(r#"-d '{"petId":123,"name":"lorem ipsum"}'"#));
    }
}
