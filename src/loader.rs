//! Schema document loading from files, strings, and HTTP URLs.
//!
//! JSON and YAML documents both end up as an order-preserving
//! `serde_json::Value` tree wrapped in a [`SchemaDocument`].

use std::path::Path;

use serde_json::{Map, Value};

use crate::error::RenderError;
use crate::types::SCHEMA_EXTENSIONS;

#[cfg(feature = "remote")]
use std::time::Duration;

/// Default timeout for HTTP requests (10 seconds).
#[cfg(feature = "remote")]
const HTTP_TIMEOUT: Duration = Duration::from_secs(10);

/// Serialization format of a schema document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentFormat {
    Json,
    Yaml,
}

impl DocumentFormat {
    /// Guess the format from a file name or URL; anything not YAML is JSON.
    pub fn from_name(name: &str) -> Self {
        let lower = name.to_ascii_lowercase();
        if lower.ends_with(".yaml") || lower.ends_with(".yml") {
            DocumentFormat::Yaml
        } else {
            DocumentFormat::Json
        }
    }
}

/// In-memory view of one loaded Swagger document.
#[derive(Debug, Clone)]
pub struct SchemaDocument {
    source: String,
    root: Value,
}

impl SchemaDocument {
    /// Wrap an already parsed document. `source` names it in error messages.
    pub fn new(source: impl Into<String>, root: Value) -> Self {
        Self {
            source: source.into(),
            root,
        }
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn root(&self) -> &Value {
        &self.root
    }

    /// The `definitions` map, if the document has one.
    pub fn definitions(&self) -> Option<&Map<String, Value>> {
        self.root.get("definitions").and_then(Value::as_object)
    }

    /// Look up a named definition.
    ///
    /// # Errors
    ///
    /// Returns `RenderError::MissingDefinition` if the name is not declared.
    pub fn definition(&self, name: &str) -> Result<&Value, RenderError> {
        self.definitions()
            .and_then(|defs| defs.get(name))
            .ok_or_else(|| RenderError::MissingDefinition {
                name: name.to_string(),
                source_name: self.source.clone(),
            })
    }

    /// Look up a path item by its exact key under `paths`.
    ///
    /// # Errors
    ///
    /// Returns `RenderError::MissingPath` if the key is not declared.
    pub fn path_item(&self, path: &str) -> Result<&Value, RenderError> {
        self.root
            .get("paths")
            .and_then(|paths| paths.get(path))
            .ok_or_else(|| RenderError::MissingPath {
                path: path.to_string(),
                source_name: self.source.clone(),
            })
    }

    /// Resolve a same-document pointer such as `#/definitions/Pet`.
    pub fn resolve_pointer(&self, pointer: &str) -> Option<&Value> {
        navigate_fragment(&self.root, pointer)
    }

    /// `scheme://host/basePath` built from `schemes`, `host` and `basePath`.
    pub fn base_url(&self) -> String {
        let scheme = self
            .root
            .get("schemes")
            .and_then(Value::as_array)
            .and_then(|s| s.first())
            .and_then(Value::as_str)
            .unwrap_or("https");
        let host = self
            .root
            .get("host")
            .and_then(Value::as_str)
            .unwrap_or("localhost");
        let base_path = self
            .root
            .get("basePath")
            .and_then(Value::as_str)
            .unwrap_or("")
            .trim_end_matches('/');
        format!("{}://{}{}", scheme, host, base_path)
    }

    /// Document-level `consumes` media types.
    pub fn consumes(&self) -> Vec<&str> {
        string_list(self.root.get("consumes"))
    }

    /// Document-level `produces` media types.
    pub fn produces(&self) -> Vec<&str> {
        string_list(self.root.get("produces"))
    }
}

/// Strings of a JSON array, ignoring non-string entries.
pub(crate) fn string_list(value: Option<&Value>) -> Vec<&str> {
    value
        .and_then(Value::as_array)
        .map(|arr| arr.iter().filter_map(Value::as_str).collect())
        .unwrap_or_default()
}

/// Load a schema document from a file path.
///
/// # Errors
///
/// Returns `RenderError::FileNotFound` if the file doesn't exist,
/// or a parse error if the content isn't valid JSON/YAML.
pub fn load_document(path: &Path) -> Result<SchemaDocument, RenderError> {
    if !path.exists() {
        return Err(RenderError::FileNotFound {
            path: path.to_path_buf(),
        });
    }

    let content = std::fs::read_to_string(path).map_err(|source| RenderError::ReadError {
        path: path.to_path_buf(),
        source,
    })?;

    let name = path.display().to_string();
    load_document_str(&content, DocumentFormat::from_name(&name), name)
}

/// Load a schema document from a string.
///
/// # Errors
///
/// Returns `RenderError::InvalidJson` or `RenderError::InvalidYaml`.
pub fn load_document_str(
    content: &str,
    format: DocumentFormat,
    source: impl Into<String>,
) -> Result<SchemaDocument, RenderError> {
    let root = match format {
        DocumentFormat::Json => {
            serde_json::from_str(content).map_err(|source| RenderError::InvalidJson { source })?
        }
        DocumentFormat::Yaml => {
            let yaml: serde_yaml::Value = serde_yaml::from_str(content)
                .map_err(|source| RenderError::InvalidYaml { source })?;
            yaml_to_json(yaml)
        }
    };
    Ok(SchemaDocument::new(source, root))
}

/// Load a schema document from an HTTP/HTTPS URL.
///
/// Requires the `remote` feature (enabled by default).
///
/// # Errors
///
/// Returns `RenderError::NetworkError` if the request fails or the server
/// answers with an error status, or a parse error for bad content.
#[cfg(feature = "remote")]
pub fn load_document_url(url: &str) -> Result<SchemaDocument, RenderError> {
    let network_error = |source| RenderError::NetworkError {
        url: url.to_string(),
        source,
    };

    let client = reqwest::blocking::Client::builder()
        .timeout(HTTP_TIMEOUT)
        .build()
        .map_err(network_error)?;

    let content = client
        .get(url)
        .send()
        .and_then(|response| response.error_for_status())
        .and_then(|response| response.text())
        .map_err(network_error)?;

    load_document_str(&content, DocumentFormat::from_name(url), url)
}

/// Check if a string looks like a URL (starts with http:// or https://).
pub fn is_url(s: &str) -> bool {
    s.starts_with("http://") || s.starts_with("https://")
}

/// Whether a directive argument names a schema document.
pub fn has_schema_extension(s: &str) -> bool {
    let lower = s.to_ascii_lowercase();
    SCHEMA_EXTENSIONS.iter().any(|ext| lower.ends_with(ext))
}

/// Load a schema document from a file path or URL.
///
/// URL loading requires the `remote` feature.
///
/// # Errors
///
/// Returns appropriate errors based on the source type.
pub fn load_document_auto(source: &str) -> Result<SchemaDocument, RenderError> {
    if is_url(source) {
        #[cfg(feature = "remote")]
        {
            load_document_url(source)
        }
        #[cfg(not(feature = "remote"))]
        {
            Err(RenderError::FileNotFound {
                path: std::path::PathBuf::from(source),
            })
        }
    } else {
        load_document(Path::new(source))
    }
}

/// Navigate a JSON Pointer fragment (e.g., "#/definitions/Pet").
///
/// Only same-document pointers (starting with `#`) resolve.
pub fn navigate_fragment<'a>(root: &'a Value, fragment: &str) -> Option<&'a Value> {
    let path = fragment.strip_prefix('#')?.trim_start_matches('/');
    if path.is_empty() {
        return Some(root);
    }

    let mut current = root;
    for part in path.split('/') {
        // Unescape JSON Pointer encoding (~1 = /, ~0 = ~)
        let key = part.replace("~1", "/").replace("~0", "~");
        current = match current {
            Value::Array(arr) => arr.get(key.parse::<usize>().ok()?)?,
            other => other.get(&key)?,
        };
    }
    Some(current)
}

/// Convert a YAML tree into JSON, stringifying non-string mapping keys.
fn yaml_to_json(value: serde_yaml::Value) -> Value {
    use serde_yaml::Value as Yaml;

    match value {
        Yaml::Null => Value::Null,
        Yaml::Bool(b) => Value::Bool(b),
        Yaml::Number(n) => {
            if let Some(i) = n.as_i64() {
                Value::from(i)
            } else if let Some(u) = n.as_u64() {
                Value::from(u)
            } else {
                n.as_f64()
                    .and_then(serde_json::Number::from_f64)
                    .map(Value::Number)
                    .unwrap_or(Value::Null)
            }
        }
        Yaml::String(s) => Value::String(s),
        Yaml::Sequence(seq) => Value::Array(seq.into_iter().map(yaml_to_json).collect()),
        Yaml::Mapping(mapping) => {
            let mut map = Map::new();
            for (k, v) in mapping {
                map.insert(yaml_key(&k), yaml_to_json(v));
            }
            Value::Object(map)
        }
        Yaml::Tagged(tagged) => yaml_to_json(tagged.value),
    }
}

fn yaml_key(key: &serde_yaml::Value) -> String {
    match key {
        serde_yaml::Value::String(s) => s.clone(),
        serde_yaml::Value::Number(n) => n.to_string(),
        serde_yaml::Value::Bool(b) => b.to_string(),
        serde_yaml::Value::Null => "null".to_string(),
        other => serde_yaml::to_string(other)
            .map(|s| s.trim_end().to_string())
            .unwrap_or_default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn load_document_valid_file() {
        let mut file = NamedTempFile::with_suffix(".json").unwrap();
        writeln!(file, r#"{{"definitions": {{"Pet": {{"type": "object"}}}}}}"#).unwrap();

        let doc = load_document(file.path()).unwrap();
        assert_eq!(doc.definition("Pet").unwrap()["type"], "object");
    }

    #[test]
    fn load_document_file_not_found() {
        let result = load_document(Path::new("/nonexistent/swagger.json"));
        assert!(matches!(result, Err(RenderError::FileNotFound { .. })));
    }

    #[test]
    fn load_document_invalid_json() {
        let mut file = NamedTempFile::with_suffix(".json").unwrap();
        writeln!(file, "not valid json").unwrap();

        let result = load_document(file.path());
        assert!(matches!(result, Err(RenderError::InvalidJson { .. })));
    }

    #[test]
    fn load_document_yaml_stringifies_status_codes() {
        let yaml = "paths:\n  /pets:\n    get:\n      responses:\n        200:\n          description: ok\n";
        let doc = load_document_str(yaml, DocumentFormat::Yaml, "inline.yaml").unwrap();
        let item = doc.path_item("/pets").unwrap();
        assert_eq!(item["get"]["responses"]["200"]["description"], "ok");
    }

    #[test]
    fn load_document_yaml_preserves_order() {
        let yaml = "definitions:\n  Pet:\n    properties:\n      zeta: {type: string}\n      alpha: {type: string}\n";
        let doc = load_document_str(yaml, DocumentFormat::Yaml, "inline.yaml").unwrap();
        let keys: Vec<&String> = doc.definition("Pet").unwrap()["properties"]
            .as_object()
            .unwrap()
            .keys()
            .collect();
        assert_eq!(keys, vec!["zeta", "alpha"]);
    }

    #[test]
    fn missing_definition_names_source() {
        let doc = SchemaDocument::new("swagger.json", json!({"definitions": {}}));
        let err = doc.definition("Nope").unwrap_err();
        assert_eq!(
            err.to_string(),
            "definition \"Nope\" not found in swagger.json"
        );
    }

    #[test]
    fn missing_path_errors() {
        let doc = SchemaDocument::new("swagger.json", json!({}));
        assert!(matches!(
            doc.path_item("/pets"),
            Err(RenderError::MissingPath { .. })
        ));
    }

    #[test]
    fn navigate_fragment_definitions() {
        let root = json!({"definitions": {"a/b": {"type": "string"}, "Pet": {"type": "object"}}});
        assert_eq!(
            navigate_fragment(&root, "#/definitions/Pet"),
            Some(&json!({"type": "object"}))
        );
        assert_eq!(
            navigate_fragment(&root, "#/definitions/a~1b"),
            Some(&json!({"type": "string"}))
        );
        assert_eq!(navigate_fragment(&root, "#"), Some(&root));
    }

    #[test]
    fn navigate_fragment_rejects_external_refs() {
        let root = json!({"definitions": {"Pet": {}}});
        assert_eq!(navigate_fragment(&root, "other.json#/definitions/Pet"), None);
        assert_eq!(navigate_fragment(&root, "#/definitions/Missing"), None);
    }

    #[test]
    fn base_url_defaults() {
        let doc = SchemaDocument::new("inline", json!({}));
        assert_eq!(doc.base_url(), "https://localhost");

        let doc = SchemaDocument::new(
            "inline",
            json!({"schemes": ["http"], "host": "petstore.io", "basePath": "/v2/"}),
        );
        assert_eq!(doc.base_url(), "http://petstore.io/v2");
    }

    #[test]
    fn schema_extension_detection() {
        assert!(has_schema_extension("swagger.json"));
        assert!(has_schema_extension("api/Spec.YAML"));
        assert!(has_schema_extension("openapi.yml"));
        assert!(!has_schema_extension("Pet"));
        assert!(!has_schema_extension("/pets/{id}"));
    }

    #[test]
    fn is_url_detection() {
        assert!(is_url("https://example.com/swagger.json"));
        assert!(is_url("http://example.com/swagger.json"));
        assert!(!is_url("./swagger.json"));
    }

    #[cfg(feature = "remote")]
    mod remote {
        use super::*;

        #[test]
        fn load_document_url_valid() {
            let mut server = mockito::Server::new();
            let mock = server
                .mock("GET", "/swagger.json")
                .with_status(200)
                .with_header("content-type", "application/json")
                .with_body(r#"{"definitions": {"Pet": {"type": "object"}}}"#)
                .create();

            let url = format!("{}/swagger.json", server.url());
            let doc = load_document_url(&url).unwrap();
            assert!(doc.definition("Pet").is_ok());
            assert_eq!(doc.source(), url);
            mock.assert();
        }

        #[test]
        fn load_document_url_yaml() {
            let mut server = mockito::Server::new();
            let _mock = server
                .mock("GET", "/swagger.yaml")
                .with_status(200)
                .with_body("definitions:\n  Pet:\n    type: object\n")
                .create();

            let doc = load_document_auto(&format!("{}/swagger.yaml", server.url())).unwrap();
            assert!(doc.definition("Pet").is_ok());
        }

        #[test]
        fn load_document_url_404() {
            let mut server = mockito::Server::new();
            let _mock = server
                .mock("GET", "/missing.json")
                .with_status(404)
                .create();

            let result = load_document_url(&format!("{}/missing.json", server.url()));
            assert!(matches!(result, Err(RenderError::NetworkError { .. })));
        }
    }
}
