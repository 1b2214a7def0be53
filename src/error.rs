//! Error types for Swagger document rendering and example validation.

use std::path::PathBuf;
use thiserror::Error;

/// Errors while loading a schema document or rendering a directive.
#[derive(Debug, Error)]
pub enum RenderError {
    // IO errors (exit code 3)
    #[error("file not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error("cannot read {path}: {source}")]
    ReadError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[cfg(feature = "remote")]
    #[error("failed to fetch {url}: {source}")]
    NetworkError {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    // Parse errors (exit code 2)
    #[error("invalid JSON: {source}")]
    InvalidJson {
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid YAML: {source}")]
    InvalidYaml {
        #[source]
        source: serde_yaml::Error,
    },

    // Authoring errors (exit code 2)
    #[error("definition \"{name}\" not found in {source_name}")]
    MissingDefinition { name: String, source_name: String },

    #[error("path \"{path}\" not found in {source_name}")]
    MissingPath { path: String, source_name: String },

    #[error("unresolved reference {pointer}")]
    UnresolvedRef { pointer: String },

    #[error("invalid configuration block: {message}")]
    InvalidConfig { message: String },

    #[error("line {line}: {source}")]
    AtLine {
        line: usize,
        #[source]
        source: Box<RenderError>,
    },
}

impl RenderError {
    /// Returns the exit code for this error type.
    pub fn exit_code(&self) -> i32 {
        match self {
            RenderError::FileNotFound { .. } | RenderError::ReadError { .. } => 3,
            #[cfg(feature = "remote")]
            RenderError::NetworkError { .. } => 3,
            RenderError::AtLine { source, .. } => source.exit_code(),
            _ => 2,
        }
    }

    /// Attach the 1-based line number of the directive that failed.
    pub fn at_line(self, line: usize) -> Self {
        RenderError::AtLine {
            line,
            source: Box::new(self),
        }
    }
}

/// Errors while checking a synthesized example against its schema.
#[derive(Debug, Error)]
pub enum ValidateError {
    #[error("schema cannot be compiled: {message}")]
    Schema { message: String },

    #[error("example failed validation with {} error(s)", errors.len())]
    Invalid { errors: Vec<SchemaError> },
}

impl ValidateError {
    /// Returns the exit code for this error type.
    pub fn exit_code(&self) -> i32 {
        match self {
            ValidateError::Schema { .. } => 2,
            ValidateError::Invalid { .. } => 1,
        }
    }
}

/// Single validation error with path context.
#[derive(Debug, Clone, serde::Serialize)]
pub struct SchemaError {
    /// JSON Pointer (RFC 6901) into the example value.
    pub path: String,
    /// Human-readable error message.
    pub message: String,
}

impl std::fmt::Display for SchemaError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.path, self.message)
    }
}
