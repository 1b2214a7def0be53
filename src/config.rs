//! Render options and the per-directive configuration block.
//!
//! A directive line may be followed by lines indented with
//! [`CONFIG_INDENT`]; once the indentation is stripped they form a YAML
//! document:
//!
//! ```yaml
//! properties:
//!   id:
//!     hide: true
//!   name:
//!     description: Shown instead of the schema description
//! sections:
//!   requestCodeExamples: false
//! verbs: [get, post]
//! ```
//!
//! Unknown keys are ignored.

use std::collections::BTreeMap;

use serde::Deserialize;

use crate::error::RenderError;

/// Indentation unit that marks configuration block lines.
pub const CONFIG_INDENT: &str = "    ";

/// Extension-level options shared by every directive of a document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderOptions {
    /// Schema document used when a directive names no file.
    pub file: String,
    /// Prefix for links to definitions not rendered in the current document.
    pub definitions_url_root: String,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            file: "swagger.json".to_string(),
            definitions_url_root: String::new(),
        }
    }
}

impl RenderOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the default schema document.
    pub fn file(mut self, file: impl Into<String>) -> Self {
        self.file = file.into();
        self
    }

    /// Set the URL prefix for external definition links.
    pub fn definitions_url_root(mut self, root: impl Into<String>) -> Self {
        self.definitions_url_root = root.into();
        self
    }
}

/// Options read from a directive's configuration block.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct DirectiveConfig {
    /// Per-property overrides for `:swg-def:` tables.
    pub properties: BTreeMap<String, PropertyOverride>,
    /// Sections emitted by `:swg-path:`.
    pub sections: Sections,
    /// Operations emitted by `:swg-path:`.
    pub verbs: VerbFilter,
}

impl DirectiveConfig {
    /// Parse an already de-indented block.
    ///
    /// # Errors
    ///
    /// Returns `RenderError::InvalidConfig` if the block is not a YAML mapping
    /// of the recognized shape.
    pub fn parse(block: &str) -> Result<Self, RenderError> {
        let invalid = |e: serde_yaml::Error| RenderError::InvalidConfig {
            message: e.to_string(),
        };

        let raw: serde_yaml::Value = serde_yaml::from_str(block).map_err(invalid)?;
        if raw.is_null() {
            return Ok(Self::default());
        }
        serde_yaml::from_value(raw).map_err(invalid)
    }

    pub fn property(&self, name: &str) -> Option<&PropertyOverride> {
        self.properties.get(name)
    }

    /// Whether the property is hidden from its definition table.
    pub fn is_hidden(&self, name: &str) -> bool {
        self.property(name).map(|p| p.hide).unwrap_or(false)
    }
}

/// Override for one top-level definition property.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct PropertyOverride {
    pub hide: bool,
    pub description: Option<String>,
}

/// Toggles for the parts of a path rendering. All default to on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Sections {
    pub response_examples: bool,
    pub response_table: bool,
    pub request_examples: bool,
    pub request_code_examples: bool,
    pub parameters_table: bool,
}

impl Default for Sections {
    fn default() -> Self {
        Self {
            response_examples: true,
            response_table: true,
            request_examples: true,
            request_code_examples: true,
            parameters_table: true,
        }
    }
}

/// Which operations of a path get rendered.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(from = "RawVerbs")]
pub enum VerbFilter {
    #[default]
    All,
    Only(Vec<String>),
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawVerbs {
    One(String),
    Many(Vec<String>),
}

impl From<RawVerbs> for VerbFilter {
    fn from(raw: RawVerbs) -> Self {
        match raw {
            RawVerbs::One(verb) if verb.eq_ignore_ascii_case("all") => VerbFilter::All,
            RawVerbs::One(verb) => VerbFilter::Only(vec![verb]),
            RawVerbs::Many(verbs) => VerbFilter::Only(verbs),
        }
    }
}

impl VerbFilter {
    /// Case-insensitive membership test.
    pub fn allows(&self, verb: &str) -> bool {
        match self {
            VerbFilter::All => true,
            VerbFilter::Only(verbs) => verbs.iter().any(|v| v.eq_ignore_ascii_case(verb)),
        }
    }
}
