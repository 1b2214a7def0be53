//! `$ref` link resolution against the set of definitions rendered in the
//! current document.

use std::collections::HashSet;

/// Definition names rendered by `:swg-def:` directives in one document.
///
/// Built completely before rendering starts and read-only afterwards, so a
/// definition rendered further down the page still gets a local anchor.
#[derive(Debug, Clone, Default)]
pub struct DefinitionRegistry {
    names: Vec<String>,
    index: HashSet<String>,
}

impl DefinitionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a name; duplicates keep their first position.
    pub fn insert(&mut self, name: impl Into<String>) {
        let name = name.into();
        if self.index.insert(name.clone()) {
            self.names.push(name);
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains(name)
    }

    /// Names in order of discovery.
    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

impl<S: Into<String>> FromIterator<S> for DefinitionRegistry {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let mut registry = DefinitionRegistry::new();
        for name in iter {
            registry.insert(name);
        }
        registry
    }
}

/// Last `/`-separated segment of a reference pointer.
pub fn ref_name(pointer: &str) -> &str {
    pointer.rsplit('/').next().unwrap_or(pointer)
}

/// Builds anchor links for `$ref` pointers.
#[derive(Debug, Clone, Copy)]
pub struct RefLinker<'a> {
    registry: &'a DefinitionRegistry,
    url_root: &'a str,
}

impl<'a> RefLinker<'a> {
    pub fn new(registry: &'a DefinitionRegistry, url_root: &'a str) -> Self {
        Self { registry, url_root }
    }

    /// Target URL: the bare pointer when the definition is on this page,
    /// otherwise the pointer prefixed with the definitions URL root.
    pub fn url(&self, pointer: &str) -> String {
        if self.registry.contains(ref_name(pointer)) {
            pointer.to_string()
        } else {
            format!("{}{}", self.url_root, pointer)
        }
    }

    /// `<a href="URL">Name</a>` for a pointer.
    pub fn link(&self, pointer: &str) -> String {
        format!("<a href=\"{}\">{}</a>", self.url(pointer), ref_name(pointer))
    }
}
