//! The resource registry: declared operations grouped by path template.
//!
//! Built once from a flat operation list, then shared immutably. Hot reload
//! means building a fresh registry and swapping the published `Arc`, never
//! mutating one in place.

use std::collections::HashMap;

use reqwest::Method;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{GatewayError, Result};
use crate::template::PathTemplate;

/// Where a declared parameter is carried on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParamLocation {
    Path,
    Query,
    Header,
    Body,
}

/// One declared operation parameter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParameterSpec {
    pub name: String,
    pub location: ParamLocation,
    pub required: bool,
}

/// Input to registry construction: one HTTP method on one raw path pattern,
/// with opaque schema metadata passed through from the source document.
#[derive(Debug, Clone)]
pub struct DeclaredOperation {
    pub method: Method,
    pub pattern: String,
    pub parameters: Vec<ParameterSpec>,
    pub metadata: Value,
}

/// One HTTP method attached to a resource.
#[derive(Debug, Clone)]
pub struct Operation {
    pub method: Method,
    pub parameters: Vec<ParameterSpec>,
    /// Opaque schema metadata. The registry only ever compares it for
    /// equality; interpretation belongs to the document layer.
    pub metadata: Value,
}

/// A path template together with every method declared on it.
#[derive(Debug, Clone)]
pub struct Resource {
    template: PathTemplate,
    /// Every raw pattern spelling merged into this resource, first declared
    /// first. Spellings differ in parameter names (or trailing slashes), and
    /// document lookups must consult all of them.
    patterns: Vec<String>,
    operations: Vec<Operation>,
}

impl Resource {
    #[must_use]
    pub fn template(&self) -> &PathTemplate {
        &self.template
    }

    /// The pattern string the resource was first declared under.
    #[must_use]
    pub fn pattern(&self) -> &str {
        &self.patterns[0]
    }

    /// All merged pattern spellings, first declared first.
    #[must_use]
    pub fn patterns(&self) -> &[String] {
        &self.patterns
    }

    /// Operations in declaration order.
    #[must_use]
    pub fn operations(&self) -> &[Operation] {
        &self.operations
    }

    #[must_use]
    pub fn operation(&self, method: &Method) -> Option<&Operation> {
        self.operations.iter().find(|op| op.method == *method)
    }

    #[must_use]
    pub fn supports(&self, method: &Method) -> bool {
        self.operation(method).is_some()
    }

    /// Method names in declaration order.
    #[must_use]
    pub fn methods(&self) -> Vec<String> {
        self.operations
            .iter()
            .map(|op| op.method.to_string())
            .collect()
    }

    /// Method names sorted alphabetically, for stable error messages.
    #[must_use]
    pub fn allowed_methods(&self) -> Vec<String> {
        let mut methods = self.methods();
        methods.sort();
        methods
    }

    /// Whether the path contains parameter placeholders.
    #[must_use]
    pub fn is_template(&self) -> bool {
        self.template.has_params()
    }
}

/// Immutable registry of resources, in first-registration order.
#[derive(Debug)]
pub struct ResourceRegistry {
    base_url: String,
    resources: Vec<Resource>,
    index: HashMap<PathTemplate, usize>,
}

impl ResourceRegistry {
    /// Build a registry from declared operations.
    ///
    /// Operations with structurally equal templates (parameter names ignored)
    /// merge into one resource whose method set is the union. Re-declaring a
    /// (template, method) pair with identical metadata lets the later
    /// definition win silently; differing metadata is a conflict.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::SchemaConflict`] on a duplicate
    /// (template, method) pair with different metadata. Nothing is published
    /// on failure.
    pub fn build(base_url: impl Into<String>, operations: Vec<DeclaredOperation>) -> Result<Self> {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        let mut resources: Vec<Resource> = Vec::new();
        let mut index: HashMap<PathTemplate, usize> = HashMap::new();

        for decl in operations {
            let template = PathTemplate::parse(&decl.pattern);
            let idx = if let Some(&i) = index.get(&template) {
                i
            } else {
                resources.push(Resource {
                    template: template.clone(),
                    patterns: Vec::new(),
                    operations: Vec::new(),
                });
                index.insert(template, resources.len() - 1);
                resources.len() - 1
            };

            let resource = &mut resources[idx];
            if !resource.patterns.contains(&decl.pattern) {
                resource.patterns.push(decl.pattern.clone());
            }
            if let Some(existing) = resource
                .operations
                .iter_mut()
                .find(|op| op.method == decl.method)
            {
                if existing.metadata != decl.metadata {
                    return Err(GatewayError::SchemaConflict {
                        method: decl.method.to_string(),
                        pattern: resource.template.to_string(),
                    });
                }
                existing.parameters = decl.parameters;
                existing.metadata = decl.metadata;
            } else {
                resource.operations.push(Operation {
                    method: decl.method,
                    parameters: decl.parameters,
                    metadata: decl.metadata,
                });
            }
        }

        tracing::info!(
            base_url = %base_url,
            resources = resources.len(),
            "built resource registry"
        );
        Ok(Self {
            base_url,
            resources,
            index,
        })
    }

    /// Base URL with any trailing slash removed.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Resources in first-registration order.
    #[must_use]
    pub fn resources(&self) -> &[Resource] {
        &self.resources
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.resources.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }

    /// Look up a resource by structural template equality.
    #[must_use]
    pub fn lookup(&self, template: &PathTemplate) -> Option<&Resource> {
        self.index.get(template).map(|&i| &self.resources[i])
    }

    /// Full URI for a resource, placeholders preserved.
    #[must_use]
    pub fn resource_uri(&self, resource: &Resource) -> String {
        format!("{}{}", self.base_url, resource.template())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn op(method: Method, pattern: &str, metadata: Value) -> DeclaredOperation {
        DeclaredOperation {
            method,
            pattern: pattern.to_string(),
            parameters: Vec::new(),
            metadata,
        }
    }

    #[test]
    fn merges_methods_across_param_names() {
        let registry = ResourceRegistry::build(
            "https://api.example.com",
            vec![
                op(Method::GET, "/users/{id}", json!({"summary": "get"})),
                op(Method::POST, "/users/{uid}", json!({"summary": "post"})),
            ],
        )
        .unwrap();

        assert_eq!(registry.len(), 1);
        let resource = &registry.resources()[0];
        assert_eq!(resource.methods(), vec!["GET", "POST"]);
        // First registration names the resource, but every merged spelling
        // stays available for document lookups.
        assert_eq!(resource.pattern(), "/users/{id}");
        assert_eq!(resource.patterns(), ["/users/{id}", "/users/{uid}"]);
        assert!(resource.is_template());
    }

    #[test]
    fn conflicting_metadata_is_an_error() {
        let err = ResourceRegistry::build(
            "https://api.example.com",
            vec![
                op(Method::GET, "/users", json!({"summary": "a"})),
                op(Method::GET, "/users", json!({"summary": "b"})),
            ],
        )
        .unwrap_err();

        assert!(matches!(
            err,
            GatewayError::SchemaConflict { ref method, ref pattern }
                if method == "GET" && pattern == "/users"
        ));
    }

    #[test]
    fn identical_redeclaration_is_accepted() {
        let registry = ResourceRegistry::build(
            "https://api.example.com",
            vec![
                op(Method::GET, "/users", json!({"summary": "a"})),
                op(Method::GET, "/users/", json!({"summary": "a"})),
            ],
        )
        .unwrap();
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.resources()[0].methods(), vec!["GET"]);
    }

    #[test]
    fn listing_keeps_first_registration_order() {
        let registry = ResourceRegistry::build(
            "https://api.example.com",
            vec![
                op(Method::GET, "/b", json!({})),
                op(Method::GET, "/a", json!({})),
                op(Method::POST, "/b", json!({"x": 1})),
            ],
        )
        .unwrap();

        let patterns: Vec<_> = registry
            .resources()
            .iter()
            .map(|r| r.template().to_string())
            .collect();
        assert_eq!(patterns, vec!["/b", "/a"]);
    }

    #[test]
    fn lookup_ignores_param_names() {
        let registry = ResourceRegistry::build(
            "https://api.example.com/",
            vec![op(Method::GET, "/users/{id}", json!({}))],
        )
        .unwrap();

        let found = registry
            .lookup(&PathTemplate::parse("/users/{anything}"))
            .unwrap();
        assert_eq!(found.pattern(), "/users/{id}");
        assert_eq!(
            registry.resource_uri(found),
            "https://api.example.com/users/{id}"
        );
    }

    #[test]
    fn allowed_methods_are_sorted() {
        let registry = ResourceRegistry::build(
            "https://api.example.com",
            vec![
                op(Method::POST, "/users", json!({"a": 1})),
                op(Method::GET, "/users", json!({"b": 2})),
                op(Method::DELETE, "/users", json!({"c": 3})),
            ],
        )
        .unwrap();

        let resource = &registry.resources()[0];
        assert_eq!(resource.methods(), vec!["POST", "GET", "DELETE"]);
        assert_eq!(resource.allowed_methods(), vec!["DELETE", "GET", "POST"]);
    }
}
