//! Raw `OpenAPI` document handling.
//!
//! The gateway treats operation metadata as opaque, so this handler works on
//! the raw JSON document rather than a typed model. It extracts only what
//! routing needs: paths, methods, parameter declarations, and the base URL.
//! `$ref` resolution is out of scope; documents are expected pre-resolved.

use reqwest::Method;
use serde_json::{Map, Value, json};

use crate::error::{Result, WebGatewayError};
use web_gateway_core::registry::{DeclaredOperation, ParamLocation, ParameterSpec};

/// Method keys recognized inside a path item object.
const HTTP_METHODS: [&str; 8] = [
    "get", "post", "put", "delete", "patch", "options", "head", "trace",
];

/// A parsed `OpenAPI` document, kept as raw JSON.
#[derive(Debug, Clone)]
pub struct OpenApiDocument {
    spec: Value,
}

impl OpenApiDocument {
    /// # Errors
    ///
    /// Returns an error if the value is not a JSON object.
    pub fn from_value(spec: Value) -> Result<Self> {
        if !spec.is_object() {
            return Err(WebGatewayError::OpenApi(
                "OpenAPI document must be a JSON object".to_string(),
            ));
        }
        Ok(Self { spec })
    }

    /// Parse a JSON or YAML document. JSON is a valid subset of YAML, so a
    /// single YAML parse covers both.
    ///
    /// # Errors
    ///
    /// Returns an error if the content is not valid YAML/JSON or not an
    /// object at the top level.
    pub fn parse(content: &str) -> Result<Self> {
        let spec: Value = serde_yaml::from_str(content)?;
        Self::from_value(spec)
    }

    #[must_use]
    pub fn as_value(&self) -> &Value {
        &self.spec
    }

    #[must_use]
    pub fn openapi_version(&self) -> &str {
        self.spec
            .get("openapi")
            .and_then(Value::as_str)
            .unwrap_or("3.0.0")
    }

    #[must_use]
    pub fn title(&self) -> Option<&str> {
        self.spec
            .get("info")
            .and_then(|info| info.get("title"))
            .and_then(Value::as_str)
    }

    fn paths(&self) -> Option<&Map<String, Value>> {
        self.spec.get("paths").and_then(Value::as_object)
    }

    fn servers(&self) -> Vec<String> {
        self.spec
            .get("servers")
            .and_then(Value::as_array)
            .map(|arr| {
                arr.iter()
                    .filter_map(|s| s.get("url").and_then(Value::as_str))
                    .map(|u| u.trim_end_matches('/').to_string())
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Determine the API base URL from the document's `servers` and an
    /// optional client-supplied base URL.
    ///
    /// Without a `servers` entry the client URL is required. When servers
    /// exist, a client URL must match one of them; otherwise the single
    /// server is used, or the first of several (with a warning).
    ///
    /// # Errors
    ///
    /// Returns an error when no base URL can be determined or the client URL
    /// matches no declared server.
    pub fn determine_base_url(&self, client_base_url: Option<&str>) -> Result<String> {
        let declared = self
            .spec
            .get("servers")
            .and_then(Value::as_array)
            .is_some_and(|arr| !arr.is_empty());

        if !declared {
            return client_base_url
                .map(|u| u.trim_end_matches('/').to_string())
                .ok_or_else(|| {
                    WebGatewayError::OpenApi(
                        "No servers defined in OpenAPI document and no base URL provided"
                            .to_string(),
                    )
                });
        }

        let servers = self.servers();
        if servers.is_empty() {
            return Err(WebGatewayError::OpenApi(
                "Invalid server definitions in OpenAPI document".to_string(),
            ));
        }

        if let Some(client) = client_base_url {
            let normalized = client.trim_end_matches('/');
            if servers.iter().any(|s| s == normalized) {
                return Ok(normalized.to_string());
            }
            return Err(WebGatewayError::OpenApi(format!(
                "Base URL '{client}' does not match any server in the OpenAPI document. \
                 Available servers: {}",
                servers.join(", ")
            )));
        }

        if servers.len() > 1 {
            tracing::warn!(
                chosen = %servers[0],
                candidates = servers.len(),
                "multiple servers defined and no base URL provided; using the first"
            );
        }
        Ok(servers[0].clone())
    }

    /// Flatten the document into declared operations for registry
    /// construction. Invalid path items are skipped with a warning.
    #[must_use]
    pub fn declared_operations(&self) -> Vec<DeclaredOperation> {
        let mut operations = Vec::new();
        let Some(paths) = self.paths() else {
            return operations;
        };

        for (path, path_item) in paths {
            let Some(item) = path_item.as_object() else {
                tracing::warn!(path = %path, "skipping invalid path item");
                continue;
            };
            for method_key in HTTP_METHODS {
                let Some(operation) = item.get(method_key) else {
                    continue;
                };
                let Ok(method) = method_key.to_uppercase().parse::<Method>() else {
                    continue;
                };
                operations.push(DeclaredOperation {
                    method,
                    pattern: path.clone(),
                    parameters: extract_parameters(operation),
                    metadata: operation.clone(),
                });
            }
        }
        operations
    }

    /// Build a minimal document containing only the given path, restricted to
    /// `methods` when provided.
    ///
    /// # Errors
    ///
    /// Returns an error if the path is not present in the document.
    pub fn operation_schema(&self, path: &str, methods: Option<&[String]>) -> Result<Value> {
        self.aggregated_schema(std::slice::from_ref(&path.to_string()), methods)
    }

    /// Like [`OpenApiDocument::operation_schema`], but aggregates across
    /// several spellings of the same path. The registry merges patterns that
    /// differ only in parameter names, so every spelling may contribute
    /// methods; the result is keyed under the first spelling.
    ///
    /// # Errors
    ///
    /// Returns an error when no spelling is present in the document.
    pub fn aggregated_schema(&self, patterns: &[String], methods: Option<&[String]>) -> Result<Value> {
        let Some(primary) = patterns.first() else {
            return Err(WebGatewayError::OpenApi(
                "No path given for schema aggregation".to_string(),
            ));
        };

        let wanted: Option<Vec<String>> =
            methods.map(|ms| ms.iter().map(|m| m.to_lowercase()).collect());
        let mut path_doc = Map::new();
        let mut found = false;
        for pattern in patterns {
            let Some(item) = self
                .paths()
                .and_then(|paths| paths.get(pattern))
                .and_then(Value::as_object)
            else {
                continue;
            };
            found = true;
            for method_key in HTTP_METHODS {
                if let Some(operation) = item.get(method_key)
                    && wanted
                        .as_ref()
                        .is_none_or(|ms| ms.iter().any(|m| m == method_key))
                    && !path_doc.contains_key(method_key)
                {
                    path_doc.insert(method_key.to_string(), operation.clone());
                }
            }
        }
        if !found {
            return Err(WebGatewayError::OpenApi(format!(
                "Path '{primary}' not found in OpenAPI document"
            )));
        }

        Ok(json!({
            "openapi": self.openapi_version(),
            "paths": { primary: path_doc },
        }))
    }
}

fn extract_parameters(operation: &Value) -> Vec<ParameterSpec> {
    let mut parameters: Vec<ParameterSpec> = operation
        .get("parameters")
        .and_then(Value::as_array)
        .map(|arr| arr.iter().filter_map(parameter_spec).collect())
        .unwrap_or_default();

    if let Some(body) = operation.get("requestBody") {
        let required = body
            .get("required")
            .and_then(Value::as_bool)
            .unwrap_or(false);
        parameters.push(ParameterSpec {
            name: "body".to_string(),
            location: ParamLocation::Body,
            required,
        });
    }
    parameters
}

fn parameter_spec(parameter: &Value) -> Option<ParameterSpec> {
    let name = parameter.get("name")?.as_str()?;
    let location = match parameter.get("in").and_then(Value::as_str)? {
        "path" => ParamLocation::Path,
        "query" => ParamLocation::Query,
        "header" => ParamLocation::Header,
        _ => return None,
    };
    // Path parameters are always required per the OpenAPI spec.
    let required = parameter
        .get("required")
        .and_then(Value::as_bool)
        .unwrap_or(location == ParamLocation::Path);
    Some(ParameterSpec {
        name: name.to_string(),
        location,
        required,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const PETSTORE_YAML: &str = r"
openapi: 3.1.0
info:
  title: Pet API
  version: 1.0.0
servers:
  - url: https://pets.example.com/api
paths:
  /pets:
    get:
      summary: List pets
      parameters:
        - name: limit
          in: query
          schema:
            type: integer
    post:
      summary: Create a pet
      requestBody:
        required: true
        content:
          application/json:
            schema:
              type: object
  /pets/{petId}:
    get:
      summary: Get a pet
      parameters:
        - name: petId
          in: path
          required: true
          schema:
            type: string
";

    #[test]
    fn parses_yaml_and_reads_info() {
        let doc = OpenApiDocument::parse(PETSTORE_YAML).unwrap();
        assert_eq!(doc.openapi_version(), "3.1.0");
        assert_eq!(doc.title(), Some("Pet API"));
    }

    #[test]
    fn rejects_non_object_documents() {
        assert!(OpenApiDocument::parse("- just\n- a\n- list\n").is_err());
    }

    #[test]
    fn flattens_paths_into_operations() {
        let doc = OpenApiDocument::parse(PETSTORE_YAML).unwrap();
        let ops = doc.declared_operations();
        let summary: Vec<(String, String)> = ops
            .iter()
            .map(|op| (op.method.to_string(), op.pattern.clone()))
            .collect();
        assert_eq!(
            summary,
            vec![
                ("GET".to_string(), "/pets".to_string()),
                ("POST".to_string(), "/pets".to_string()),
                ("GET".to_string(), "/pets/{petId}".to_string()),
            ]
        );
    }

    #[test]
    fn extracts_query_path_and_body_parameters() {
        let doc = OpenApiDocument::parse(PETSTORE_YAML).unwrap();
        let ops = doc.declared_operations();

        let list = &ops[0];
        assert_eq!(list.parameters.len(), 1);
        assert_eq!(list.parameters[0].name, "limit");
        assert_eq!(list.parameters[0].location, ParamLocation::Query);
        assert!(!list.parameters[0].required);

        let create = &ops[1];
        assert_eq!(create.parameters.len(), 1);
        assert_eq!(create.parameters[0].location, ParamLocation::Body);
        assert!(create.parameters[0].required);

        let get_one = &ops[2];
        assert_eq!(get_one.parameters[0].location, ParamLocation::Path);
        assert!(get_one.parameters[0].required);
    }

    #[test]
    fn base_url_requires_client_url_without_servers() {
        let doc = OpenApiDocument::parse("openapi: 3.0.0\npaths: {}\n").unwrap();
        assert!(doc.determine_base_url(None).is_err());
        assert_eq!(
            doc.determine_base_url(Some("https://api.example.com/"))
                .unwrap(),
            "https://api.example.com"
        );
    }

    #[test]
    fn base_url_must_match_a_declared_server() {
        let doc = OpenApiDocument::parse(PETSTORE_YAML).unwrap();
        assert_eq!(
            doc.determine_base_url(None).unwrap(),
            "https://pets.example.com/api"
        );
        assert_eq!(
            doc.determine_base_url(Some("https://pets.example.com/api/"))
                .unwrap(),
            "https://pets.example.com/api"
        );
        let err = doc
            .determine_base_url(Some("https://other.example.com"))
            .unwrap_err();
        assert!(err.to_string().contains("does not match any server"));
    }

    #[test]
    fn multiple_servers_fall_back_to_the_first() {
        let doc = OpenApiDocument::parse(
            "openapi: 3.0.0\nservers:\n  - url: https://a.example.com\n  - url: https://b.example.com\npaths: {}\n",
        )
        .unwrap();
        assert_eq!(doc.determine_base_url(None).unwrap(), "https://a.example.com");
    }

    #[test]
    fn operation_schema_filters_methods() {
        let doc = OpenApiDocument::parse(PETSTORE_YAML).unwrap();
        let schema = doc
            .operation_schema("/pets", Some(&["GET".to_string()]))
            .unwrap();
        let path_doc = schema
            .get("paths")
            .and_then(|p| p.get("/pets"))
            .and_then(Value::as_object)
            .unwrap();
        assert!(path_doc.contains_key("get"));
        assert!(!path_doc.contains_key("post"));

        let all = doc.operation_schema("/pets", None).unwrap();
        let path_doc = all
            .get("paths")
            .and_then(|p| p.get("/pets"))
            .and_then(Value::as_object)
            .unwrap();
        assert_eq!(path_doc.len(), 2);

        assert!(doc.operation_schema("/missing", None).is_err());
    }

    #[test]
    fn aggregated_schema_unions_path_spellings() {
        let doc = OpenApiDocument::parse(
            "openapi: 3.0.0
paths:
  /users/{id}:
    get:
      summary: Fetch a user
  /users/{uid}:
    post:
      summary: Update a user
",
        )
        .unwrap();

        let spellings = vec!["/users/{id}".to_string(), "/users/{uid}".to_string()];
        let schema = doc
            .aggregated_schema(&spellings, Some(&["GET".to_string(), "POST".to_string()]))
            .unwrap();
        let path_doc = schema
            .pointer("/paths/~1users~1{id}")
            .and_then(Value::as_object)
            .unwrap();
        assert!(path_doc.contains_key("get"));
        assert!(path_doc.contains_key("post"));

        let missing = vec!["/nope".to_string()];
        assert!(doc.aggregated_schema(&missing, None).is_err());
    }
}
