//! The web gateway: resource discovery, generic REST tools, and dispatch.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::RwLock;
use reqwest::Method;
use rmcp::model::{CallToolResult, Content, JsonObject, Tool};
use serde::Serialize;
use serde_json::{Map, Value, json};

use crate::error::{Result, WebGatewayError};
use crate::openapi::OpenApiDocument;
use crate::semantics::annotations_for_method;
use web_gateway_core::dispatch::{
    AccessPolicy, DispatchRequest, Dispatcher, Execution, value_to_string,
};
use web_gateway_core::matcher::{self, MatchResult};
use web_gateway_core::registry::{Resource, ResourceRegistry};
use web_gateway_core::template::PathTemplate;
use web_gateway_core::transport::{HttpTransport, ReqwestTransport};

/// HTTP methods exposed as generic REST tools.
const REST_TOOL_METHODS: [&str; 6] = ["GET", "POST", "PUT", "PATCH", "DELETE", "OPTIONS"];

/// Cap on the resource URIs listed in an OPTIONS "nothing found" response.
const MAX_LISTED_RESOURCES: usize = 10;

/// Gateway construction options.
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    pub name: String,
    /// Client-supplied base URL; validated against the document's servers.
    pub base_url: Option<String>,
    pub policy: AccessPolicy,
    pub default_timeout: Duration,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            name: "mcp-web-gateway".to_string(),
            base_url: None,
            policy: AccessPolicy::ClosedWorld,
            default_timeout: Duration::from_secs(30),
        }
    }
}

/// Discovery kind of a listed resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceKind {
    /// Fully literal path.
    Resource,
    /// Path with parameter placeholders.
    Template,
}

/// One entry in the gateway's resource listing.
#[derive(Debug, Clone, Serialize)]
pub struct ResourceInfo {
    pub uri: String,
    pub name: String,
    pub description: String,
    pub methods: Vec<String>,
    pub kind: ResourceKind,
}

struct GatewayState {
    document: OpenApiDocument,
    registry: Arc<ResourceRegistry>,
}

/// Exposes an `OpenAPI`-described HTTP API as MCP resources plus one generic
/// tool per HTTP method.
pub struct WebGateway {
    name: String,
    client_base_url: Option<String>,
    state: RwLock<Arc<GatewayState>>,
    dispatcher: Dispatcher,
}

impl WebGateway {
    /// Build a gateway over a raw `OpenAPI` document value with an explicit
    /// transport.
    ///
    /// # Errors
    ///
    /// Returns an error if the document is invalid, no base URL can be
    /// determined, or the registry detects a schema conflict.
    pub fn build(
        spec: Value,
        config: GatewayConfig,
        transport: Arc<dyn HttpTransport>,
    ) -> Result<Self> {
        let document = OpenApiDocument::from_value(spec)?;
        let base_url = document.determine_base_url(config.base_url.as_deref())?;
        let registry = Arc::new(ResourceRegistry::build(
            base_url.as_str(),
            document.declared_operations(),
        )?);
        tracing::info!(
            name = %config.name,
            base_url = %base_url,
            resources = registry.len(),
            policy = ?config.policy,
            "created web gateway"
        );

        let dispatcher = Dispatcher::new(
            Arc::clone(&registry),
            transport,
            config.policy,
            config.default_timeout,
        );
        Ok(Self {
            name: config.name,
            client_base_url: config.base_url,
            state: RwLock::new(Arc::new(GatewayState { document, registry })),
            dispatcher,
        })
    }

    /// Build with the default `reqwest` transport.
    ///
    /// # Errors
    ///
    /// Same as [`WebGateway::build`].
    pub fn from_spec(spec: Value, config: GatewayConfig) -> Result<Self> {
        Self::build(spec, config, Arc::new(ReqwestTransport::new()))
    }

    /// Parse a JSON or YAML document and build a gateway over it.
    ///
    /// # Errors
    ///
    /// Same as [`WebGateway::build`], plus parse errors.
    pub fn from_spec_str(content: &str, config: GatewayConfig) -> Result<Self> {
        Self::from_spec(OpenApiDocument::parse(content)?.as_value().clone(), config)
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn policy(&self) -> AccessPolicy {
        self.dispatcher.policy()
    }

    /// Replace the served document. The new registry is built fully before
    /// anything is published; on failure the old state keeps serving.
    ///
    /// # Errors
    ///
    /// Same as [`WebGateway::build`]; the gateway is unchanged on error.
    pub fn reload(&self, spec: Value) -> Result<()> {
        let document = OpenApiDocument::from_value(spec)?;
        let base_url = document.determine_base_url(self.client_base_url.as_deref())?;
        let registry = Arc::new(ResourceRegistry::build(
            base_url.as_str(),
            document.declared_operations(),
        )?);
        tracing::info!(name = %self.name, resources = registry.len(), "reloaded web gateway");

        *self.state.write() = Arc::new(GatewayState {
            document,
            registry: Arc::clone(&registry),
        });
        self.dispatcher.swap_registry(registry);
        Ok(())
    }

    fn state(&self) -> Arc<GatewayState> {
        self.state.read().clone()
    }

    /// List every registered resource in first-registration order.
    #[must_use]
    pub fn list_resources(&self) -> Vec<ResourceInfo> {
        let state = self.state();
        state
            .registry
            .resources()
            .iter()
            .map(|resource| resource_info(&state.registry, resource))
            .collect()
    }

    /// Read a resource by URI: the aggregated schema document covering every
    /// method declared on it. Accepts both pattern URIs (placeholders
    /// preserved) and concrete URIs.
    ///
    /// # Errors
    ///
    /// Returns [`WebGatewayError::ResourceNotFound`] for URIs that resolve to
    /// nothing in the registry.
    pub fn read_resource(&self, uri: &str) -> Result<Value> {
        let state = self.state();
        let registry = &state.registry;
        let url = matcher::resolve_request_url(uri, registry.base_url())?;
        let path = matcher::extract_path(&url, registry.base_url());

        let resource = if let Some(found) = registry.lookup(&PathTemplate::parse(&path)) {
            found
        } else {
            match matcher::match_path(registry, &path) {
                MatchResult::Matched { resource, .. } => resource,
                MatchResult::NoMatch => {
                    return Err(WebGatewayError::ResourceNotFound(uri.to_string()));
                }
            }
        };

        let schema = state
            .document
            .aggregated_schema(resource.patterns(), Some(&resource.methods()))?;
        Ok(schema)
    }

    /// The fixed set of generic REST tools, annotated per method semantics
    /// and the gateway's access policy.
    #[must_use]
    pub fn list_tools(&self) -> Vec<Tool> {
        let open_world = self.policy().is_open_world();
        REST_TOOL_METHODS
            .iter()
            .filter_map(|name| {
                let method = method_for_tool(name)?;
                let schema = tool_input_schema(&method);
                let mut tool = Tool::new(
                    (*name).to_string(),
                    tool_description(name),
                    Arc::new(schema),
                );
                tool.annotations = Some(annotations_for_method(&method, open_world));
                Some(tool)
            })
            .collect()
    }

    /// Execute one of the generic REST tools.
    ///
    /// # Errors
    ///
    /// Returns an error for unknown tools, missing/invalid arguments, and any
    /// dispatch error (access denied, method not allowed, transport failure).
    pub async fn call_tool(&self, name: &str, arguments: Value) -> Result<CallToolResult> {
        let method = method_for_tool(name)
            .ok_or_else(|| WebGatewayError::Runtime(format!("Tool not found: {name}")))?;
        let url = arguments
            .get("url")
            .and_then(Value::as_str)
            .ok_or_else(|| {
                WebGatewayError::Runtime("Missing required argument: url".to_string())
            })?
            .to_string();
        let params = arguments.get("params").and_then(Value::as_object).cloned();
        let headers = arguments
            .get("headers")
            .and_then(Value::as_object)
            .map(|map| {
                map.iter()
                    .map(|(name, value)| (name.clone(), value_to_string(value)))
                    .collect()
            })
            .unwrap_or_default();

        if method == Method::OPTIONS {
            return self.options_tool(&url, params, headers).await;
        }

        let mut request = DispatchRequest::new(method, url);
        request.params = params;
        request.body = arguments.get("body").cloned().filter(|v| !v.is_null());
        request.headers = headers;

        let execution = self.dispatcher.dispatch(request).await?;
        Ok(shape_execution(&execution))
    }

    /// OPTIONS with discovery fallbacks: a declared OPTIONS operation
    /// executes normally; otherwise a matched resource answers with its
    /// aggregated schema, an unmatched path with prefix-discovered routes,
    /// and failing all of that, with a listing of available resources.
    async fn options_tool(
        &self,
        url: &str,
        params: Option<Map<String, Value>>,
        headers: Vec<(String, String)>,
    ) -> Result<CallToolResult> {
        let state = self.state();
        let registry = &state.registry;

        let dispatch_options = |url: String| {
            let mut request = DispatchRequest::new(Method::OPTIONS, url);
            request.params = params.clone();
            request.headers = headers.clone();
            request
        };

        // Open world has no discovery surface to fall back on.
        if self.policy().is_open_world() {
            let execution = self.dispatcher.dispatch(dispatch_options(url.to_string())).await?;
            return Ok(shape_execution(&execution));
        }

        let parsed = matcher::resolve_request_url(url, registry.base_url())?;
        let path = matcher::extract_path(&parsed, registry.base_url());

        if let MatchResult::Matched { resource, .. } = matcher::match_path(registry, &path) {
            if resource.supports(&Method::OPTIONS) {
                let execution = self.dispatcher.dispatch(dispatch_options(url.to_string())).await?;
                return Ok(shape_execution(&execution));
            }
            let schema = state
                .document
                .aggregated_schema(resource.patterns(), Some(&resource.methods()))?;
            return Ok(structured_result(schema));
        }

        let discovered = matcher::prefix_matches(registry, &path);
        if !discovered.is_empty() {
            let routes: Vec<Value> = discovered
                .iter()
                .map(|resource| {
                    json!({
                        "url": registry.resource_uri(resource),
                        "methods": resource.methods(),
                        "type": if resource.is_template() { "template" } else { "resource" },
                    })
                })
                .collect();
            return Ok(structured_result(json!({
                "matching_routes": routes,
                "description": format!("Routes matching '{path}'"),
            })));
        }

        let available: Vec<String> = registry
            .resources()
            .iter()
            .take(MAX_LISTED_RESOURCES)
            .map(|resource| registry.resource_uri(resource))
            .collect();
        Ok(structured_result(json!({
            "error": format!("No resources found matching {url}"),
            "available_resources": available,
        })))
    }
}

fn resource_info(registry: &ResourceRegistry, resource: &Resource) -> ResourceInfo {
    let pattern = resource.pattern();
    let (kind, name, description) = if resource.is_template() {
        (
            ResourceKind::Template,
            format!(
                "template_{}",
                pattern.replace('/', "_").replace(['{', '}'], "")
            ),
            format!("Resource template for {pattern}"),
        )
    } else {
        (
            ResourceKind::Resource,
            format!("resource_{}", pattern.replace('/', "_")),
            format!("Resource for {pattern}"),
        )
    };
    ResourceInfo {
        uri: registry.resource_uri(resource),
        name,
        description,
        methods: resource.methods(),
        kind,
    }
}

fn method_for_tool(name: &str) -> Option<Method> {
    match name {
        "GET" => Some(Method::GET),
        "POST" => Some(Method::POST),
        "PUT" => Some(Method::PUT),
        "PATCH" => Some(Method::PATCH),
        "DELETE" => Some(Method::DELETE),
        "OPTIONS" => Some(Method::OPTIONS),
        _ => None,
    }
}

fn tool_description(method: &str) -> String {
    match method {
        "GET" => "Execute a GET request to retrieve data from a resource URL".to_string(),
        "POST" => "Execute a POST request to create or submit data at a resource URL".to_string(),
        "PUT" => "Execute a PUT request to replace data at a resource URL".to_string(),
        "PATCH" => "Execute a PATCH request to update data at a resource URL".to_string(),
        "DELETE" => "Execute a DELETE request to remove data at a resource URL".to_string(),
        "OPTIONS" => {
            "Execute an OPTIONS request to discover the methods and schema of a resource URL"
                .to_string()
        }
        other => format!("Execute a {other} request on a resource URL"),
    }
}

fn carries_body(method: &Method) -> bool {
    *method == Method::POST || *method == Method::PUT || *method == Method::PATCH
}

fn tool_input_schema(method: &Method) -> JsonObject {
    let mut properties = json!({
        "url": {
            "type": "string",
            "description": "Target URL, absolute or relative to the API base URL",
        },
        "params": {
            "type": "object",
            "description": "Query parameters",
        },
        "headers": {
            "type": "object",
            "description": "Additional request headers",
        },
    });
    if carries_body(method)
        && let Some(map) = properties.as_object_mut()
    {
        map.insert(
            "body".to_string(),
            json!({"type": "object", "description": "JSON request body"}),
        );
    }

    let schema = json!({
        "type": "object",
        "properties": properties,
        "required": ["url"],
    });
    schema.as_object().cloned().unwrap_or_else(JsonObject::new)
}

/// Shape a dispatch outcome into a tool result. Both `structured_content`
/// and serialized text content are emitted for interoperability: some MCP
/// clients only render `content`.
fn shape_execution(execution: &Execution) -> CallToolResult {
    // No-content statuses carry no representation and render as empty text.
    // A 200 with an empty object body is a real response and keeps its status.
    if execution.status == 204 || execution.status == 205 {
        return CallToolResult::success(vec![Content::text(String::new())]);
    }
    structured_result(json!({
        "status": execution.status,
        "body": execution.body,
    }))
}

fn structured_result(value: Value) -> CallToolResult {
    let text = serde_json::to_string(&value).unwrap_or_else(|_| value.to_string());
    CallToolResult {
        content: vec![Content::text(text)],
        structured_content: Some(value),
        is_error: Some(false),
        meta: None,
    }
}
