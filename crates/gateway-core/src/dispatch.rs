//! REST dispatch and access policy enforcement.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::RwLock;
use reqwest::Method;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use url::Url;

use crate::error::{GatewayError, Result};
use crate::matcher::{self, MatchResult};
use crate::registry::ResourceRegistry;
use crate::transport::{HttpTransport, TransportRequest, TransportResponse};

/// Reachability policy, fixed at dispatcher construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccessPolicy {
    /// Only registered paths are reachable; unmatched URLs are rejected
    /// before the transport is invoked.
    ClosedWorld,
    /// Any URL is reachable; unmatched requests skip method validation.
    OpenWorld,
}

impl AccessPolicy {
    #[must_use]
    pub fn is_open_world(self) -> bool {
        matches!(self, AccessPolicy::OpenWorld)
    }
}

/// One dispatch call, as shaped by the tool layer.
#[derive(Debug, Clone)]
pub struct DispatchRequest {
    pub method: Method,
    pub url: String,
    /// Query parameters, stringified per value.
    pub params: Option<Map<String, Value>>,
    /// JSON body, honored only for body-carrying methods.
    pub body: Option<Value>,
    pub headers: Vec<(String, String)>,
    /// Overrides the dispatcher default when set.
    pub timeout: Option<Duration>,
}

impl DispatchRequest {
    #[must_use]
    pub fn new(method: Method, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            params: None,
            body: None,
            headers: Vec::new(),
            timeout: None,
        }
    }
}

/// Successful dispatch outcome. Carries the upstream response whatever its
/// HTTP status; status interpretation is the caller's concern.
#[derive(Debug, Clone)]
pub struct Execution {
    pub status: u16,
    pub body: Value,
}

/// Validates requests against the published registry and forwards them to
/// the transport.
pub struct Dispatcher {
    registry: RwLock<Arc<ResourceRegistry>>,
    transport: Arc<dyn HttpTransport>,
    policy: AccessPolicy,
    default_timeout: Duration,
}

impl Dispatcher {
    #[must_use]
    pub fn new(
        registry: Arc<ResourceRegistry>,
        transport: Arc<dyn HttpTransport>,
        policy: AccessPolicy,
        default_timeout: Duration,
    ) -> Self {
        Self {
            registry: RwLock::new(registry),
            transport,
            policy,
            default_timeout,
        }
    }

    #[must_use]
    pub fn policy(&self) -> AccessPolicy {
        self.policy
    }

    /// Snapshot of the currently published registry.
    #[must_use]
    pub fn registry(&self) -> Arc<ResourceRegistry> {
        self.registry.read().clone()
    }

    /// Atomically publish a replacement registry. In-flight dispatches keep
    /// the snapshot they already resolved.
    pub fn swap_registry(&self, registry: Arc<ResourceRegistry>) {
        *self.registry.write() = registry;
    }

    /// Validate and execute one request.
    ///
    /// # Errors
    ///
    /// [`GatewayError::AccessDenied`] for unmatched URLs under a closed-world
    /// policy, [`GatewayError::MethodNotAllowed`] for matched resources
    /// without the method, [`GatewayError::InvalidUrl`] for unparseable URLs,
    /// and [`GatewayError::Transport`] for connection-level failures. An HTTP
    /// error status from upstream is a success.
    pub async fn dispatch(&self, request: DispatchRequest) -> Result<Execution> {
        let registry = self.registry();
        let url = matcher::resolve_request_url(&request.url, registry.base_url())?;
        let path = matcher::extract_path(&url, registry.base_url());

        match matcher::match_path(&registry, &path) {
            MatchResult::Matched { resource, .. } => {
                if !resource.supports(&request.method) {
                    return Err(GatewayError::MethodNotAllowed {
                        method: request.method.to_string(),
                        url: request.url,
                        allowed: resource.allowed_methods(),
                    });
                }
                tracing::debug!(method = %request.method, path = %path, "dispatching to registered resource");
            }
            MatchResult::NoMatch => {
                if !self.policy.is_open_world() {
                    return Err(GatewayError::AccessDenied { url: request.url });
                }
                tracing::debug!(method = %request.method, url = %url, "open-world dispatch to unregistered URL");
            }
        }

        let timeout = request.timeout.unwrap_or(self.default_timeout);
        let transport_request = build_transport_request(request, url, timeout);
        let TransportResponse { status, body } =
            self.transport.execute(transport_request).await?;
        Ok(Execution { status, body })
    }
}

fn carries_body(method: &Method) -> bool {
    *method == Method::POST || *method == Method::PUT || *method == Method::PATCH
}

fn build_transport_request(
    request: DispatchRequest,
    url: Url,
    timeout: Duration,
) -> TransportRequest {
    let body = if carries_body(&request.method) {
        request.body
    } else {
        None
    };
    let query = request
        .params
        .map(|map| {
            map.into_iter()
                .map(|(name, value)| (name, value_to_string(&value)))
                .collect()
        })
        .unwrap_or_default();

    TransportRequest {
        method: request.method,
        url,
        query,
        body,
        headers: request.headers,
        timeout,
    }
}

/// Render a JSON value for a query-string or header position: strings pass
/// through bare, everything else is serialized.
#[must_use]
pub fn value_to_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
