//! Error types for `web-gateway-core`.

use thiserror::Error;

/// Main error type for the gateway core.
#[derive(Error, Debug)]
pub enum GatewayError {
    /// The same (template, method) pair was declared twice with different metadata.
    #[error("Schema conflict: {method} {pattern} is declared more than once with different metadata")]
    SchemaConflict { method: String, pattern: String },

    /// Closed-world policy rejected a URL that matches no registered resource.
    #[error("URL '{url}' does not match any known resource")]
    AccessDenied { url: String },

    /// The URL matched a resource, but the method is not declared on it.
    #[error("Method {method} not supported for {url}. Available methods: {}", allowed.join(", "))]
    MethodNotAllowed {
        method: String,
        url: String,
        /// Sorted for stable error messages.
        allowed: Vec<String>,
    },

    /// The request URL could not be parsed or resolved.
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// Connection-level failure (connect, DNS, TLS, timeout). An HTTP error
    /// status is not a transport error.
    #[error("Transport error: {0}")]
    Transport(String),
}

/// Result type alias for gateway core operations.
pub type Result<T> = std::result::Result<T, GatewayError>;
