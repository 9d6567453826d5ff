//! Error types for `web-gateway-mcp`.

use thiserror::Error;
use web_gateway_core::error::GatewayError;

/// Main error type for the MCP gateway surface.
#[derive(Error, Debug)]
pub enum WebGatewayError {
    /// Configuration errors (invalid gateway config, missing fields).
    #[error("Configuration error: {0}")]
    Config(String),

    /// Runtime errors (unknown tool, invalid arguments).
    #[error("Runtime error: {0}")]
    Runtime(String),

    /// `OpenAPI` errors (document parsing, server resolution).
    #[error("OpenAPI error: {0}")]
    OpenApi(String),

    /// A resource URI that resolves to nothing in the registry.
    #[error("Resource not found: {0}")]
    ResourceNotFound(String),

    /// Errors surfaced from the routing/dispatch core.
    #[error(transparent)]
    Core(#[from] GatewayError),

    /// JSON parsing errors.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML parsing errors.
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

/// Result type alias for gateway surface operations.
pub type Result<T> = std::result::Result<T, WebGatewayError>;
