//! Core routing and dispatch engine for the MCP web gateway.
//!
//! This crate knows nothing about MCP or OpenAPI documents. It takes a flat
//! list of declared operations (method + path pattern + opaque metadata),
//! builds an immutable [`registry::ResourceRegistry`], resolves concrete URLs
//! against it, and dispatches validated requests through a pluggable
//! [`transport::HttpTransport`].

pub mod dispatch;
pub mod error;
pub mod matcher;
pub mod registry;
pub mod template;
pub mod transport;
