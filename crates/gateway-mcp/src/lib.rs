//! MCP-facing surface for the web gateway.
//!
//! Exposes an OpenAPI-described HTTP API to a tool-calling client as a fixed
//! set of generic per-method REST tools (GET/POST/PUT/PATCH/DELETE/OPTIONS)
//! plus a resource listing derived from the API's paths. Protocol framing is
//! left to the embedding server; this crate only produces `rmcp` model types.

pub mod error;
pub mod gateway;
pub mod openapi;
pub mod semantics;
