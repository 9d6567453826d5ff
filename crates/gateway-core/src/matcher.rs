//! Concrete-path resolution against a registry.

use url::Url;

use crate::error::{GatewayError, Result};
use crate::registry::{Resource, ResourceRegistry};
use crate::template::split_path;

/// Outcome of resolving a concrete path against a registry.
#[derive(Debug, Clone)]
pub enum MatchResult<'a> {
    Matched {
        resource: &'a Resource,
        /// Parameter bindings in template declaration order.
        params: Vec<(String, String)>,
    },
    NoMatch,
}

/// Find the best-matching registered template for a concrete path.
///
/// Candidates are scanned in registration order; a later candidate displaces
/// the current best only when its template is strictly more specific (literal
/// segment at the first point of difference). Earlier registration therefore
/// wins any remaining tie, making resolution deterministic.
#[must_use]
pub fn match_path<'a>(registry: &'a ResourceRegistry, concrete_path: &str) -> MatchResult<'a> {
    let segments = split_path(concrete_path);
    let mut best: Option<(&Resource, Vec<(String, String)>)> = None;

    for resource in registry.resources() {
        if let Some(params) = resource.template().matches(&segments) {
            let replace = match &best {
                None => true,
                Some((current, _)) => resource.template().more_specific_than(current.template()),
            };
            if replace {
                best = Some((resource, params));
            }
        }
    }

    match best {
        Some((resource, params)) => MatchResult::Matched { resource, params },
        None => MatchResult::NoMatch,
    }
}

/// Registered resources whose pattern starts with the given path prefix,
/// shallowest first, then lexicographic. Used for route discovery listings.
#[must_use]
pub fn prefix_matches<'a>(registry: &'a ResourceRegistry, prefix: &str) -> Vec<&'a Resource> {
    let normalized = prefix.trim_end_matches('/');
    let mut matched: Vec<&Resource> = registry
        .resources()
        .iter()
        .filter(|r| r.template().to_string().starts_with(normalized))
        .collect();
    matched.sort_by_key(|r| (r.template().segments().len(), r.template().to_string()));
    matched
}

/// Resolve a tool-supplied URL into an absolute one. Relative paths are
/// joined against the registry base URL.
///
/// # Errors
///
/// Returns [`GatewayError::InvalidUrl`] if the URL cannot be parsed or joined.
pub fn resolve_request_url(url: &str, base_url: &str) -> Result<Url> {
    match Url::parse(url) {
        Ok(parsed) => Ok(parsed),
        Err(url::ParseError::RelativeUrlWithoutBase) => {
            let base = Url::parse(base_url)
                .map_err(|e| GatewayError::InvalidUrl(format!("base URL '{base_url}': {e}")))?;
            base.join(url)
                .map_err(|e| GatewayError::InvalidUrl(format!("'{url}': {e}")))
        }
        Err(e) => Err(GatewayError::InvalidUrl(format!("'{url}': {e}"))),
    }
}

/// Extract the template-relative path from an absolute URL, stripping the
/// base URL's own path prefix (e.g. `/api` in `https://host/api`) so concrete
/// URLs line up with registered patterns.
#[must_use]
pub fn extract_path(url: &Url, base_url: &str) -> String {
    let mut path = url.path().to_string();
    if let Ok(base) = Url::parse(base_url) {
        let base_path = base.path().trim_end_matches('/');
        if !base_path.is_empty() && path.starts_with(base_path) {
            path = path[base_path.len()..].to_string();
        }
    }
    if !path.starts_with('/') {
        path.insert(0, '/');
    }
    path
}
