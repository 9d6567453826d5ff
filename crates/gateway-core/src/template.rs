//! URL path templates.
//!
//! A template is an ordered sequence of literal segments and `{name}`
//! parameter placeholders. Structural equality ignores parameter names:
//! `/users/{id}` and `/users/{uid}` describe the same template and group
//! into the same resource.

use std::fmt;
use std::hash::{Hash, Hasher};

/// One segment of a path template.
#[derive(Debug, Clone)]
pub enum Segment {
    Literal(String),
    /// Named placeholder. The name is kept for binding extraction only and
    /// does not participate in equality or hashing.
    Param(String),
}

/// A parsed path pattern such as `/users/{id}/posts`.
#[derive(Debug, Clone)]
pub struct PathTemplate {
    segments: Vec<Segment>,
}

impl PathTemplate {
    /// Parse a raw pattern. Empty segments from leading, trailing, or doubled
    /// slashes are dropped, so `/users/` and `/users` parse identically.
    #[must_use]
    pub fn parse(pattern: &str) -> Self {
        let segments = split_path(pattern)
            .into_iter()
            .map(|seg| {
                if let Some(name) = seg.strip_prefix('{').and_then(|s| s.strip_suffix('}')) {
                    Segment::Param(name.to_string())
                } else {
                    Segment::Literal(seg.to_string())
                }
            })
            .collect();
        Self { segments }
    }

    #[must_use]
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Whether the template contains any parameter placeholder.
    #[must_use]
    pub fn has_params(&self) -> bool {
        self.segments
            .iter()
            .any(|s| matches!(s, Segment::Param(_)))
    }

    /// Parameter names in declaration order.
    #[must_use]
    pub fn param_names(&self) -> Vec<&str> {
        self.segments
            .iter()
            .filter_map(|s| match s {
                Segment::Param(name) => Some(name.as_str()),
                Segment::Literal(_) => None,
            })
            .collect()
    }

    /// Match a concrete path split into segments. Literals compare
    /// byte-for-byte; a parameter binds any non-empty segment. Returns the
    /// bindings in declaration order, or `None` on any mismatch.
    #[must_use]
    pub fn matches(&self, concrete: &[&str]) -> Option<Vec<(String, String)>> {
        if concrete.len() != self.segments.len() {
            return None;
        }
        let mut params = Vec::new();
        for (segment, value) in self.segments.iter().zip(concrete) {
            match segment {
                Segment::Literal(lit) => {
                    if lit != value {
                        return None;
                    }
                }
                Segment::Param(name) => {
                    if value.is_empty() {
                        return None;
                    }
                    params.push((name.clone(), (*value).to_string()));
                }
            }
        }
        Some(params)
    }

    /// `true` when `self` is strictly more specific than `other`: at the
    /// first position where the two shapes differ, `self` has the literal.
    /// Structurally equal templates are never more specific than each other.
    #[must_use]
    pub fn more_specific_than(&self, other: &PathTemplate) -> bool {
        for (a, b) in self.segments.iter().zip(&other.segments) {
            match (a, b) {
                (Segment::Literal(_), Segment::Param(_)) => return true,
                (Segment::Param(_), Segment::Literal(_)) => return false,
                _ => {}
            }
        }
        false
    }
}

impl fmt::Display for PathTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.segments.is_empty() {
            return write!(f, "/");
        }
        for segment in &self.segments {
            match segment {
                Segment::Literal(lit) => write!(f, "/{lit}")?,
                Segment::Param(name) => write!(f, "/{{{name}}}")?,
            }
        }
        Ok(())
    }
}

impl PartialEq for PathTemplate {
    fn eq(&self, other: &Self) -> bool {
        self.segments.len() == other.segments.len()
            && self
                .segments
                .iter()
                .zip(&other.segments)
                .all(|(a, b)| match (a, b) {
                    (Segment::Literal(x), Segment::Literal(y)) => x == y,
                    (Segment::Param(_), Segment::Param(_)) => true,
                    _ => false,
                })
    }
}

impl Eq for PathTemplate {}

impl Hash for PathTemplate {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.segments.len().hash(state);
        for segment in &self.segments {
            match segment {
                Segment::Literal(lit) => {
                    0u8.hash(state);
                    lit.hash(state);
                }
                Segment::Param(_) => 1u8.hash(state),
            }
        }
    }
}

/// Split a concrete path or pattern into non-empty segments.
#[must_use]
pub fn split_path(path: &str) -> Vec<&str> {
    path.split('/').filter(|s| !s.is_empty()).collect()
}
