//! HTTP semantics helpers.
//!
//! Generates MCP `ToolAnnotations` for the generic REST tools from RFC
//! 9110-style method semantics.

use reqwest::Method;
use rmcp::model::ToolAnnotations;

/// Generate MCP tool annotations for one HTTP method.
///
/// `open_world` mirrors the gateway's access policy: a closed-world gateway
/// advertises `openWorldHint: false` because tools can only reach registered
/// resources. For unknown/extension methods, only the open-world hint is set.
#[must_use]
pub fn annotations_for_method(method: &Method, open_world: bool) -> ToolAnnotations {
    let open_world_hint = Some(open_world);

    if method == Method::GET || method == Method::HEAD || method == Method::OPTIONS {
        return ToolAnnotations {
            title: None,
            read_only_hint: Some(true),
            destructive_hint: Some(false),
            idempotent_hint: Some(true),
            open_world_hint,
        };
    }

    if method == Method::POST {
        return ToolAnnotations {
            title: None,
            read_only_hint: Some(false),
            destructive_hint: Some(false),
            idempotent_hint: Some(false),
            open_world_hint,
        };
    }

    if method == Method::PUT || method == Method::DELETE {
        return ToolAnnotations {
            title: None,
            read_only_hint: Some(false),
            destructive_hint: Some(true),
            idempotent_hint: Some(true),
            open_world_hint,
        };
    }

    if method == Method::PATCH {
        return ToolAnnotations {
            title: None,
            read_only_hint: Some(false),
            destructive_hint: Some(true),
            // PATCH may or may not be idempotent; do not guess.
            idempotent_hint: None,
            open_world_hint,
        };
    }

    ToolAnnotations {
        title: None,
        read_only_hint: None,
        destructive_hint: None,
        idempotent_hint: None,
        open_world_hint,
    }
}

#[cfg(test)]
mod tests {
    use super::annotations_for_method;
    use reqwest::Method;

    #[test]
    fn open_world_hint_mirrors_the_policy() {
        for m in [
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ] {
            assert_eq!(annotations_for_method(&m, true).open_world_hint, Some(true));
            assert_eq!(
                annotations_for_method(&m, false).open_world_hint,
                Some(false)
            );
        }
    }

    #[test]
    fn get_is_readonly_and_idempotent() {
        let a = annotations_for_method(&Method::GET, false);
        assert_eq!(a.read_only_hint, Some(true));
        assert_eq!(a.destructive_hint, Some(false));
        assert_eq!(a.idempotent_hint, Some(true));
    }

    #[test]
    fn patch_leaves_idempotence_unknown() {
        let a = annotations_for_method(&Method::PATCH, true);
        assert_eq!(a.read_only_hint, Some(false));
        assert_eq!(a.destructive_hint, Some(true));
        assert_eq!(a.idempotent_hint, None);
    }

    #[test]
    fn unknown_method_only_sets_open_world() {
        let custom: Method = "PROPFIND".parse().expect("valid method token");
        let a = annotations_for_method(&custom, true);
        assert_eq!(a.read_only_hint, None);
        assert_eq!(a.destructive_hint, None);
        assert_eq!(a.idempotent_hint, None);
        assert_eq!(a.open_world_hint, Some(true));
    }
}
