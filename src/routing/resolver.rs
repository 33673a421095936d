//! Route resolution module
//!
//! Computes the canonical `METHOD-path` key for every registered function and
//! resolves incoming method/path pairs back to function names.

use std::collections::HashMap;

use crate::logger;
use crate::schema::FunctionSpec;

/// Result of a reverse lookup: the function name plus any bound path parameters
#[derive(Debug)]
pub struct Resolution<'a> {
    pub function: &'a str,
    pub params: HashMap<String, String>,
}

/// Compute the effective route path for a function
///
/// `module` and `path` must both be present to form a `module/path` route;
/// a leading slash on `path` is stripped. Anything else routes at the
/// function name itself.
fn effective_path(name: &str, spec: &FunctionSpec) -> String {
    if let (Some(module), Some(path)) = (&spec.module, &spec.path) {
        // Modules can't have slashes in their names.
        if module.contains('/') {
            logger::log_warning(&format!(
                "Module '{module}' of function {name} contains a path separator, \
                 routing it at the function name instead"
            ));
            return name.to_string();
        }

        // Path must not begin with a slash.
        let path = path.strip_prefix('/').unwrap_or(path);
        return format!("{module}/{path}");
    }

    name.to_string()
}

/// Canonical `METHOD-path` route key for a function spec
pub fn route_key(name: &str, spec: &FunctionSpec) -> String {
    format!("{}-{}", spec.method_upper(), effective_path(name, spec))
}

/// Reverse lookup table from route keys to function names
///
/// Built once at registration time and read-only while serving.
#[derive(Debug, Default)]
pub struct PathTable {
    entries: HashMap<String, String>,
}

impl PathTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert the function's route key, returning it
    ///
    /// A colliding key silently takes over dispatch for that route; the
    /// earlier function's spec stays queryable but is no longer reachable
    /// at this path.
    pub fn register(&mut self, name: &str, spec: &FunctionSpec) -> String {
        let key = route_key(name, spec);
        if let Some(previous) = self.entries.insert(key.clone(), name.to_string()) {
            if previous != name {
                logger::log_warning(&format!(
                    "Route {key} re-registered by {name}; {previous} is no longer dispatchable there"
                ));
            }
        }
        key
    }

    /// Resolve a method/path pair to a registered function
    ///
    /// Exact route keys win; otherwise pattern entries with `:name` segments
    /// are tried, binding each matched segment as a path parameter.
    pub fn resolve(&self, method: &str, path: &str) -> Option<Resolution<'_>> {
        let clean_path = path.trim_start_matches('/');
        let method = method.to_uppercase();

        if let Some(name) = self.entries.get(&format!("{method}-{clean_path}")) {
            return Some(Resolution {
                function: name,
                params: HashMap::new(),
            });
        }

        let method_prefix = format!("{method}-");
        for (key, name) in &self.entries {
            let Some(pattern) = key.strip_prefix(&method_prefix) else {
                continue;
            };
            if let Some(params) = match_pattern(pattern, clean_path) {
                return Some(Resolution {
                    function: name,
                    params,
                });
            }
        }

        None
    }

    /// Number of registered routes
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Match a path against a pattern where `:name` segments bind any single segment
fn match_pattern(pattern: &str, path: &str) -> Option<HashMap<String, String>> {
    if !pattern.contains(':') {
        return None;
    }

    let pattern_segments: Vec<&str> = pattern.split('/').collect();
    let path_segments: Vec<&str> = path.split('/').collect();
    if pattern_segments.len() != path_segments.len() {
        return None;
    }

    let mut params = HashMap::new();
    for (pattern_segment, path_segment) in pattern_segments.iter().zip(&path_segments) {
        if let Some(param_name) = pattern_segment.strip_prefix(':') {
            if path_segment.is_empty() {
                return None;
            }
            params.insert(param_name.to_string(), (*path_segment).to_string());
        } else if pattern_segment != path_segment {
            return None;
        }
    }

    Some(params)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_spec(module: Option<&str>, path: Option<&str>, method: Option<&str>) -> FunctionSpec {
        FunctionSpec {
            module: module.map(String::from),
            path: path.map(String::from),
            method: method.map(String::from),
            params: Vec::new(),
        }
    }

    #[test]
    fn test_route_key_defaults_to_post_and_name() {
        let spec = make_spec(None, None, None);
        assert_eq!(route_key("test", &spec), "POST-test");
    }

    #[test]
    fn test_route_key_composes_module_and_path() {
        let spec = make_spec(Some("default"), Some("documents"), Some("get"));
        assert_eq!(route_key("list-documents", &spec), "GET-default/documents");
    }

    #[test]
    fn test_route_key_strips_leading_slash() {
        let spec = make_spec(Some("default"), Some("/documents"), None);
        assert_eq!(route_key("list-documents", &spec), "POST-default/documents");
    }

    #[test]
    fn test_route_key_module_alone_is_ignored() {
        let spec = make_spec(Some("default"), None, None);
        assert_eq!(route_key("orphan", &spec), "POST-orphan");
    }

    #[test]
    fn test_malformed_module_falls_back_to_name() {
        let spec = make_spec(Some("bad/module"), Some("documents"), None);
        assert_eq!(route_key("broken", &spec), "POST-broken");
    }

    #[test]
    fn test_resolve_exact() {
        let mut table = PathTable::new();
        table.register("test", &make_spec(None, None, None));

        let hit = table.resolve("post", "/test").unwrap();
        assert_eq!(hit.function, "test");
        assert!(hit.params.is_empty());

        assert!(table.resolve("GET", "/test").is_none());
        assert!(table.resolve("POST", "/other").is_none());
    }

    #[test]
    fn test_resolve_pattern_binds_params() {
        let mut table = PathTable::new();
        table.register(
            "get-document",
            &make_spec(Some("default"), Some(":id"), Some("get")),
        );

        let hit = table.resolve("GET", "/default/123abc").unwrap();
        assert_eq!(hit.function, "get-document");
        assert_eq!(hit.params.get("id").map(String::as_str), Some("123abc"));

        assert!(table.resolve("GET", "/default").is_none());
        assert!(table.resolve("GET", "/default/1/2").is_none());
    }

    #[test]
    fn test_collision_last_registration_wins() {
        let mut table = PathTable::new();
        table.register("first", &make_spec(Some("api"), Some("thing"), None));
        table.register("second", &make_spec(Some("api"), Some("thing"), None));

        let hit = table.resolve("POST", "/api/thing").unwrap();
        assert_eq!(hit.function, "second");
        assert_eq!(table.len(), 1);
    }
}
