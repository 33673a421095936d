//! Function registry module
//!
//! Explicit registry owned by the server state: the declarative specs from
//! the map file, the handler bindings, and the derived path table. Never a
//! process-wide singleton, so tests can run several independent instances.

use std::collections::HashMap;
use std::sync::Arc;

use serde_json::Value;

use crate::logger;
use crate::routing::{PathTable, Resolution};
use crate::schema::{FunctionMap, FunctionSpec};

use super::completion::Completion;

/// Request-scoped information handed to handlers alongside the payload
#[derive(Debug, Clone)]
pub struct RequestInfo {
    pub method: String,
    pub path: String,
    /// Path parameters bound by `:name` route segments
    pub params: HashMap<String, String>,
    pub headers: HashMap<String, String>,
}

/// User-supplied function handler
///
/// Receives the parsed request body, the audit request key, the completion
/// handle, and the request information. The handler (or any task it spawns)
/// must fire the completion exactly once.
pub type FunctionHandler = Arc<dyn Fn(Value, String, Completion, RequestInfo) + Send + Sync>;

/// Function specs, handler bindings, and the derived path table
pub struct Registry {
    specs: FunctionMap,
    handlers: HashMap<String, FunctionHandler>,
    paths: PathTable,
}

impl Registry {
    /// Build a registry from the loaded function map
    ///
    /// Every mapped function gets a route immediately; handlers are bound
    /// separately via [`Self::register_function`].
    pub fn new(specs: FunctionMap) -> Self {
        let mut paths = PathTable::new();
        for (name, spec) in &specs {
            paths.register(name, spec);
        }

        Self {
            specs,
            handlers: HashMap::new(),
            paths,
        }
    }

    /// Bind a handler to a function name
    ///
    /// A function unknown to the map file and without an inline spec is not
    /// registered at all (the caller still holds the closure, but no route
    /// will reach it). When the map file already defines the function, an
    /// inline spec is ignored: the file takes precedence over code.
    pub fn register_function(
        &mut self,
        name: &str,
        handler: FunctionHandler,
        inline_spec: Option<FunctionSpec>,
    ) {
        if !self.specs.contains_key(name) && inline_spec.is_none() {
            logger::log_info(&format!(
                "Function {name} has no definition in the functions map file and no inline \
                 definition. It won't be registered"
            ));
            return;
        }

        if self.specs.contains_key(name) {
            if inline_spec.is_some() {
                logger::log_warning(&format!(
                    "Function {name} is already defined in the functions map file. \
                     Discarding inline definition"
                ));
            }
        } else if let Some(spec) = inline_spec {
            self.paths.register(name, &spec);
            self.specs.insert(name.to_string(), spec);
        }

        logger::log_info(&format!("New function registered: {name}"));
        self.handlers.insert(name.to_string(), handler);
    }

    /// Declarative specs, keyed by function name
    pub const fn specs(&self) -> &FunctionMap {
        &self.specs
    }

    /// Look up one function's spec
    pub fn spec(&self, name: &str) -> Option<&FunctionSpec> {
        self.specs.get(name)
    }

    /// Clone the handler bound to a function, if any
    pub fn handler(&self, name: &str) -> Option<FunctionHandler> {
        self.handlers.get(name).map(Arc::clone)
    }

    /// Reverse-resolve an incoming method/path pair
    pub fn resolve(&self, method: &str, path: &str) -> Option<Resolution<'_>> {
        self.paths.resolve(method, path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn noop_handler() -> FunctionHandler {
        Arc::new(|_body, _key, done, _req| {
            done.complete(Some(json!({"status": "OK"})), None);
        })
    }

    fn spec_with_path(module: &str, path: &str) -> FunctionSpec {
        FunctionSpec {
            module: Some(module.to_string()),
            path: Some(path.to_string()),
            method: None,
            params: Vec::new(),
        }
    }

    fn map_with(name: &str) -> FunctionMap {
        let mut map = FunctionMap::new();
        map.insert(
            name.to_string(),
            FunctionSpec {
                module: None,
                path: None,
                method: None,
                params: Vec::new(),
            },
        );
        map
    }

    #[test]
    fn test_map_functions_are_routable_immediately() {
        let registry = Registry::new(map_with("test"));
        assert!(registry.resolve("POST", "/test").is_some());
        // ...but not yet invokable
        assert!(registry.handler("test").is_none());
    }

    #[test]
    fn test_register_without_any_spec_is_skipped() {
        let mut registry = Registry::new(FunctionMap::new());
        registry.register_function("ghost", noop_handler(), None);
        assert!(registry.handler("ghost").is_none());
        assert!(registry.resolve("POST", "/ghost").is_none());
    }

    #[test]
    fn test_file_spec_takes_precedence_over_inline() {
        let mut registry = Registry::new(map_with("test"));
        registry.register_function(
            "test",
            noop_handler(),
            Some(spec_with_path("inline", "route")),
        );

        // The inline route never materialized
        assert!(registry.resolve("POST", "/inline/route").is_none());
        assert!(registry.resolve("POST", "/test").is_some());
        assert!(registry.handler("test").is_some());
        assert!(registry.spec("test").unwrap().module.is_none());
    }

    #[test]
    fn test_inline_spec_registers_route() {
        let mut registry = Registry::new(FunctionMap::new());
        registry.register_function(
            "inline-fn",
            noop_handler(),
            Some(spec_with_path("api", "thing")),
        );

        let hit = registry.resolve("POST", "/api/thing").unwrap();
        assert_eq!(hit.function, "inline-fn");
        assert!(registry.handler("inline-fn").is_some());
    }

    #[test]
    fn test_route_collision_keeps_both_specs() {
        let mut registry = Registry::new(FunctionMap::new());
        registry.register_function(
            "first",
            noop_handler(),
            Some(spec_with_path("api", "same")),
        );
        registry.register_function(
            "second",
            noop_handler(),
            Some(spec_with_path("api", "same")),
        );

        // Last registration owns the route, both specs stay queryable
        let hit = registry.resolve("POST", "/api/same").unwrap();
        assert_eq!(hit.function, "second");
        assert!(registry.spec("first").is_some());
        assert!(registry.spec("second").is_some());
    }
}
