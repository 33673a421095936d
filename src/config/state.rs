// Application state module
// Everything a request-scoped operation needs, owned by the server instance

use tokio::sync::RwLock;

use super::types::Config;
use crate::audit::AuditRecorder;
use crate::dispatch::Registry;

/// Application state
///
/// Owned by the server instance and passed by reference to all request-scoped
/// operations. Several independent instances can coexist in one process.
pub struct AppState {
    pub config: Config,
    /// Function specs, handlers, and routes; read-only while serving
    pub registry: Registry,
    pub audit: AuditRecorder,
    /// Rendered README page, populated on first hit
    pub readme_cache: RwLock<Option<String>>,
}

impl AppState {
    pub fn new(config: Config, registry: Registry) -> Self {
        Self {
            config,
            registry,
            audit: AuditRecorder::new(),
            readme_cache: RwLock::new(None),
        }
    }
}
