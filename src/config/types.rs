// Configuration types module
// Defines all configuration-related data structures

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Main configuration structure
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub functions: FunctionsConfig,
    pub logging: LoggingConfig,
    pub performance: PerformanceConfig,
    pub http: HttpConfig,
    pub mail: MailConfig,
}

/// Server configuration
#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub workers: Option<usize>,
}

/// Function map configuration
#[derive(Debug, Deserialize, Clone)]
pub struct FunctionsConfig {
    /// Path to the JSON function map consumed at startup
    pub map_file: String,
}

/// Logging configuration
///
/// Log output is bucket-addressed: each bucket maps to its own file, and the
/// `all` bucket is the general sink for unbucketed messages.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct LoggingConfig {
    #[serde(default = "default_buckets")]
    pub buckets: HashMap<String, String>,
    /// Rotation threshold in bytes
    pub max_filesize: u64,
    /// Echo every line to stdout as well
    pub debug_mode: bool,
}

fn default_buckets() -> HashMap<String, String> {
    let mut buckets = HashMap::new();
    buckets.insert("all".to_string(), "logs/general.log".to_string());
    buckets.insert("audit".to_string(), "logs/audit.log".to_string());
    buckets
}

/// Performance configuration
#[derive(Debug, Deserialize, Clone)]
pub struct PerformanceConfig {
    pub keep_alive_timeout: u64,
    pub read_timeout: u64,
    pub write_timeout: u64,
    pub max_connections: Option<u64>,
}

/// HTTP configuration
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct HttpConfig {
    pub default_content_type: String,
    pub server_name: String,
    pub max_body_size: u64,
    /// Document rendered as the index page
    #[serde(default = "default_readme_path")]
    pub readme_path: String,
}

#[allow(clippy::missing_const_for_fn)]
fn default_readme_path() -> String {
    "README.md".to_string()
}

/// Mail delivery configuration
///
/// An empty `host` disables SMTP delivery entirely; messages are then handed
/// to the in-process recorder instead of a real transport.
#[derive(Debug, Deserialize, Clone)]
pub struct MailConfig {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
    /// Envelope sender account used for all outgoing mail
    pub default_from: String,
}
