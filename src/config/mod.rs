// Configuration module entry point
// Layered configuration: built-in defaults, config file, environment overrides

mod state;
mod types;

use std::net::SocketAddr;

// Re-export public types
pub use state::AppState;
pub use types::{
    Config, FunctionsConfig, HttpConfig, LoggingConfig, MailConfig, PerformanceConfig, ServerConfig,
};

impl Config {
    /// Load configuration from specified file path (without extension)
    /// Default config file is "config.toml" when no path specified
    pub fn load_from(config_path: &str) -> Result<Self, config::ConfigError> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name(config_path).required(false))
            .add_source(config::Environment::with_prefix("APIMAP"))
            .set_default("server.host", "127.0.0.1")?
            .set_default("server.port", 8787)?
            .set_default("functions.map_file", "_assets/functions-map.json")?
            .set_default("logging.max_filesize", 10_485_760)? // 10MB
            .set_default("logging.debug_mode", false)?
            .set_default("performance.keep_alive_timeout", 75)?
            .set_default("performance.read_timeout", 30)?
            .set_default("performance.write_timeout", 30)?
            .set_default("http.default_content_type", "application/json")?
            .set_default("http.server_name", "apimap/0.3")?
            .set_default("http.max_body_size", 10_485_760)?
            .set_default("mail.host", "")?
            .set_default("mail.port", 25)?
            .set_default("mail.user", "")?
            .set_default("mail.password", "")?
            .set_default("mail.default_from", "apimap@localhost")?
            .build()?;

        settings.try_deserialize()
    }

    pub fn get_socket_addr(&self) -> Result<SocketAddr, String> {
        format!("{}:{}", self.server.host, self.server.port)
            .parse()
            .map_err(|e| format!("Invalid address: {e}"))
    }
}
