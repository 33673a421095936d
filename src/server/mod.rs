//! Server module entry
//!
//! Listener construction and the accept loop.

pub mod connection;
pub mod listener;

pub use listener::create_reusable_listener;

use std::sync::atomic::AtomicUsize;
use std::sync::Arc;

use crate::config::AppState;
use crate::logger;

/// Bind the configured address and serve until the process exits
///
/// Must run inside a `LocalSet`; connections are served on local tasks.
pub async fn run(state: Arc<AppState>) -> Result<(), Box<dyn std::error::Error>> {
    let addr = state.config.get_socket_addr()?;
    let listener = create_reusable_listener(addr)?;
    let active_connections = Arc::new(AtomicUsize::new(0));

    logger::log_server_start(&addr, &state.config);

    loop {
        match listener.accept().await {
            Ok((stream, peer_addr)) => {
                connection::accept_connection(stream, peer_addr, &state, &active_connections);
            }
            Err(e) => {
                logger::log_critical(&format!("Failed to accept connection: {e}"));
            }
        }
    }
}
