//! Logger module
//!
//! Provides logging utilities for the API server including:
//! - Server lifecycle logging
//! - Bucket-addressed audit logging
//! - Error and warning logging
//! - File-based logging with size rotation

pub mod writer;

use crate::config::Config;
use std::net::SocketAddr;

/// Initialize the logger with configuration
///
/// Should be called once at application startup.
pub fn init(config: &Config) -> std::io::Result<()> {
    writer::init(&config.logging)
}

/// Write to the general bucket, falling back to stdout before init
fn write_general(level: &str, message: &str) {
    match writer::get() {
        Some(w) => w.write(None, level, message),
        None => println!("[{level}] {message}"),
    }
}

pub fn log_info(message: &str) {
    write_general("INFO", message);
}

pub fn log_warning(message: &str) {
    write_general("WARNING", message);
}

pub fn log_critical(message: &str) {
    write_general("CRITICAL", message);
}

/// Write to a named bucket with an arbitrary level tag
///
/// Used by the audit recorder, which addresses the `audit` bucket with
/// `REQUEST_BEGIN` / `REQUEST-END` markers.
pub fn log_to_bucket(bucket: &str, level: &str, message: &str) {
    match writer::get() {
        Some(w) => w.write(Some(bucket), level, message),
        None => println!("[{level}] {message}"),
    }
}

pub fn log_server_start(addr: &SocketAddr, config: &Config) {
    log_info("======================================");
    log_info("API server started successfully");
    log_info(&format!("Listening on: http://{addr}"));
    log_info(&format!("Function map: {}", config.functions.map_file));
    if let Some(workers) = config.server.workers {
        log_info(&format!("Worker threads: {workers}"));
    }
    log_info("======================================");
}

pub fn log_connection_accepted(peer_addr: &SocketAddr) {
    log_info(&format!("[Connection] Accepted from: {peer_addr}"));
}

pub fn log_connection_error(err: &impl std::fmt::Debug) {
    log_critical(&format!("Failed to serve connection: {err:?}"));
}

pub fn log_request(method: &hyper::Method, path: &str) {
    log_info(&format!("[Request] {method} {path}"));
}
