//! HTTP utilities module entry
//!
//! Response building, MIME detection, and README rendering.

pub mod mime;
pub mod readme;
pub mod response;

// Re-export commonly used builders
pub use response::{
    build_413_response, error_response, html_response, json_response, not_registered_response,
    options_response, parse_failure_response, payload_response,
};
