//! HTTP response building module
//!
//! Builders for the response envelopes this surface emits, decoupled from the
//! dispatch logic. Every response carries the CORS headers.

use std::collections::HashMap;

use http_body_util::Full;
use hyper::body::Bytes;
use hyper::http::response::Builder;
use hyper::{Response, StatusCode};
use serde::Serialize;
use serde_json::json;

/// Attach the CORS headers carried on every response
fn with_cors(builder: Builder) -> Builder {
    builder
        .header("Access-Control-Allow-Origin", "*")
        .header(
            "Access-Control-Allow-Methods",
            "GET,PUT,POST,DELETE,OPTIONS",
        )
        .header(
            "Access-Control-Allow-Headers",
            "Content-Type, Authorization, Content-Length, X-Requested-With",
        )
}

/// Build a JSON response from any serializable body
pub fn json_response<T: Serialize>(status: StatusCode, body: &T) -> Response<Full<Bytes>> {
    let serialized = match serde_json::to_string(body) {
        Ok(s) => s,
        Err(e) => {
            log_build_error("JSON", &format!("serialization failed: {e}"));
            return json_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                &json!({"status": "ERROR"}),
            );
        }
    };

    with_cors(Response::builder().status(status))
        .header("Content-Type", "application/json")
        .body(Full::new(Bytes::from(serialized)))
        .unwrap_or_else(|e| {
            log_build_error("JSON", &e.to_string());
            Response::new(Full::new(Bytes::from(r#"{"status":"ERROR"}"#)))
        })
}

/// Build a response with explicit status, content type, and custom headers
///
/// Custom headers are applied before the body is written; invalid names or
/// values fall back to a plain error response.
pub fn payload_response(
    status: u16,
    content_type: &str,
    headers: &HashMap<String, String>,
    body: Bytes,
) -> Response<Full<Bytes>> {
    let mut builder = with_cors(Response::builder().status(status)).header("Content-Type", content_type);
    for (name, value) in headers {
        builder = builder.header(name, value);
    }

    builder.body(Full::new(body)).unwrap_or_else(|e| {
        log_build_error(&status.to_string(), &e.to_string());
        Response::new(Full::new(Bytes::from(r#"{"status":"ERROR"}"#)))
    })
}

/// Standard error envelope, with an optional description
pub fn error_response(status: StatusCode, description: Option<&str>) -> Response<Full<Bytes>> {
    let body = match description {
        Some(text) => json!({"status": "ERROR", "description": text}),
        None => json!({"status": "ERROR"}),
    };
    json_response(status, &body)
}

/// 404 for any route or function id with no registered handler
pub fn not_registered_response() -> Response<Full<Bytes>> {
    error_response(StatusCode::NOT_FOUND, Some("Function not registered."))
}

/// 406 for request bodies that fail to parse as JSON
pub fn parse_failure_response() -> Response<Full<Bytes>> {
    error_response(StatusCode::NOT_ACCEPTABLE, None)
}

/// OPTIONS preflight short-circuit
pub fn options_response() -> Response<Full<Bytes>> {
    with_cors(Response::builder().status(200))
        .body(Full::new(Bytes::new()))
        .unwrap_or_else(|e| {
            log_build_error("OPTIONS", &e.to_string());
            Response::new(Full::new(Bytes::new()))
        })
}

/// Build 413 Payload Too Large response
pub fn build_413_response() -> Response<Full<Bytes>> {
    with_cors(Response::builder().status(413))
        .header("Content-Type", "text/plain")
        .body(Full::new(Bytes::from("413 Payload Too Large")))
        .unwrap_or_else(|e| {
            log_build_error("413", &e.to_string());
            Response::new(Full::new(Bytes::from("413 Payload Too Large")))
        })
}

/// Build generic HTML response
pub fn html_response(content: String) -> Response<Full<Bytes>> {
    with_cors(Response::builder().status(200))
        .header("Content-Type", "text/html; charset=utf-8")
        .body(Full::new(Bytes::from(content)))
        .unwrap_or_else(|e| {
            log_build_error("HTML", &e.to_string());
            Response::new(Full::new(Bytes::new()))
        })
}

/// Log response build error
fn log_build_error(status: &str, error: &str) {
    crate::logger::log_critical(&format!("Failed to build {status} response: {error}"));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_response_carries_cors() {
        let resp = json_response(StatusCode::OK, &json!({"status": "OK"}));
        assert_eq!(
            resp.headers().get("Access-Control-Allow-Origin").unwrap(),
            "*"
        );

        let resp = not_registered_response();
        assert_eq!(
            resp.headers().get("Access-Control-Allow-Origin").unwrap(),
            "*"
        );
    }

    #[test]
    fn test_not_registered_body() {
        let resp = not_registered_response();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_parse_failure_is_406() {
        assert_eq!(parse_failure_response().status(), StatusCode::NOT_ACCEPTABLE);
    }

    #[test]
    fn test_options_is_200() {
        assert_eq!(options_response().status(), StatusCode::OK);
    }

    #[test]
    fn test_payload_response_applies_custom_headers() {
        let mut headers = HashMap::new();
        headers.insert("X-Request-Id".to_string(), "abc123".to_string());
        let resp = payload_response(201, "text/plain", &headers, Bytes::from("done"));
        assert_eq!(resp.status(), 201);
        assert_eq!(resp.headers().get("X-Request-Id").unwrap(), "abc123");
        assert_eq!(resp.headers().get("Content-Type").unwrap(), "text/plain");
    }
}
