//! Dispatch module entry
//!
//! Owns the request lifecycle from receipt to completion: body parsing, route
//! resolution, audit bracketing, schema validation, handler invocation, and
//! response rendering.

mod completion;
mod registry;

pub use completion::{Completion, Reply, ReplyExtra, ResponseDescriptor};
pub use registry::{FunctionHandler, Registry, RequestInfo};

use std::collections::HashMap;
use std::convert::Infallible;
use std::path::Path;
use std::sync::Arc;

use http_body_util::{BodyExt, Full};
use hyper::body::Bytes;
use hyper::{HeaderMap, Method, Request, Response, StatusCode};
use serde_json::{json, Value};

use crate::audit::AuditExtra;
use crate::config::AppState;
use crate::http::{self, mime, readme};
use crate::logger;
use crate::validation;

/// Main entry point for HTTP request handling
pub async fn handle_request(
    req: Request<hyper::body::Incoming>,
    state: Arc<AppState>,
) -> Result<Response<Full<Bytes>>, Infallible> {
    let method = req.method().clone();
    let path = req.uri().path().to_string();

    logger::log_request(&method, &path);

    // 1. OPTIONS preflight short-circuits before anything else
    if method == Method::OPTIONS {
        return Ok(http::options_response());
    }

    // 2. Check body size
    if let Some(resp) = check_body_size(&req, state.config.http.max_body_size) {
        return Ok(resp);
    }

    // 3. Snapshot the headers for the handler, then collect the body
    let headers = header_snapshot(req.headers());
    let body = match req.collect().await {
        Ok(collected) => collected.to_bytes(),
        Err(e) => {
            logger::log_warning(&format!("Failed to read request body: {e}"));
            return Ok(http::parse_failure_response());
        }
    };

    Ok(dispatch(&method, &path, headers, &body, &state).await)
}

/// Run one request through the dispatch state machine
///
/// Separated from the hyper entry point so the full lifecycle is drivable
/// with plain values in tests.
pub async fn dispatch(
    method: &Method,
    path: &str,
    headers: HashMap<String, String>,
    body: &[u8],
    state: &Arc<AppState>,
) -> Response<Full<Bytes>> {
    // 1. Always-present routes
    if path == "/status" && matches!(*method, Method::GET | Method::POST) {
        return http::json_response(StatusCode::OK, &json!({"status": "OK"}));
    }
    if path == "/" && method == Method::GET {
        return match readme::load_and_render(&state.config.http.readme_path, &state.readme_cache)
            .await
        {
            Some(page) => http::html_response(page),
            None => http::error_response(StatusCode::NOT_FOUND, None),
        };
    }

    // 2. Parse the body; JSON is expected, an empty body counts as {}
    let payload: Value = if body.is_empty() {
        json!({})
    } else {
        match serde_json::from_slice(body) {
            Ok(value) => value,
            Err(e) => {
                logger::log_warning(&format!("Unparseable request body: {e}"));
                return http::parse_failure_response();
            }
        }
    };

    // 3. Resolve the route to a function id
    let Some(resolution) = state.registry.resolve(method.as_str(), path) else {
        return http::not_registered_response();
    };
    let function = resolution.function.to_string();
    let params = resolution.params;

    // 4. Open the audit record
    let request_key = state.audit.start(&function, &payload);

    // 5. Validate against the declared schema
    if let Some(errors) = validation::validate(state.registry.specs(), &function, &payload) {
        let return_values = json!({"status": "ERROR", "validationErrors": errors});
        finish_audit(state, &request_key, &return_values, 500, "application/json", None);
        return http::json_response(StatusCode::INTERNAL_SERVER_ERROR, &return_values);
    }

    // 6. The function must have a bound handler
    let Some(handler) = state.registry.handler(&function) else {
        let return_values = json!({"status": "ERROR", "description": "Function not registered."});
        finish_audit(state, &request_key, &return_values, 404, "application/json", None);
        return http::json_response(StatusCode::NOT_FOUND, &return_values);
    };

    // 7. Invoke the handler and wait for its completion, however late it fires
    let (done, receiver) = Completion::channel();
    let info = RequestInfo {
        method: method.to_string(),
        path: path.to_string(),
        params,
        headers,
    };
    handler(payload, request_key.clone(), done, info);

    let Ok(reply) = receiver.await else {
        logger::log_critical(&format!(
            "Handler for {function} dropped its completion without replying"
        ));
        let return_values = json!({"status": "ERROR"});
        finish_audit(state, &request_key, &return_values, 500, "application/json", None);
        return http::json_response(StatusCode::INTERNAL_SERVER_ERROR, &return_values);
    };

    // 8. Render the reply and close the audit record
    render_reply(state, &request_key, reply).await
}

/// Turn a handler reply into the HTTP response, closing the audit record
async fn render_reply(
    state: &Arc<AppState>,
    request_key: &str,
    reply: Reply,
) -> Response<Full<Bytes>> {
    let audit_body = reply.body.clone().unwrap_or(Value::Null);

    match reply.into_descriptor(&state.config.http.default_content_type) {
        ResponseDescriptor::Json {
            status,
            content_type,
            headers,
            body,
        } => {
            finish_audit(
                state,
                request_key,
                &audit_body,
                status,
                &content_type,
                Some(headers.clone()),
            );
            let bytes = body.as_ref().map_or_else(Bytes::new, payload_bytes);
            http::payload_response(status, &content_type, &headers, bytes)
        }
        ResponseDescriptor::FileTransfer {
            path,
            status,
            headers,
        } => {
            let content_type = mime::content_type_for(
                Path::new(&path).extension().and_then(|ext| ext.to_str()),
            );
            match tokio::fs::read(&path).await {
                Ok(data) => {
                    finish_audit(
                        state,
                        request_key,
                        &audit_body,
                        status,
                        content_type,
                        Some(headers.clone()),
                    );
                    http::payload_response(status, content_type, &headers, Bytes::from(data))
                }
                Err(e) => {
                    logger::log_critical(&format!("File transfer failed for {path}: {e}"));
                    let return_values = json!({"status": "ERROR"});
                    finish_audit(state, request_key, &return_values, 404, "application/json", None);
                    http::error_response(StatusCode::NOT_FOUND, None)
                }
            }
        }
    }
}

/// Serialize a reply body; a bare string goes out raw, everything else as JSON
fn payload_bytes(value: &Value) -> Bytes {
    match value {
        Value::String(s) => Bytes::from(s.clone()),
        other => Bytes::from(other.to_string()),
    }
}

fn finish_audit(
    state: &Arc<AppState>,
    request_key: &str,
    return_values: &Value,
    status: u16,
    content_type: &str,
    headers: Option<HashMap<String, String>>,
) {
    state.audit.finish(
        request_key,
        return_values,
        AuditExtra {
            status,
            content_type: content_type.to_string(),
            headers,
        },
    );
}

/// Validate Content-Length header and return 413 if exceeded
fn check_body_size(
    req: &Request<hyper::body::Incoming>,
    max_body_size: u64,
) -> Option<Response<Full<Bytes>>> {
    let content_length = req.headers().get("content-length")?;
    content_length.to_str().map_or_else(
        |_| {
            logger::log_warning("Content-Length header contains non-ASCII characters");
            None
        },
        |size_str| match size_str.parse::<u64>() {
            Ok(size) if size > max_body_size => {
                logger::log_warning(&format!(
                    "Request body too large: {size} bytes (max: {max_body_size})"
                ));
                Some(http::build_413_response())
            }
            Err(_) => {
                logger::log_warning(&format!(
                    "Invalid Content-Length value: '{size_str}', skipping size check"
                ));
                None
            }
            _ => None,
        },
    )
}

/// Lower-cased header snapshot handed to handlers
fn header_snapshot(headers: &HeaderMap) -> HashMap<String, String> {
    headers
        .iter()
        .filter_map(|(name, value)| {
            value
                .to_str()
                .ok()
                .map(|v| (name.as_str().to_lowercase(), v.to_string()))
        })
        .collect()
}
