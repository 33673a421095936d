//! Completion channel module
//!
//! Handlers finish a request by firing a single-use completion handle. The
//! handle enforces exactly-once semantics explicitly instead of relying on a
//! headers-already-sent side effect, and the handler's reply is folded into a
//! tagged response descriptor for the dispatcher to render.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use serde_json::Value;
use tokio::sync::oneshot;

use crate::logger;

/// Optional response adjustments a handler can attach to its reply
#[derive(Debug, Clone, Default)]
pub struct ReplyExtra {
    pub status: Option<u16>,
    pub content_type: Option<String>,
    pub headers: Option<HashMap<String, String>>,
    /// Treat the reply body as a filesystem path and stream that file back
    pub file: bool,
}

/// A handler's reply: the payload plus optional response adjustments
#[derive(Debug)]
pub struct Reply {
    pub body: Option<Value>,
    pub extra: Option<ReplyExtra>,
}

/// Single-fire completion handle passed to handlers
///
/// Clones share the same underlying channel; whichever clone completes first
/// wins and every later attempt is discarded with a warning. Handlers may
/// complete from any task at any later point.
#[derive(Clone)]
pub struct Completion {
    sender: Arc<Mutex<Option<oneshot::Sender<Reply>>>>,
}

impl Completion {
    /// Create a completion handle and the receiver the dispatcher awaits
    pub fn channel() -> (Self, oneshot::Receiver<Reply>) {
        let (tx, rx) = oneshot::channel();
        (
            Self {
                sender: Arc::new(Mutex::new(Some(tx))),
            },
            rx,
        )
    }

    /// Fire the completion with the handler's reply
    ///
    /// Returns false if the request was already completed; the reply is
    /// dropped in that case.
    pub fn complete(&self, body: Option<Value>, extra: Option<ReplyExtra>) -> bool {
        let sender = self.sender.lock().ok().and_then(|mut slot| slot.take());
        match sender {
            Some(tx) => {
                // The dispatcher may have given up on the request; a closed
                // receiver is not the handler's problem.
                let _ = tx.send(Reply { body, extra });
                true
            }
            None => {
                logger::log_warning("Completion fired more than once; extra reply discarded");
                false
            }
        }
    }
}

/// How the dispatcher should render a completed request
#[derive(Debug)]
pub enum ResponseDescriptor {
    Json {
        status: u16,
        content_type: String,
        headers: HashMap<String, String>,
        body: Option<Value>,
    },
    FileTransfer {
        path: String,
        status: u16,
        headers: HashMap<String, String>,
    },
}

impl Reply {
    /// Fold the reply and its adjustments into a response descriptor
    pub fn into_descriptor(self, default_content_type: &str) -> ResponseDescriptor {
        let extra = self.extra.unwrap_or_default();
        let status = extra.status.unwrap_or(200);
        let headers = extra.headers.unwrap_or_default();

        if extra.file {
            let path = self
                .body
                .as_ref()
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string();
            return ResponseDescriptor::FileTransfer {
                path,
                status,
                headers,
            };
        }

        ResponseDescriptor::Json {
            status,
            content_type: extra
                .content_type
                .unwrap_or_else(|| default_content_type.to_string()),
            headers,
            body: self.body,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_complete_fires_once() {
        let (completion, rx) = Completion::channel();

        assert!(completion.complete(Some(json!({"status": "OK"})), None));
        assert!(!completion.complete(Some(json!({"status": "AGAIN"})), None));

        let reply = rx.await.unwrap();
        assert_eq!(reply.body, Some(json!({"status": "OK"})));
    }

    #[tokio::test]
    async fn test_clones_share_the_guard() {
        let (completion, rx) = Completion::channel();
        let other = completion.clone();

        assert!(other.complete(None, None));
        assert!(!completion.complete(None, None));

        let reply = rx.await.unwrap();
        assert!(reply.body.is_none());
    }

    #[test]
    fn test_descriptor_defaults() {
        let reply = Reply {
            body: Some(json!({"ok": true})),
            extra: None,
        };
        match reply.into_descriptor("application/json") {
            ResponseDescriptor::Json {
                status,
                content_type,
                headers,
                body,
            } => {
                assert_eq!(status, 200);
                assert_eq!(content_type, "application/json");
                assert!(headers.is_empty());
                assert_eq!(body, Some(json!({"ok": true})));
            }
            ResponseDescriptor::FileTransfer { .. } => panic!("expected a JSON descriptor"),
        }
    }

    #[test]
    fn test_descriptor_file_transfer() {
        let reply = Reply {
            body: Some(json!("/tmp/report.pdf")),
            extra: Some(ReplyExtra {
                status: Some(201),
                file: true,
                ..ReplyExtra::default()
            }),
        };
        match reply.into_descriptor("application/json") {
            ResponseDescriptor::FileTransfer { path, status, .. } => {
                assert_eq!(path, "/tmp/report.pdf");
                assert_eq!(status, 201);
            }
            ResponseDescriptor::Json { .. } => panic!("expected a file transfer"),
        }
    }
}
