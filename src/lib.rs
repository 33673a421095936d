//! apimap
//!
//! Turns a declarative JSON function map into a live HTTP surface: each map
//! entry binds a logical function name to an HTTP route and a parameter
//! schema; registered handlers are invoked only after the payload validates,
//! and every request is bracketed by an audit record.

pub mod audit;
pub mod config;
pub mod dispatch;
pub mod http;
pub mod logger;
pub mod mail;
pub mod routing;
pub mod schema;
pub mod server;
pub mod validation;

pub use config::{AppState, Config};
pub use dispatch::{Completion, FunctionHandler, Registry, ReplyExtra, RequestInfo};
pub use schema::{FunctionSpec, ParamSpec, ParamType};
pub use validation::ValidationError;
