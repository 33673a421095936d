//! Routing module entry
//!
//! Route-key composition and reverse lookup from incoming requests.

mod resolver;

pub use resolver::{route_key, PathTable, Resolution};
