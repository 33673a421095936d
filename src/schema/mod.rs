// Schema store module
// Loads the declarative function map consumed once at startup

mod types;

use std::collections::HashMap;
use std::fs;

pub use types::{FunctionSpec, ParamRules, ParamSpec, ParamType};

/// Function name to declarative spec, as loaded from the map file
pub type FunctionMap = HashMap<String, FunctionSpec>;

/// Read and parse the function map file
///
/// A missing or unparseable map is a startup error; the server has no
/// dispatchable surface without it.
pub fn load_map(path: &str) -> Result<FunctionMap, String> {
    let content = fs::read_to_string(path)
        .map_err(|e| format!("Couldn't read the functions map {path}: {e}"))?;

    serde_json::from_str(&content)
        .map_err(|e| format!("Functions map {path} is not a valid JSON map: {e}"))
}
