// Function map types
// Wire format follows the JSON map file: camelCase keys, optional sections

use serde::{Deserialize, Serialize};

/// Declarative specification for one logical function
///
/// Immutable after load. When both `module` and `path` are present the
/// function is routed at `module/path`; otherwise at its own name.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct FunctionSpec {
    #[serde(default)]
    pub module: Option<String>,
    #[serde(default)]
    pub path: Option<String>,
    /// HTTP method, defaults to POST
    #[serde(default)]
    pub method: Option<String>,
    #[serde(default)]
    pub params: Vec<ParamSpec>,
}

impl FunctionSpec {
    /// Upper-cased HTTP method, defaulting to POST
    pub fn method_upper(&self) -> String {
        self.method
            .as_deref()
            .map_or_else(|| "POST".to_string(), str::to_uppercase)
    }
}

/// Parameter declaration inside a function spec
#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct ParamSpec {
    pub param_name: String,
    #[serde(rename = "type")]
    pub kind: ParamType,
    #[serde(default)]
    pub mandatory: bool,
    #[serde(default)]
    pub validation: Option<ParamRules>,
}

/// Supported parameter types
#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ParamType {
    String,
    Int,
}

/// Optional constraints attached to a parameter
///
/// `longer_than`/`smaller_than` bound string length, `greater_than`/`lesser_than`
/// bound integer value.
#[derive(Debug, Deserialize, Serialize, Clone, Default)]
#[serde(rename_all = "camelCase")]
pub struct ParamRules {
    #[serde(default)]
    pub longer_than: Option<i64>,
    #[serde(default)]
    pub smaller_than: Option<i64>,
    #[serde(default)]
    pub greater_than: Option<i64>,
    #[serde(default)]
    pub lesser_than: Option<i64>,
}
