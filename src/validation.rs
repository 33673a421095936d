//! Request validation module
//!
//! Checks a request payload against a function's declared parameter schema and
//! produces a structured error list with stable machine-readable codes.

use serde::Serialize;
use serde_json::Value;

use crate::schema::{FunctionMap, ParamSpec, ParamType};

/// A single validation failure
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationError {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub param: Option<String>,
    pub code: &'static str,
    pub description: &'static str,
}

const FUNCTION_NOT_FOUND: (&str, &str) = ("VAL0000", "Function not found");
const MANDATORY_MISSING: (&str, &str) = ("VAL0001", "Mandatory parameter not present in the request");
const NOT_AN_INTEGER: (&str, &str) = ("VAL0002", "Value is string when expecting integer");
const STRING_TOO_SHORT: (&str, &str) = ("VAL1001", "String length smaller than needed");
const STRING_TOO_LONG: (&str, &str) = ("VAL1002", "String length larger than needed");
const INTEGER_TOO_SMALL: (&str, &str) = ("VAL2001", "Integer number too small");
const INTEGER_TOO_BIG: (&str, &str) = ("VAL2002", "Integer number too big");

fn error(param: Option<&str>, (code, description): (&'static str, &'static str)) -> ValidationError {
    ValidationError {
        param: param.map(String::from),
        code,
        description,
    }
}

/// Validate a request body against a function's parameter schema
///
/// Returns `None` when the payload is clean so callers can branch on presence.
/// An unknown function name yields a single `VAL0000` error and short-circuits
/// the parameter checks.
pub fn validate(
    map: &FunctionMap,
    function_name: &str,
    body: &Value,
) -> Option<Vec<ValidationError>> {
    let Some(spec) = map.get(function_name) else {
        return Some(vec![error(None, FUNCTION_NOT_FOUND)]);
    };

    let mut errors = Vec::new();

    for param in &spec.params {
        let value = body.get(&param.param_name);

        // The parameter is mandatory but is not in the request content?
        if value.is_none() && param.mandatory {
            errors.push(error(Some(&param.param_name), MANDATORY_MISSING));
            continue;
        }

        let Some(value) = value else {
            continue;
        };
        if value.is_null() {
            continue;
        }

        match param.kind {
            ParamType::String => check_string(param, value, &mut errors),
            ParamType::Int => check_int(param, value, &mut errors),
        }
    }

    if errors.is_empty() {
        None
    } else {
        Some(errors)
    }
}

/// Length rules for string parameters, applied to the trimmed value
///
/// The upper-bound check is gated on `longer_than` being set, matching the
/// map format as historically interpreted: a spec carrying only `smaller_than`
/// gets no upper-bound enforcement.
fn check_string(param: &ParamSpec, value: &Value, errors: &mut Vec<ValidationError>) {
    let Some(raw) = value.as_str() else {
        return;
    };
    let length = i64::try_from(raw.trim().chars().count()).unwrap_or(i64::MAX);

    let Some(rules) = &param.validation else {
        return;
    };

    if let Some(longer_than) = rules.longer_than {
        if length < longer_than {
            errors.push(error(Some(&param.param_name), STRING_TOO_SHORT));
        }
        if let Some(smaller_than) = rules.smaller_than {
            if length > smaller_than {
                errors.push(error(Some(&param.param_name), STRING_TOO_LONG));
            }
        }
    }
}

/// Range rules for integer parameters
///
/// A value that does not parse as an integer yields `VAL0002` and suppresses
/// the range checks.
fn check_int(param: &ParamSpec, value: &Value, errors: &mut Vec<ValidationError>) {
    let Some(number) = parse_int(value) else {
        errors.push(error(Some(&param.param_name), NOT_AN_INTEGER));
        return;
    };

    let Some(rules) = &param.validation else {
        return;
    };

    if let Some(greater_than) = rules.greater_than {
        if number < greater_than {
            errors.push(error(Some(&param.param_name), INTEGER_TOO_SMALL));
        }
    }
    if let Some(lesser_than) = rules.lesser_than {
        if number > lesser_than {
            errors.push(error(Some(&param.param_name), INTEGER_TOO_BIG));
        }
    }
}

/// Accept JSON integers and numeric strings
fn parse_int(value: &Value) -> Option<i64> {
    if let Some(number) = value.as_i64() {
        return Some(number);
    }
    value.as_str().and_then(|s| s.trim().parse::<i64>().ok())
}
