//! Parameter coercion (§4.6): turns a raw `serde_json::Value` into a
//! `BoundValue` matching its declared `ParameterType`, or fails
//! `InvalidArgument` naming the parameter. Coercion is explicit and total —
//! every declared type has a fixed, enumerable set of JSON shapes it accepts.

use chrono::{DateTime, NaiveDate};
use rust_decimal::Decimal;
use serde_json::Value as Json;
use uuid::Uuid;

use schema_core::error::{Result, SchemaIntelError};
use schema_core::ports::BoundValue;
use schema_types::enums::ParameterType;

/// Coerces `value` to the shape declared by `param_type`, naming `param_name`
/// in any failure. `None`/`Json::Null` coerces to `BoundValue::Null`
/// regardless of declared type — callers reject a missing required
/// parameter before coercion runs (see `validate_and_coerce`).
pub fn coerce(param_name: &str, param_type: ParameterType, value: &Json) -> Result<BoundValue> {
    if value.is_null() {
        return Ok(BoundValue::Null);
    }
    match param_type {
        ParameterType::String => value
            .as_str()
            .map(|s| BoundValue::Text(s.to_string()))
            .ok_or_else(|| bad(param_name, "string")),
        ParameterType::Integer => coerce_integer(value).map(BoundValue::Integer).ok_or_else(|| bad(param_name, "integer")),
        ParameterType::Decimal => {
            coerce_decimal(value).map(BoundValue::Decimal).ok_or_else(|| bad(param_name, "decimal"))
        }
        ParameterType::Boolean => Ok(BoundValue::Boolean(coerce_to_boolean(value))),
        ParameterType::Date => value
            .as_str()
            .filter(|s| NaiveDate::parse_from_str(s, "%Y-%m-%d").is_ok())
            .map(|s| BoundValue::Text(s.to_string()))
            .ok_or_else(|| bad(param_name, "date (YYYY-MM-DD)")),
        ParameterType::Timestamp => value
            .as_str()
            .filter(|s| DateTime::parse_from_rfc3339(s).is_ok())
            .map(|s| BoundValue::Text(s.to_string()))
            .ok_or_else(|| bad(param_name, "timestamp (RFC3339)")),
        ParameterType::Uuid => value
            .as_str()
            .filter(|s| Uuid::parse_str(s).is_ok())
            .map(|s| BoundValue::Text(s.to_string()))
            .ok_or_else(|| bad(param_name, "uuid")),
        ParameterType::StringArray => value
            .as_array()
            .map(|items| items.iter().filter_map(|v| v.as_str().map(String::from)).collect::<Vec<_>>())
            .filter(|items| items.len() == value.as_array().map(Vec::len).unwrap_or(0))
            .map(BoundValue::TextArray)
            .ok_or_else(|| bad(param_name, "string[]")),
        ParameterType::IntegerArray => value
            .as_array()
            .map(|items| items.iter().filter_map(coerce_integer).collect::<Vec<_>>())
            .filter(|items| items.len() == value.as_array().map(Vec::len).unwrap_or(0))
            .map(BoundValue::IntegerArray)
            .ok_or_else(|| bad(param_name, "integer[]")),
    }
}

fn coerce_integer(value: &Json) -> Option<i64> {
    value.as_i64().or_else(|| value.as_str().and_then(|s| s.parse().ok()))
}

/// Parses the JSON string form first so a monetary value keeps its exact
/// digits; a bare JSON number falls back through `f64`, which is only as
/// precise as the number serde_json already parsed it into.
fn coerce_decimal(value: &Json) -> Option<Decimal> {
    value
        .as_str()
        .and_then(|s| s.parse::<Decimal>().ok())
        .or_else(|| value.as_f64().and_then(|f| Decimal::try_from(f).ok()))
}

/// §9 open-question decision: any non-zero JSON number coerces to `true`,
/// matching the documented quirk verbatim rather than "fixing" it.
fn coerce_to_boolean(value: &Json) -> bool {
    if let Some(b) = value.as_bool() {
        return b;
    }
    if let Some(n) = value.as_f64() {
        return n != 0.0;
    }
    matches!(value.as_str(), Some("true") | Some("t") | Some("1") | Some("yes"))
}

fn bad(param_name: &str, expected: &str) -> SchemaIntelError {
    SchemaIntelError::invalid_argument(format!("parameter {param_name}: expected {expected}"))
}
