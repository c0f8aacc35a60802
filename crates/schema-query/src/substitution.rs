//! Placeholder discovery and positional substitution (§4.6). Every
//! `{{param}}` in the SQL text must have a matching `QueryParameter`
//! definition; values are coerced and handed to the adapter as ordered
//! binds — string interpolation into SQL text is never performed here.

use std::collections::HashMap;

use serde_json::Value as Json;

use schema_core::error::{Result, SchemaIntelError};
use schema_core::ports::BoundValue;
use schema_types::query::QueryParameter;

/// Extracts every `{{name}}` placeholder from `sql`, in order of first
/// appearance, without deduplicating — declaration order is positional.
pub fn find_placeholders(sql: &str) -> Vec<String> {
    let mut names = Vec::new();
    let mut rest = sql;
    while let Some(start) = rest.find("{{") {
        let after = &rest[start + 2..];
        let Some(end) = after.find("}}") else { break };
        names.push(after[..end].trim().to_string());
        rest = &after[end + 2..];
    }
    names
}

/// Validates that every placeholder in `sql` has a matching parameter
/// definition, coerces the supplied values in placeholder order, and
/// returns the resulting bind list plus the SQL with placeholders replaced
/// by positional markers (`$1`, `$2`, ...).
pub fn bind(
    sql: &str,
    parameters: &[QueryParameter],
    supplied: &HashMap<String, Json>,
) -> Result<(String, Vec<BoundValue>)> {
    let placeholders = find_placeholders(sql);
    let mut bound = Vec::with_capacity(placeholders.len());
    let mut rewritten = String::with_capacity(sql.len());
    let mut rest = sql;
    let mut position = 0usize;

    for name in &placeholders {
        let def = parameters
            .iter()
            .find(|p| &p.name == name)
            .ok_or_else(|| SchemaIntelError::invalid_argument(format!("no parameter definition for {{{{{name}}}}}")))?;

        let raw = supplied
            .get(name)
            .or(def.default_value.as_ref())
            .cloned()
            .unwrap_or(Json::Null);

        if def.required && raw.is_null() {
            return Err(SchemaIntelError::invalid_argument(format!("missing required parameter {name}")));
        }

        let value = crate::coercion::coerce(name, def.param_type, &raw)?;
        bound.push(value);
        position += 1;

        let start = rest.find("{{").expect("placeholder located by find_placeholders must still be present");
        rewritten.push_str(&rest[..start]);
        rewritten.push_str(&format!("${position}"));
        let after_marker = rest[start..].find("}}").expect("matching close brace") + start + 2;
        rest = &rest[after_marker..];
    }
    rewritten.push_str(rest);

    Ok((rewritten, bound))
}

#[cfg(test)]
mod tests {
    use super::*;
    use schema_types::enums::ParameterType;
    use serde_json::json;

    fn param(name: &str, param_type: ParameterType, required: bool) -> QueryParameter {
        QueryParameter {
            name: name.into(),
            param_type,
            required,
            default_value: None,
        }
    }

    #[test]
    fn finds_placeholders_in_declaration_order() {
        let names = find_placeholders("select * from t where a = {{alpha}} and b = {{beta}}");
        assert_eq!(names, vec!["alpha".to_string(), "beta".to_string()]);
    }

    #[test]
    fn binds_in_order_and_rewrites_to_positional_markers() {
        let sql = "select * from t where a = {{alpha}} and b = {{beta}}";
        let params = vec![
            param("alpha", ParameterType::Integer, true),
            param("beta", ParameterType::String, true),
        ];
        let mut supplied = HashMap::new();
        supplied.insert("alpha".to_string(), json!(7));
        supplied.insert("beta".to_string(), json!("x"));

        let (rewritten, bound) = bind(sql, &params, &supplied).unwrap();
        assert_eq!(rewritten, "select * from t where a = $1 and b = $2");
        assert_eq!(bound.len(), 2);
    }

    #[test]
    fn missing_parameter_definition_fails() {
        let sql = "select {{unknown}}";
        let err = bind(sql, &[], &HashMap::new()).unwrap_err();
        assert!(err.to_string().contains("no parameter definition"));
    }

    #[test]
    fn missing_required_value_fails() {
        let sql = "select {{alpha}}";
        let params = vec![param("alpha", ParameterType::Integer, true)];
        let err = bind(sql, &params, &HashMap::new()).unwrap_err();
        assert!(err.to_string().contains("missing required parameter"));
    }

    #[test]
    fn default_value_is_used_when_not_supplied() {
        let sql = "select {{alpha}}";
        let mut p = param("alpha", ParameterType::Integer, false);
        p.default_value = Some(json!(9));
        let (_, bound) = bind(sql, &[p], &HashMap::new()).unwrap();
        assert!(matches!(bound[0], BoundValue::Integer(9)));
    }
}
