//! Placeholder substitution for notification request descriptors
//!
//! Strings may reference variables as `${NAME}` or `${this.NAME}`. Unknown
//! names render as the literal `undefined`. Nothing is ever evaluated.

use serde_json::Value;
use std::collections::HashMap;

pub type TemplateVars = HashMap<String, String>;

/// Variables visible to templates: the process environment at load time
pub fn env_vars() -> TemplateVars {
    std::env::vars().collect()
}

pub fn substitute_str(input: &str, vars: &TemplateVars) -> String {
    let mut out = String::with_capacity(input.len());
    let mut rest = input;

    while let Some(start) = rest.find("${") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];

        let Some(end) = after.find('}') else {
            // unterminated, keep verbatim
            out.push_str(&rest[start..]);
            rest = "";
            break;
        };

        let name = after[..end].trim();
        let name = name.strip_prefix("this.").unwrap_or(name);
        out.push_str(vars.get(name).map(String::as_str).unwrap_or("undefined"));
        rest = &after[end + 1..];
    }

    out.push_str(rest);
    out
}

/// Rewrite every string inside `value`, recursing through objects and arrays
pub fn substitute_value(value: &Value, vars: &TemplateVars) -> Value {
    match value {
        Value::String(s) => Value::String(substitute_str(s, vars)),
        Value::Array(items) => Value::Array(items.iter().map(|v| substitute_value(v, vars)).collect()),
        Value::Object(map) => Value::Object(
            map.iter()
                .map(|(k, v)| (k.clone(), substitute_value(v, vars)))
                .collect(),
        ),
        other => other.clone(),
    }
}
