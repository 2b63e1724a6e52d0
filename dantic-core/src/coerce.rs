//! Lenient coercion of raw inputs toward a model's declared types.
//!
//! Path and query parameters always arrive as strings, and clients often send
//! numbers as strings in JSON bodies too. Before the structural check runs,
//! values are converted to the type their schema declares when that
//! conversion is lossless (`"123"` to `123`, `"true"` to `true`, `7` to
//! `"7"`). Values that cannot be converted are left untouched so the
//! validation engine reports them.

use serde_json::{Map, Number, Value};

const DEFINITIONS_PREFIX: &str = "#/definitions/";

/// Coerce `value` in place against `schema`, resolving `$ref`s against `root`.
pub fn coerce(value: &mut Value, schema: &Value, root: &Value) {
    coerce_at_depth(value, schema, root, 0);
}

/// Coerce the fields of an input mapping against an object schema.
pub fn coerce_object(input: &mut Map<String, Value>, schema: &Value, root: &Value) {
    coerce_fields(input, schema, root, 0);
}

// Bounds recursion through self-referencing definitions.
const MAX_DEPTH: usize = 32;

fn coerce_at_depth(value: &mut Value, schema: &Value, root: &Value, depth: usize) {
    if depth > MAX_DEPTH {
        return;
    }
    let schema = resolve(schema, root);

    if let Some(Value::Array(parts)) = schema.get("allOf") {
        for part in parts {
            coerce_at_depth(value, part, root, depth + 1);
        }
    }

    let declared = declared_type(schema);
    let replacement = match (declared, &*value) {
        (Some("integer"), Value::String(s)) => parse_integer(s.trim()),
        (Some("integer"), Value::Number(n)) if n.is_f64() => n.as_f64().and_then(integral),
        (Some("number"), Value::String(s)) => s
            .trim()
            .parse::<f64>()
            .ok()
            .and_then(Number::from_f64)
            .map(Value::Number),
        (Some("boolean"), Value::String(s)) => parse_bool(s).map(Value::Bool),
        (Some("string"), Value::Number(n)) => Some(Value::String(n.to_string())),
        _ => None,
    };
    if let Some(replacement) = replacement {
        *value = replacement;
        return;
    }

    match value {
        Value::Object(fields) if matches!(declared, Some("object") | None) => {
            coerce_fields(fields, schema, root, depth);
        }
        Value::Array(items) if declared == Some("array") => {
            if let Some(item_schema) = schema.get("items") {
                for item in items.iter_mut() {
                    coerce_at_depth(item, item_schema, root, depth + 1);
                }
            }
        }
        _ => {}
    }
}

fn coerce_fields(fields: &mut Map<String, Value>, schema: &Value, root: &Value, depth: usize) {
    let Some(properties) = schema.get("properties").and_then(Value::as_object) else {
        return;
    };
    let required = required_names(schema);

    // An explicit null for an optional field means "not provided".
    fields.retain(|key, value| !(value.is_null() && !required.contains(&key.as_str())));

    for (name, property) in properties {
        if let Some(field) = fields.get_mut(name) {
            coerce_at_depth(field, property, root, depth + 1);
        }
    }
}

/// Follow a `#/definitions/X` reference, or return the schema itself.
pub(crate) fn resolve<'a>(schema: &'a Value, root: &'a Value) -> &'a Value {
    let mut current = schema;
    for _ in 0..MAX_DEPTH {
        let Some(name) = current
            .get("$ref")
            .and_then(Value::as_str)
            .and_then(|r| r.strip_prefix(DEFINITIONS_PREFIX))
        else {
            break;
        };
        match root.get("definitions").and_then(|defs| defs.get(name)) {
            Some(target) => current = target,
            None => break,
        }
    }
    current
}

/// The declared JSON type, taking the first non-null entry of a type union.
fn declared_type(schema: &Value) -> Option<&str> {
    match schema.get("type")? {
        Value::String(t) => Some(t.as_str()),
        Value::Array(types) => types
            .iter()
            .filter_map(Value::as_str)
            .find(|t| *t != "null"),
        _ => None,
    }
}

pub(crate) fn required_names(schema: &Value) -> Vec<&str> {
    schema
        .get("required")
        .and_then(Value::as_array)
        .map(|names| names.iter().filter_map(Value::as_str).collect())
        .unwrap_or_default()
}

fn parse_integer(raw: &str) -> Option<Value> {
    raw.parse::<i64>()
        .map(Value::from)
        .or_else(|_| raw.parse::<u64>().map(Value::from))
        .ok()
}

/// `2.0` becomes `2` when it fits a 64-bit integer.
fn integral(f: f64) -> Option<Value> {
    if f.fract() != 0.0 {
        return None;
    }
    if f >= i64::MIN as f64 && f < i64::MAX as f64 {
        Some(Value::from(f as i64))
    } else if f >= 0.0 && f < u64::MAX as f64 {
        Some(Value::from(f as u64))
    } else {
        None
    }
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn root() -> Value {
        json!({
            "type": "object",
            "properties": {
                "price": {"type": "integer"},
                "ratio": {"type": "number"},
                "active": {"type": "boolean"},
                "title": {"type": "string"},
                "note": {"type": "string"},
                "books": {"type": "array", "items": {"$ref": "#/definitions/Book"}}
            },
            "required": ["title"],
            "definitions": {
                "Book": {
                    "type": "object",
                    "properties": {"price": {"type": "integer"}}
                }
            }
        })
    }

    #[test]
    fn converts_scalar_strings() {
        let root = root();
        let mut value = json!({
            "price": "12", "ratio": "0.5", "active": "yes", "title": 7
        });
        coerce(&mut value, &root, &root);
        assert_eq!(value, json!({"price": 12, "ratio": 0.5, "active": true, "title": "7"}));
    }

    #[test]
    fn follows_refs_into_array_items() {
        let root = root();
        let mut value = json!({"books": [{"price": "3"}, {"price": "x"}]});
        coerce(&mut value, &root, &root);
        assert_eq!(value["books"][0]["price"], 3);
        assert_eq!(value["books"][1]["price"], "x");
    }

    #[test]
    fn drops_null_for_optional_fields_only() {
        let root = root();
        let mut value = json!({"note": null, "title": null});
        coerce(&mut value, &root, &root);
        assert!(value.get("note").is_none());
        assert!(value["title"].is_null());
    }

    #[test]
    fn integers_accept_integral_floats_and_large_unsigned() {
        let root = root();
        let mut value = json!({"price": 2.0});
        coerce(&mut value, &root, &root);
        assert!(value["price"].is_i64());
        assert_eq!(value["price"], 2);

        let mut value = json!({"price": 2.5});
        coerce(&mut value, &root, &root);
        assert_eq!(value["price"], 2.5);

        let mut value = json!({"price": "18446744073709551615"});
        coerce(&mut value, &root, &root);
        assert_eq!(value["price"], u64::MAX);
    }

    #[test]
    fn leaves_unparseable_values_alone() {
        let root = root();
        let mut value = json!({"price": "str"});
        coerce(&mut value, &root, &root);
        assert_eq!(value["price"], "str");
    }
}
