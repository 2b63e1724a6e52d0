//! Schema fragments and the helpers that move model schemas into a document.

use serde_json::{json, Map, Value};

use crate::error::GenerateError;

const DEFINITIONS_REF: &str = "#/definitions/";
const COMPONENTS_REF: &str = "#/components/schemas/";

// ── Fragments ──────────────────────────────────────────────

/// Document skeleton with the given info block and paths.
pub fn basic_schema(title: &str, version: &str, paths: Map<String, Value>) -> Map<String, Value> {
    let mut document = Map::new();
    document.insert("openapi".into(), json!("3.0.0"));
    document.insert("info".into(), json!({ "version": version, "title": title }));
    document.insert("paths".into(), Value::Object(paths));
    document
}

pub fn request_body_schema(schema: Value) -> Map<String, Value> {
    let mut fragment = Map::new();
    fragment.insert(
        "requestBody".into(),
        json!({ "content": { "application/json": { "schema": schema } } }),
    );
    fragment
}

pub fn request_param_schema(parameters: Vec<Value>) -> Map<String, Value> {
    let mut fragment = Map::new();
    fragment.insert("parameters".into(), Value::Array(parameters));
    fragment
}

pub fn response_schema(schema: Value) -> Map<String, Value> {
    let mut fragment = Map::new();
    fragment.insert(
        "responses".into(),
        json!({
            "200": {
                "description": "success",
                "content": { "application/json": { "schema": schema } }
            }
        }),
    );
    fragment
}

pub fn definitions_schema(definitions: Map<String, Value>) -> Map<String, Value> {
    let mut fragment = Map::new();
    fragment.insert("components".into(), json!({ "schemas": definitions }));
    fragment
}

// ── Conversion ─────────────────────────────────────────────

/// Turn each property of an object schema into a query parameter, in
/// declaration order.
pub fn convert_parameter(schema: &Value) -> Result<Vec<Value>, GenerateError> {
    let properties = schema
        .get("properties")
        .and_then(Value::as_object)
        .ok_or_else(|| GenerateError::MissingProperties {
            model: schema
                .get("title")
                .and_then(Value::as_str)
                .unwrap_or("<untitled>")
                .to_string(),
        })?;

    Ok(properties
        .iter()
        .map(|(name, property)| json!({ "name": name, "in": "query", "schema": property }))
        .collect())
}

/// Detach the `definitions` bundle of `schema` into `collected` and point
/// every reference at `components/schemas`.
///
/// References are rewritten throughout the schema, including array items and
/// the detached definitions themselves. References that already target
/// `components/schemas` are left alone, so a second pass changes nothing.
pub fn find_definitions(schema: &mut Value, collected: &mut Vec<Map<String, Value>>) {
    let detached = schema
        .as_object_mut()
        .and_then(|obj| obj.remove("definitions"));
    if let Some(Value::Object(mut definitions)) = detached {
        for definition in definitions.values_mut() {
            rewrite_refs(definition);
        }
        if !definitions.is_empty() {
            collected.push(definitions);
        }
    }
    rewrite_refs(schema);
}

fn rewrite_refs(value: &mut Value) {
    match value {
        Value::Object(obj) => {
            if let Some(Value::String(reference)) = obj.get_mut("$ref") {
                if !reference.contains("components/schemas") {
                    if let Some(name) = reference.strip_prefix(DEFINITIONS_REF) {
                        *reference = format!("{COMPONENTS_REF}{name}");
                    }
                }
            }
            for (_, child) in obj.iter_mut() {
                rewrite_refs(child);
            }
        }
        Value::Array(items) => {
            for item in items.iter_mut() {
                rewrite_refs(item);
            }
        }
        _ => {}
    }
}

/// Flatten definition bundles into one map. The first definition seen for a
/// name is kept.
pub fn merge_definitions(bundles: &[Map<String, Value>]) -> Map<String, Value> {
    let mut merged = Map::new();
    for bundle in bundles {
        for (name, definition) in bundle {
            if !merged.contains_key(name) {
                merged.insert(name.clone(), definition.clone());
            }
        }
    }
    merged
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fragments_wrap_their_payload() {
        let payload = json!({ "test": "" });
        let paths = payload.as_object().cloned().unwrap();

        assert_eq!(basic_schema("T", "1", paths)["paths"], payload);
        assert_eq!(
            request_body_schema(payload.clone())["requestBody"]["content"]["application/json"]["schema"],
            payload
        );
        assert_eq!(
            response_schema(payload.clone())["responses"]["200"]["content"]["application/json"]["schema"],
            payload
        );
        assert_eq!(
            definitions_schema(payload.as_object().cloned().unwrap())["components"]["schemas"],
            payload
        );
    }

    #[test]
    fn empty_schema_has_nothing_to_collect() {
        let mut schema = json!({ "properties": {} });
        let mut collected = Vec::new();
        find_definitions(&mut schema, &mut collected);
        assert!(collected.is_empty());
        assert_eq!(schema, json!({ "properties": {} }));
    }

    #[test]
    fn unknown_reference_forms_are_kept() {
        let mut schema = json!({ "properties": { "x": { "$ref": "https://example.com/x.json" } } });
        rewrite_refs(&mut schema);
        assert_eq!(schema["properties"]["x"]["$ref"], "https://example.com/x.json");
    }
}
