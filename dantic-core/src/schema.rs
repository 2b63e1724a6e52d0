//! Schema generation and the precompiled structural validator.
//!
//! Models describe themselves through schemars using draft-07 settings, so
//! nested models land in a `definitions` side-map and are referenced as
//! `#/definitions/Name`. The same document drives coercion, structural
//! validation (delegated to jsonschema) and OpenAPI generation.

use std::marker::PhantomData;

use schemars::generate::SchemaSettings;
use schemars::JsonSchema;
use serde_json::{json, Map, Value};

use crate::coerce::{coerce_object, required_names};
use crate::error::{FieldError, SchemaError, ValidationError, ROOT_LOC};
use crate::model::SchemaModel;

const DEFINITIONS_PREFIX: &str = "#/definitions/";

/// Generate the full draft-07 schema of `T`, including `$schema` and
/// `definitions`.
pub fn root_schema<T: JsonSchema>() -> Value {
    let mut settings = SchemaSettings::draft07();
    settings.option_add_null_type = false;
    settings.option_nullable = false;
    let schema = settings.into_generator().into_root_schema_for::<T>();

    let mut value = serde_json::to_value(schema).unwrap_or_else(|_| json!({ "type": "object" }));
    inline_enum_definitions(&mut value);
    value
}

/// The model description handed to documentation: the root schema without
/// its `$schema` marker.
pub fn describe<T: JsonSchema>() -> Value {
    let mut schema = root_schema::<T>();
    if let Some(obj) = schema.as_object_mut() {
        obj.shift_remove("$schema");
    }
    schema
}

/// Replace references to plain enum definitions with the enum schema itself,
/// so enum fields read `{type, enum}` in place.
fn inline_enum_definitions(root: &mut Value) {
    let Some(definitions) = root.get("definitions").and_then(Value::as_object) else {
        return;
    };
    let enums: Map<String, Value> = definitions
        .iter()
        .filter(|(_, def)| def.get("enum").is_some() && def.get("properties").is_none())
        .map(|(name, def)| (name.clone(), def.clone()))
        .collect();
    if enums.is_empty() {
        return;
    }

    replace_enum_refs(root, &enums);

    let Some(obj) = root.as_object_mut() else {
        return;
    };
    let now_empty = match obj.get_mut("definitions") {
        Some(Value::Object(definitions)) => {
            for name in enums.keys() {
                definitions.shift_remove(name);
            }
            definitions.is_empty()
        }
        _ => false,
    };
    if now_empty {
        obj.shift_remove("definitions");
    }
}

fn replace_enum_refs(value: &mut Value, enums: &Map<String, Value>) {
    match value {
        Value::Object(obj) => {
            let target = obj
                .get("$ref")
                .and_then(Value::as_str)
                .and_then(|r| r.strip_prefix(DEFINITIONS_PREFIX))
                .and_then(|name| enums.get(name))
                .cloned();
            if let Some(Value::Object(target)) = target {
                obj.shift_remove("$ref");
                for (key, v) in target {
                    obj.entry(key).or_insert(v);
                }
            }
            for (_, child) in obj.iter_mut() {
                replace_enum_refs(child, enums);
            }
        }
        Value::Array(items) => {
            for item in items.iter_mut() {
                replace_enum_refs(item, enums);
            }
        }
        _ => {}
    }
}

/// Convert a JSON pointer (`/books/0/price`) into a dotted field path
/// (`books.0.price`).
pub(crate) fn pointer_to_loc(pointer: &str) -> String {
    let trimmed = pointer.trim_start_matches('/');
    if trimmed.is_empty() {
        return ROOT_LOC.to_string();
    }
    trimmed
        .split('/')
        .map(|segment| segment.replace("~1", "/").replace("~0", "~"))
        .collect::<Vec<_>>()
        .join(".")
}

// ── Compiled model ─────────────────────────────────────────

/// A model's schema compiled once into a reusable structural validator.
///
/// Compile at startup and share it: `Validate::wrap` does this for every
/// model it declares, so requests never pay for schema compilation.
pub struct CompiledModel<T> {
    name: String,
    schema: Value,
    required: Vec<String>,
    validator: jsonschema::Validator,
    _model: PhantomData<fn() -> T>,
}

impl<T: SchemaModel> CompiledModel<T> {
    pub fn compile() -> Result<Self, SchemaError> {
        let name = T::model_name();
        let schema = root_schema::<T>();
        let required = required_names(&schema)
            .into_iter()
            .map(str::to_string)
            .collect();

        // Top-level required fields are reported per field by `construct`.
        let mut structural = schema.clone();
        if let Some(obj) = structural.as_object_mut() {
            obj.remove("required");
        }
        let validator = jsonschema::validator_for(&structural).map_err(|e| SchemaError {
            model: name.clone(),
            message: e.to_string(),
        })?;

        tracing::debug!(model = %name, "compiled model schema");
        Ok(Self {
            name,
            schema,
            required,
            validator,
            _model: PhantomData,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Build a model instance from raw input.
    ///
    /// All structural errors are collected before failing. The model's
    /// business rules only run once the input is structurally valid.
    pub fn construct(&self, mut input: Map<String, Value>) -> Result<T, ValidationError> {
        coerce_object(&mut input, &self.schema, &self.schema);

        let mut errors: Vec<FieldError> = self
            .required
            .iter()
            .filter(|name| !input.contains_key(name.as_str()))
            .map(|name| FieldError::missing(name.as_str()))
            .collect();

        // One entry per location: an enum field given a bool fails both
        // `enum` and `type`, only the first is kept.
        let instance = Value::Object(input);
        for error in self.validator.iter_errors(&instance) {
            let loc = pointer_to_loc(error.instance_path().as_str());
            if errors.iter().all(|seen| seen.loc != loc) {
                errors.push(FieldError::new(loc, error.to_string()));
            }
        }
        if !errors.is_empty() {
            return Err(ValidationError::new(&self.name, errors));
        }

        let model: T = serde_json::from_value(instance).map_err(|e| {
            ValidationError::new(
                &self.name,
                vec![FieldError::new(ROOT_LOC, e.to_string()).with_kind("type_error")],
            )
        })?;

        let rule_errors = model.validate_rules();
        if !rule_errors.is_empty() {
            return Err(ValidationError::new(&self.name, rule_errors));
        }
        Ok(model)
    }
}

impl<T> std::fmt::Debug for CompiledModel<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CompiledModel")
            .field("name", &self.name)
            .field("required", &self.required)
            .finish_non_exhaustive()
    }
}
