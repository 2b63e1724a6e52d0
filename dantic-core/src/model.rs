//! The `SchemaModel` trait and model-to-object population.

use schemars::JsonSchema;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};

use crate::error::{FieldError, ModelError};
use crate::schema::{self, CompiledModel};

/// A typed record that validates raw request input and describes itself as
/// a JSON schema.
///
/// Everything except the business-rule hook is derived from the serde and
/// schemars derives, so a model is usually just:
///
/// ```ignore
/// #[derive(Debug, Serialize, Deserialize, JsonSchema)]
/// pub struct Book {
///     pub title: Option<String>,
///     pub price: Option<i64>,
///     #[serde(default = "default_tag")]
///     pub tag: String,
/// }
///
/// impl SchemaModel for Book {}
/// ```
///
/// Field declaration order is kept in the generated schema.
pub trait SchemaModel: Serialize + DeserializeOwned + JsonSchema + Send + Sync + 'static {
    /// Business rules checked after structural validation succeeds.
    ///
    /// Return one error per violated rule. The default accepts everything.
    fn validate_rules(&self) -> Vec<FieldError> {
        Vec::new()
    }

    /// Name under which the model is published in `components/schemas`.
    fn model_name() -> String {
        <Self as JsonSchema>::schema_name().into_owned()
    }

    /// JSON-schema description of the model: `title`, `description`,
    /// `type`, `properties`, `required`, and a `definitions` map holding
    /// every nested model.
    fn describe() -> Value {
        schema::describe::<Self>()
    }

    /// Validate raw input and build an instance.
    ///
    /// Compiles the schema on every call; long-lived callers should keep a
    /// [`CompiledModel`] instead.
    fn construct(input: Map<String, Value>) -> Result<Self, ModelError> {
        let compiled = CompiledModel::<Self>::compile()?;
        Ok(compiled.construct(input)?)
    }

    /// Flatten the instance into plain key/value form.
    fn as_mapping(&self) -> Map<String, Value> {
        match serde_json::to_value(self) {
            Ok(Value::Object(map)) => map,
            _ => Map::new(),
        }
    }

    fn document(&self) -> Map<String, Value> {
        self.as_mapping()
    }

    /// Copy every field of this instance onto `target`.
    ///
    /// Fields for which `target` declares a setter go through it; every
    /// other field is assigned directly.
    fn populate<P: Populate>(&self, target: &mut P) -> Result<(), ModelError> {
        let mut assigned = Map::new();
        let mut deferred = Vec::new();
        for (field, value) in self.as_mapping() {
            match P::setter(&field) {
                Some(setter) => deferred.push((setter, value)),
                None => {
                    assigned.insert(field, value);
                }
            }
        }
        // Direct assignment rebuilds the target, so setters run afterwards.
        if !assigned.is_empty() {
            target.assign(assigned)?;
        }
        for (setter, value) in deferred {
            setter(target, value)?;
        }
        Ok(())
    }
}

/// A setter declared by a [`Populate`] target for one field.
pub type Setter<P> = fn(&mut P, Value) -> Result<(), ModelError>;

/// A type that schema model instances can be copied onto.
///
/// The target declares which fields need custom handling by returning a
/// setter for them; all other fields are written straight into its serde
/// representation.
///
/// ```ignore
/// impl Populate for BookRecord {
///     fn setter(field: &str) -> Option<Setter<Self>> {
///         match field {
///             "title" => Some(|record, value| {
///                 record.set_title(serde_json::from_value(value)?);
///                 Ok(())
///             }),
///             _ => None,
///         }
///     }
/// }
/// ```
pub trait Populate: Serialize + DeserializeOwned {
    fn setter(_field: &str) -> Option<Setter<Self>> {
        None
    }

    /// Direct assignment of the given fields.
    fn assign(&mut self, fields: Map<String, Value>) -> Result<(), ModelError> {
        let mut current = match serde_json::to_value(&*self)? {
            Value::Object(map) => map,
            _ => {
                return Err(ModelError::Serialize(
                    "populate target must serialize to an object".to_string(),
                ))
            }
        };
        for (key, value) in fields {
            current.insert(key, value);
        }
        *self = serde_json::from_value(Value::Object(current))?;
        Ok(())
    }
}
