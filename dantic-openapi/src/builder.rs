use std::path::PathBuf;

use dantic_core::config::{DOCS_DIR, DOCS_TITLE, DOCS_VERSION};
use dantic_core::http::Method;
use dantic_core::{ConfigError, DanticConfig, Endpoint, RouteRegistry};
use serde_json::{json, Map, Value};

use crate::error::GenerateError;
use crate::schema::{
    basic_schema, convert_parameter, definitions_schema, find_definitions, merge_definitions,
    request_body_schema, request_param_schema, response_schema,
};

/// Configuration for the generated document.
#[derive(Debug, Clone)]
pub struct OpenApiConfig {
    pub title: String,
    pub version: String,
    pub description: Option<String>,
    /// Directory `generate_swagger` writes into.
    pub output_dir: PathBuf,
}

impl Default for OpenApiConfig {
    fn default() -> Self {
        Self {
            title: "API Swagger".to_string(),
            version: "1.0.0".to_string(),
            description: None,
            output_dir: PathBuf::from("docs"),
        }
    }
}

impl OpenApiConfig {
    pub fn new(title: &str, version: &str) -> Self {
        Self {
            title: title.to_string(),
            version: version.to_string(),
            ..Self::default()
        }
    }

    /// Read `dantic.docs.*` keys, keeping the defaults for missing ones.
    pub fn from_config(config: &DanticConfig) -> Result<Self, ConfigError> {
        let defaults = Self::default();
        let output_dir: String =
            config.get_or(DOCS_DIR, defaults.output_dir.to_string_lossy().into_owned())?;
        Ok(Self {
            title: config.get_or(DOCS_TITLE, defaults.title)?,
            version: config.get_or(DOCS_VERSION, defaults.version)?,
            description: None,
            output_dir: PathBuf::from(output_dir),
        })
    }

    pub fn with_description(mut self, desc: &str) -> Self {
        self.description = Some(desc.to_string());
        self
    }

    pub fn with_output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_dir = dir.into();
        self
    }
}

/// Methods that never get an operation of their own.
fn is_documented(method: &Method) -> bool {
    *method != Method::OPTIONS && *method != Method::HEAD
}

/// Build the document for every endpoint whose name starts with `prefix`.
///
/// Endpoints without a response model are skipped. When an endpoint
/// declares both a query and a body model, only the query model is
/// documented.
pub fn build_document(
    config: &OpenApiConfig,
    registry: &RouteRegistry,
    prefix: &str,
) -> Result<Value, GenerateError> {
    let mut paths: Map<String, Value> = Map::new();
    let mut bundles: Vec<Map<String, Value>> = Vec::new();

    for endpoint in registry.endpoints() {
        if !endpoint.name.starts_with(prefix) {
            continue;
        }
        let Some(response_model) = endpoint.models.response else {
            continue;
        };

        for rule in &endpoint.rules {
            for method in rule.methods.iter().filter(|m| is_documented(m)) {
                let mut operation = request_operation(endpoint, &mut bundles)?;

                let mut response = response_model.describe();
                find_definitions(&mut response, &mut bundles);
                operation.extend(response_schema(response));

                let path_entry = paths
                    .entry(rule.pattern.clone())
                    .or_insert_with(|| json!({}));
                if let Some(obj) = path_entry.as_object_mut() {
                    obj.insert(method.as_str().to_lowercase(), Value::Object(operation));
                }
            }
        }
        tracing::debug!(endpoint = %endpoint.name, rules = endpoint.rules.len(), "documented endpoint");
    }

    let mut document = basic_schema(&config.title, &config.version, paths);
    if let Some(ref desc) = config.description {
        if let Some(Value::Object(info)) = document.get_mut("info") {
            info.insert("description".into(), json!(desc));
        }
    }
    if !bundles.is_empty() {
        document.extend(definitions_schema(merge_definitions(&bundles)));
    }
    Ok(Value::Object(document))
}

fn request_operation(
    endpoint: &Endpoint,
    bundles: &mut Vec<Map<String, Value>>,
) -> Result<Map<String, Value>, GenerateError> {
    let models = &endpoint.models;
    match (models.query, models.body) {
        (Some(query), _) => {
            let mut schema = query.describe();
            find_definitions(&mut schema, bundles);
            let parameters = convert_parameter(&schema).map_err(|err| match err {
                GenerateError::MissingProperties { .. } => GenerateError::MissingProperties {
                    model: query.name(),
                },
                other => other,
            })?;
            Ok(request_param_schema(parameters))
        }
        (None, Some(body)) => {
            let mut schema = body.describe();
            find_definitions(&mut schema, bundles);
            Ok(request_body_schema(schema))
        }
        (None, None) => {
            let mut operation = Map::new();
            operation.insert("summary".into(), json!("no parameters"));
            Ok(operation)
        }
    }
}
