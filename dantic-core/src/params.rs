use crate::http::{Json, IntoResponse, RawPathParams, Response, StatusCode};
use serde_json::{Map, Value};

/// Error raised while extracting raw request inputs, before any model runs.
#[derive(Debug, Clone)]
pub struct BodyError {
    pub message: String,
}

impl std::fmt::Display for BodyError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for BodyError {}

impl IntoResponse for BodyError {
    fn into_response(self) -> Response {
        let body = serde_json::json!({ "error": self.message });
        (StatusCode::BAD_REQUEST, Json(body)).into_response()
    }
}

/// Raw, unvalidated inputs of one request.
///
/// Every value starts out as it arrived on the wire: path and query values
/// are strings, the body is whatever JSON object the client sent.
#[derive(Debug, Clone, Default)]
pub struct RequestParts {
    pub path_params: Map<String, Value>,
    pub query: Map<String, Value>,
    pub body: Option<Map<String, Value>>,
}

impl RequestParts {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_path_param(mut self, name: &str, value: &str) -> Self {
        self.path_params
            .insert(name.to_string(), Value::String(value.to_string()));
        self
    }

    /// Parse and set the query string (without the leading `?`).
    pub fn with_query(mut self, query: &str) -> Self {
        self.query = query_map(Some(query));
        self
    }

    pub fn with_body(mut self, body: Map<String, Value>) -> Self {
        self.body = Some(body);
        self
    }

    /// Build the input for a model from the path parameters (when merging
    /// is enabled) overlaid with `source`. Keys in `source` win.
    pub fn merged(&self, source: &Map<String, Value>, merge_path_params: bool) -> Map<String, Value> {
        let mut input = if merge_path_params {
            self.path_params.clone()
        } else {
            Map::new()
        };
        for (key, value) in source {
            input.insert(key.clone(), value.clone());
        }
        input
    }
}

/// Parse a query string into key-value pairs.
pub fn parse_query_string(query: Option<&str>) -> Vec<(String, String)> {
    match query {
        Some(q) => form_urlencoded::parse(q.as_bytes())
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect(),
        None => Vec::new(),
    }
}

/// Parse a query string into a mapping. The first value of a repeated key wins.
pub fn query_map(query: Option<&str>) -> Map<String, Value> {
    let mut map = Map::new();
    for (key, value) in parse_query_string(query) {
        map.entry(key).or_insert(Value::String(value));
    }
    map
}

/// Collect axum's captured path parameters into a mapping of strings.
pub fn path_map(raw: &RawPathParams) -> Map<String, Value> {
    raw.iter()
        .map(|(k, v)| (k.to_string(), Value::String(v.to_string())))
        .collect()
}

/// Parse a JSON request body that must be an object.
pub fn parse_json_object(bytes: &[u8]) -> Result<Map<String, Value>, BodyError> {
    if bytes.is_empty() {
        return Err(BodyError {
            message: "Missing JSON request body".to_string(),
        });
    }
    match serde_json::from_slice::<Value>(bytes) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(_) => Err(BodyError {
            message: "JSON request body must be an object".to_string(),
        }),
        Err(err) => Err(BodyError {
            message: format!("Invalid JSON request body: {err}"),
        }),
    }
}
