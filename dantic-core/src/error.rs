use serde::Serialize;

/// Location used for errors that do not belong to a single field.
pub const ROOT_LOC: &str = "__root__";

// ── Field-level errors ─────────────────────────────────────

/// A single field-level validation error.
///
/// `loc` is the dotted path of the offending field (`books.0.price`),
/// `kind` is a short machine-readable category such as `type_error` or
/// `value_error.missing`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub loc: String,
    pub msg: String,
    #[serde(rename = "type")]
    pub kind: String,
}

impl FieldError {
    /// A business-rule error with the generic `value_error` kind.
    pub fn new(loc: impl Into<String>, msg: impl Into<String>) -> Self {
        Self {
            loc: loc.into(),
            msg: msg.into(),
            kind: "value_error".to_string(),
        }
    }

    pub fn with_kind(mut self, kind: impl Into<String>) -> Self {
        self.kind = kind.into();
        self
    }

    pub(crate) fn missing(loc: impl Into<String>) -> Self {
        Self::new(loc, "field required").with_kind("value_error.missing")
    }
}

impl std::fmt::Display for FieldError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}\n  {} (type={})", self.loc, self.msg, self.kind)
    }
}

// ── Aggregated construction failure ────────────────────────

/// Every error collected while constructing one schema model.
///
/// Never empty: construction only fails when at least one structural or
/// business-rule error was found.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    model: String,
    errors: Vec<FieldError>,
}

impl ValidationError {
    pub fn new(model: impl Into<String>, errors: Vec<FieldError>) -> Self {
        Self {
            model: model.into(),
            errors,
        }
    }

    /// Name of the model that failed to construct.
    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn errors(&self) -> &[FieldError] {
        &self.errors
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    /// Locations of all errors, in the order they were reported.
    pub fn locations(&self) -> Vec<&str> {
        self.errors.iter().map(|e| e.loc.as_str()).collect()
    }

    /// JSON rendering of the error list, used in `validation_error` bodies.
    pub fn to_json_string(&self) -> String {
        serde_json::to_string(&self.errors).unwrap_or_else(|_| self.to_string())
    }
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let plural = if self.errors.len() == 1 { "" } else { "s" };
        write!(
            f,
            "{} validation error{plural} for {}",
            self.errors.len(),
            self.model
        )?;
        for error in &self.errors {
            write!(f, "\n{error}")?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationError {}

// ── Schema compilation ─────────────────────────────────────

/// A model's generated schema could not be compiled by the validation engine.
#[derive(Debug, Clone)]
pub struct SchemaError {
    pub model: String,
    pub message: String,
}

impl std::fmt::Display for SchemaError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Invalid schema for model '{}': {}", self.model, self.message)
    }
}

impl std::error::Error for SchemaError {}

// ── Model operations ───────────────────────────────────────

/// Error type for schema model operations.
#[derive(Debug, Clone)]
pub enum ModelError {
    /// Input did not satisfy the model.
    Invalid(ValidationError),
    /// The model's schema could not be compiled.
    Schema(SchemaError),
    /// A value could not be converted to or from its serde representation.
    Serialize(String),
}

impl std::fmt::Display for ModelError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ModelError::Invalid(err) => write!(f, "{err}"),
            ModelError::Schema(err) => write!(f, "{err}"),
            ModelError::Serialize(msg) => write!(f, "Serialization error: {msg}"),
        }
    }
}

impl std::error::Error for ModelError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ModelError::Invalid(err) => Some(err),
            ModelError::Schema(err) => Some(err),
            ModelError::Serialize(_) => None,
        }
    }
}

impl From<ValidationError> for ModelError {
    fn from(err: ValidationError) -> Self {
        ModelError::Invalid(err)
    }
}

impl From<SchemaError> for ModelError {
    fn from(err: SchemaError) -> Self {
        ModelError::Schema(err)
    }
}

impl From<serde_json::Error> for ModelError {
    fn from(err: serde_json::Error) -> Self {
        ModelError::Serialize(err.to_string())
    }
}

impl ModelError {
    /// The aggregated validation errors, if this is an input failure.
    pub fn as_validation(&self) -> Option<&ValidationError> {
        match self {
            ModelError::Invalid(err) => Some(err),
            _ => None,
        }
    }
}
