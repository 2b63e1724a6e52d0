/// Error raised while generating or writing a document.
#[derive(Debug)]
pub enum GenerateError {
    /// A query model that does not describe an object with properties.
    MissingProperties { model: String },
    Io(std::io::Error),
    Serialize(serde_json::Error),
}

impl std::fmt::Display for GenerateError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GenerateError::MissingProperties { model } => {
                write!(f, "query model '{model}' has no properties to document")
            }
            GenerateError::Io(err) => write!(f, "failed to write document: {err}"),
            GenerateError::Serialize(err) => write!(f, "failed to serialize document: {err}"),
        }
    }
}

impl std::error::Error for GenerateError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            GenerateError::MissingProperties { .. } => None,
            GenerateError::Io(err) => Some(err),
            GenerateError::Serialize(err) => Some(err),
        }
    }
}

impl From<std::io::Error> for GenerateError {
    fn from(err: std::io::Error) -> Self {
        GenerateError::Io(err)
    }
}

impl From<serde_json::Error> for GenerateError {
    fn from(err: serde_json::Error) -> Self {
        GenerateError::Serialize(err)
    }
}
