use std::fs;
use std::path::{Path, PathBuf};

use dantic_core::RouteRegistry;
use serde::Serialize;
use serde_json::ser::PrettyFormatter;
use serde_json::Value;

use crate::builder::{build_document, OpenApiConfig};
use crate::error::GenerateError;

/// Write `document` to `<dir>/<prefix>-swagger.json`, creating `dir` if
/// needed. Output is indented by four spaces; non-ASCII text is written as is.
pub fn write_document(dir: &Path, prefix: &str, document: &Value) -> Result<PathBuf, GenerateError> {
    fs::create_dir_all(dir)?;
    let path = dir.join(format!("{prefix}-swagger.json"));

    let mut buf = Vec::new();
    let mut serializer =
        serde_json::Serializer::with_formatter(&mut buf, PrettyFormatter::with_indent(b"    "));
    document.serialize(&mut serializer)?;
    fs::write(&path, buf)?;

    tracing::info!(path = %path.display(), "OpenAPI document written");
    Ok(path)
}

/// Build the document for `prefix` and persist it under the configured
/// output directory. Returns the document.
pub fn generate_swagger(
    config: &OpenApiConfig,
    registry: &RouteRegistry,
    prefix: &str,
) -> Result<Value, GenerateError> {
    let document = build_document(config, registry, prefix)?;
    write_document(&config.output_dir, prefix, &document)?;
    Ok(document)
}
