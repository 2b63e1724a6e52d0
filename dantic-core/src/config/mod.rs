mod value;

use std::collections::HashMap;
use std::path::Path;

pub use value::{ConfigValue, FromConfigValue};

/// Key for the generated document's `info.title`.
pub const DOCS_TITLE: &str = "dantic.docs.title";
/// Key for the generated document's `info.version`.
pub const DOCS_VERSION: &str = "dantic.docs.version";
/// Key for the directory generated documents are written to.
pub const DOCS_DIR: &str = "dantic.docs.dir";
/// Key for the maximum JSON body size read for validation, in bytes.
pub const BODY_LIMIT: &str = "dantic.body.limit";

/// Error type for configuration operations.
#[derive(Debug)]
pub enum ConfigError {
    /// The requested key was not found in the configuration.
    NotFound(String),
    /// The value could not be converted to the requested type.
    TypeMismatch { key: String, expected: &'static str },
    /// An I/O or YAML parsing error occurred while loading config files.
    Load(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::NotFound(key) => write!(f, "Config key not found: {key}"),
            ConfigError::TypeMismatch { key, expected } => {
                write!(f, "Config type mismatch for '{key}': expected {expected}")
            }
            ConfigError::Load(msg) => write!(f, "Config load error: {msg}"),
        }
    }
}

impl std::error::Error for ConfigError {}

/// Settings loaded from YAML files, `.env` files, and environment variables.
///
/// Resolution order (lowest to highest priority):
/// 1. `application.yaml`
/// 2. `application-{profile}.yaml`
/// 3. `.env` then `.env.{profile}` (loaded into the process environment,
///    never overwriting variables that are already set)
/// 4. Environment variables: `DANTIC_DOCS_TITLE` overrides `dantic.docs.title`
///
/// The profile comes from `DANTIC_PROFILE`, falling back to the argument.
#[derive(Debug, Clone)]
pub struct DanticConfig {
    values: HashMap<String, ConfigValue>,
    profile: String,
}

impl DanticConfig {
    /// Load configuration for `profile` from the current working directory.
    pub fn load(profile: &str) -> Result<Self, ConfigError> {
        Self::load_from(Path::new("."), profile)
    }

    /// Load configuration for `profile` from the files in `dir`.
    pub fn load_from(dir: &Path, profile: &str) -> Result<Self, ConfigError> {
        let profile = std::env::var("DANTIC_PROFILE").unwrap_or_else(|_| profile.to_string());
        let mut values = HashMap::new();

        load_yaml_file(&dir.join("application.yaml"), &mut values)?;
        load_yaml_file(&dir.join(format!("application-{profile}.yaml")), &mut values)?;

        let _ = dotenvy::from_path(dir.join(".env"));
        let _ = dotenvy::from_path(dir.join(format!(".env.{profile}")));

        // `DANTIC_DOCS_TITLE` <-> `dantic.docs.title`
        for (env_key, env_val) in std::env::vars() {
            if env_key.starts_with("DANTIC_") {
                let key = env_key.to_lowercase().replace('_', ".");
                values.insert(key, ConfigValue::String(env_val));
            }
        }

        tracing::debug!(profile = %profile, keys = values.len(), "configuration loaded");
        Ok(Self { values, profile })
    }

    /// Create a config from a YAML string (useful for testing).
    pub fn from_yaml_str(yaml: &str, profile: &str) -> Result<Self, ConfigError> {
        let mut values = HashMap::new();
        let parsed: serde_yaml::Value =
            serde_yaml::from_str(yaml).map_err(|e| ConfigError::Load(e.to_string()))?;
        value::flatten_yaml("", &parsed, &mut values);
        Ok(Self {
            values,
            profile: profile.to_string(),
        })
    }

    pub fn empty() -> Self {
        Self {
            values: HashMap::new(),
            profile: "test".to_string(),
        }
    }

    pub fn set(&mut self, key: &str, value: ConfigValue) {
        self.values.insert(key.to_string(), value);
    }

    /// Get a typed value for the given dot-separated key.
    pub fn get<V: FromConfigValue>(&self, key: &str) -> Result<V, ConfigError> {
        let value = self
            .values
            .get(key)
            .ok_or_else(|| ConfigError::NotFound(key.to_string()))?;
        V::from_config_value(value, key)
    }

    /// Get a typed value, or `default` when the key is missing.
    ///
    /// A present but ill-typed value is still an error.
    pub fn get_or<V: FromConfigValue>(&self, key: &str, default: V) -> Result<V, ConfigError> {
        match self.get(key) {
            Err(ConfigError::NotFound(_)) => Ok(default),
            other => other,
        }
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    pub fn profile(&self) -> &str {
        &self.profile
    }

    /// Body size limit for validated handlers.
    pub fn body_limit(&self) -> Result<usize, ConfigError> {
        self.get_or(BODY_LIMIT, crate::validator::DEFAULT_BODY_LIMIT)
    }
}

fn load_yaml_file(path: &Path, values: &mut HashMap<String, ConfigValue>) -> Result<(), ConfigError> {
    if !path.exists() {
        return Ok(());
    }
    let content = std::fs::read_to_string(path)
        .map_err(|e| ConfigError::Load(format!("{}: {e}", path.display())))?;
    let yaml: serde_yaml::Value = serde_yaml::from_str(&content)
        .map_err(|e| ConfigError::Load(format!("{}: {e}", path.display())))?;
    value::flatten_yaml("", &yaml, values);
    Ok(())
}
