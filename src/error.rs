use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AggregatorError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Manifest decoding error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON rendering error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid pod spec: {field} must be a {expected}, found {found}")]
    Structural {
        field: String,
        expected: &'static str,
        found: &'static str,
    },

    #[error("No workload documents found in manifest")]
    NoWorkloads,

    #[error("Manifest document has no kind")]
    MissingKind,

    #[error("Unsupported resource kind: {0}")]
    UnsupportedKind(String),

    #[error("{kind}/{name} has no pod spec")]
    MissingPodSpec { kind: String, name: String },

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

impl AggregatorError {
    /// A field of the pod spec that is present but has the wrong shape.
    pub fn structural(
        field: impl Into<String>,
        expected: &'static str,
        found: &serde_yaml::Value,
    ) -> Self {
        Self::Structural {
            field: field.into(),
            expected,
            found: value_type_name(found),
        }
    }
}

fn value_type_name(value: &serde_yaml::Value) -> &'static str {
    use serde_yaml::Value;

    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Sequence(_) => "sequence",
        Value::Mapping(_) => "mapping",
        Value::Tagged(_) => "tagged value",
    }
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read {}: {source}", .path.display())]
    ReadFailed {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse {}: {message}", .path.display())]
    ParsingFailed { path: PathBuf, message: String },
}

pub type Result<T> = std::result::Result<T, AggregatorError>;
