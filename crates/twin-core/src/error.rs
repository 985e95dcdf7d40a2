use thiserror::Error;

use crate::model::ModelError;

pub type Result<T> = std::result::Result<T, TwinError>;

#[derive(Debug, Error)]
pub enum TwinError {
    #[error("schema `{schema}`: {message}")]
    Config { schema: String, message: String },

    #[error("schema configuration is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("property `{property}`: accessor `{accessor}` is missing on {model}")]
    Binding {
        property: String,
        accessor: String,
        model: String,
    },

    #[error("property `{property}`: composition has no model under key `{key}`")]
    MissingComposition { property: String, key: String },

    #[error("schema `{schema}` has no property `{property}`")]
    UnknownProperty { schema: String, property: String },

    #[error("property `{property}`: expected {expected}, found {found}")]
    KindMismatch {
        property: String,
        expected: &'static str,
        found: &'static str,
    },

    #[error("index {index} out of bounds for collection `{property}` (length {length})")]
    IndexOutOfBounds {
        property: String,
        index: usize,
        length: usize,
    },

    #[error("{action} failed on {model}: {source}")]
    Persistence {
        model: String,
        action: &'static str,
        #[source]
        source: ModelError,
    },

    #[error("twin of schema `{schema}` wraps a composition, not a single model")]
    NotSingleSource { schema: String },
}

impl TwinError {
    #[must_use]
    pub fn config(schema: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Config {
            schema: schema.into(),
            message: message.into(),
        }
    }

    #[must_use]
    pub fn unknown_property(schema: impl Into<String>, property: impl Into<String>) -> Self {
        Self::UnknownProperty {
            schema: schema.into(),
            property: property.into(),
        }
    }

    /// Whether this error stems from a self-contradictory schema declaration.
    #[must_use]
    pub fn is_config(&self) -> bool {
        matches!(self, Self::Config { .. } | Self::Json(_))
    }
}
