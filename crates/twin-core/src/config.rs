//! Schema declaration as data.
//!
//! [`SchemaConfig`] is the serde-friendly mirror of a schema: a tree of
//! property records. Conversion goes through [`SchemaBuilder`], so a
//! contradictory record fails with the same configuration error as the
//! equivalent builder calls.
//!
//! ```
//! use twin_core::schema::Schema;
//!
//! let album = Schema::from_json(r#"{
//!     "name": "album",
//!     "properties": [
//!         { "name": "title" },
//!         { "name": "songs", "kind": "collection",
//!           "schema": { "properties": [{ "name": "name" }, { "name": "index" }] } }
//!     ]
//! }"#).unwrap();
//!
//! assert_eq!(album.len(), 2);
//! ```

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::Result;
use crate::schema::{Options, PropertyDescriptor, PropertyKind, Schema, SchemaBuilder};

/// A schema as plain data.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SchemaConfig {
    /// Empty for nested schemas; the owning property name is used instead.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name: String,
    #[serde(default)]
    pub properties: Vec<PropertyConfig>,
}

/// One property record.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PropertyConfig {
    pub name: String,
    /// `scalar` is promoted to `nested` when a `schema` is present.
    #[serde(default)]
    pub kind: PropertyKind,
    #[serde(default, rename = "virtual", skip_serializing_if = "is_false")]
    pub is_virtual: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub on: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub readable: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub writeable: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema: Option<Box<SchemaConfig>>,
}

#[allow(clippy::trivially_copy_pass_by_ref)]
fn is_false(value: &bool) -> bool {
    !*value
}

impl SchemaConfig {
    /// Build the described schema.
    ///
    /// # Errors
    ///
    /// Returns the first configuration error, exactly as
    /// [`SchemaBuilder::build`] would.
    pub fn build(self) -> Result<Schema> {
        self.build_named(None)
    }

    fn build_named(self, fallback: Option<&str>) -> Result<Schema> {
        let name = match (self.name.is_empty(), fallback) {
            (true, Some(fallback)) => fallback.to_owned(),
            _ => self.name,
        };
        let mut builder = Schema::builder(name);
        for property in self.properties {
            builder = property.declare_on(builder)?;
        }
        builder.build()
    }
}

impl PropertyConfig {
    fn declare_on(self, builder: SchemaBuilder) -> Result<SchemaBuilder> {
        let mut options = Options::new();
        if self.is_virtual {
            options = options.virtual_field();
        }
        if let Some(key) = self.on {
            options = options.on(key);
        }
        if let Some(accessor) = self.from {
            options = options.from(accessor);
        }
        if let Some(readable) = self.readable {
            options = options.readable(readable);
        }
        if let Some(writeable) = self.writeable {
            options = options.writeable(writeable);
        }
        if let Some(default) = self.default {
            options = options.default_value(default);
        }
        if let Some(nested) = self.schema {
            options = options.twin(nested.build_named(Some(&self.name))?);
        }

        Ok(match self.kind {
            PropertyKind::Scalar => builder.property(self.name, options),
            kind => builder.declare(self.name, kind, options),
        })
    }
}

impl From<&Schema> for SchemaConfig {
    fn from(schema: &Schema) -> Self {
        Self {
            name: schema.name().to_owned(),
            properties: schema.properties().iter().map(PropertyConfig::from).collect(),
        }
    }
}

impl From<&PropertyDescriptor> for PropertyConfig {
    fn from(descriptor: &PropertyDescriptor) -> Self {
        let bound = !descriptor.is_virtual();
        Self {
            name: descriptor.name().to_owned(),
            kind: descriptor.kind(),
            is_virtual: descriptor.is_virtual(),
            on: descriptor.composition_key().map(str::to_owned),
            from: (descriptor.accessor() != descriptor.name())
                .then(|| descriptor.accessor().to_owned()),
            readable: (bound && !descriptor.is_readable()).then_some(false),
            writeable: (bound && !descriptor.is_writeable()).then_some(false),
            default: descriptor.default_value().cloned(),
            schema: descriptor
                .nested_schema()
                .map(|nested| Box::new(SchemaConfig::from(nested))),
        }
    }
}

impl Schema {
    /// Parse a [`SchemaConfig`] from JSON and build it.
    ///
    /// # Errors
    ///
    /// [`TwinError::Json`](crate::TwinError::Json) for malformed input,
    /// otherwise the configuration errors of [`SchemaConfig::build`].
    pub fn from_json(json: &str) -> Result<Schema> {
        let config: SchemaConfig = serde_json::from_str(json)?;
        config.build()
    }

    /// Plain-data description of this schema.
    #[must_use]
    pub fn to_config(&self) -> SchemaConfig {
        SchemaConfig::from(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TwinError;

    fn built() -> Schema {
        Schema::builder("album")
            .property("title", Options::new().from("name"))
            .property("id", Options::new().writeable(false))
            .property("note", Options::new().virtual_field().default_value("n/a"))
            .collection(
                "songs",
                Options::new().nested(|s| {
                    s.property("name", Options::new())
                        .property("index", Options::new())
                }),
            )
            .build()
            .unwrap()
    }

    #[test]
    fn json_matches_builder() {
        let parsed = Schema::from_json(
            r#"{
                "name": "album",
                "properties": [
                    { "name": "title", "from": "name" },
                    { "name": "id", "writeable": false },
                    { "name": "note", "virtual": true, "default": "n/a" },
                    { "name": "songs", "kind": "collection", "schema": {
                        "properties": [{ "name": "name" }, { "name": "index" }]
                    } }
                ]
            }"#,
        )
        .unwrap();
        assert_eq!(parsed.to_config(), built().to_config());
    }

    #[test]
    fn schema_record_promotes_scalar_to_nested() {
        let parsed = Schema::from_json(
            r#"{ "name": "album", "properties": [
                { "name": "artist", "schema": { "properties": [{ "name": "name" }] } }
            ] }"#,
        )
        .unwrap();
        let artist = parsed.property("artist").unwrap();
        assert_eq!(artist.kind(), PropertyKind::Nested);
        assert_eq!(artist.nested_schema().unwrap().name(), "artist");
    }

    #[test]
    fn config_errors_match_builder_errors() {
        let from_builder = Schema::builder("album")
            .property("draft", Options::new().virtual_field().on("album"))
            .build()
            .unwrap_err();
        let from_json = Schema::from_json(
            r#"{ "name": "album", "properties": [
                { "name": "draft", "virtual": true, "on": "album" }
            ] }"#,
        )
        .unwrap_err();
        assert!(from_json.is_config());
        assert_eq!(from_json.to_string(), from_builder.to_string());
    }

    #[test]
    fn collection_without_schema_is_rejected() {
        let err = Schema::from_json(
            r#"{ "name": "album", "properties": [{ "name": "songs", "kind": "collection" }] }"#,
        )
        .unwrap_err();
        assert!(matches!(err, TwinError::Config { .. }));
    }

    #[test]
    fn unknown_fields_are_json_errors() {
        let err = Schema::from_json(r#"{ "name": "album", "tempo": 120 }"#).unwrap_err();
        assert!(matches!(err, TwinError::Json(_)));
        assert!(err.is_config());
    }

    #[test]
    fn config_serializes_compactly() {
        let json = serde_json::to_value(built().to_config()).unwrap();
        assert_eq!(json["properties"][0], serde_json::json!({"name": "title", "kind": "scalar", "from": "name"}));
        assert_eq!(json["properties"][2]["virtual"], serde_json::json!(true));
    }
}
