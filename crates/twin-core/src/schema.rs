//! Schema registry: the declarative description of a twin type.
//!
//! A [`Schema`] is an ordered list of [`PropertyDescriptor`]s. Schemas are
//! built once through [`SchemaBuilder`] and then shared read-only by every
//! twin of that type; cloning a schema clones an `Arc`.
//!
//! # Invariants
//!
//! 1. Property names are unique within a schema.
//! 2. Nested and collection descriptors always carry a nested schema.
//! 3. Nested schemas form a tree: a schema can only reference schemas that
//!    were fully built before it.
//! 4. A contradictory declaration (explicit `twin` plus a nested block,
//!    `virtual` plus `on`/`from`, a `default` on a non-scalar) is rejected by
//!    [`SchemaBuilder::build`], never at runtime.
//!
//! # Usage
//!
//! ```
//! use twin_core::schema::{Options, Schema};
//!
//! let album = Schema::builder("album")
//!     .property("title", Options::new())
//!     .collection(
//!         "songs",
//!         Options::new().nested(|song| {
//!             song.property("name", Options::new())
//!                 .property("index", Options::new())
//!         }),
//!     )
//!     .build()
//!     .unwrap();
//!
//! assert_eq!(album.len(), 2);
//! assert!(album.property("songs").unwrap().nested_schema().is_some());
//! ```

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{Result, TwinError};

/// Shape of a property's current value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PropertyKind {
    /// A plain JSON value.
    #[default]
    Scalar,
    /// A single nested twin (or none).
    Nested,
    /// An ordered collection of nested twins.
    Collection,
}

impl PropertyKind {
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Scalar => "scalar",
            Self::Nested => "nested twin",
            Self::Collection => "collection",
        }
    }
}

/// One declared property of a schema.
#[derive(Debug, Clone)]
pub struct PropertyDescriptor {
    name: String,
    kind: PropertyKind,
    is_virtual: bool,
    on: Option<String>,
    from: Option<String>,
    readable: bool,
    writeable: bool,
    default: Option<Value>,
    nested: Option<Schema>,
}

impl PropertyDescriptor {
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn kind(&self) -> PropertyKind {
        self.kind
    }

    /// Virtual properties live only on the twin.
    #[must_use]
    pub fn is_virtual(&self) -> bool {
        self.is_virtual
    }

    /// Composition key selecting the bound model.
    #[must_use]
    pub fn composition_key(&self) -> Option<&str> {
        self.on.as_deref()
    }

    /// Model accessor name: `from:` if given, else the property name.
    #[must_use]
    pub fn accessor(&self) -> &str {
        self.from.as_deref().unwrap_or(&self.name)
    }

    /// Whether construction reads this property from the model.
    #[must_use]
    pub fn is_readable(&self) -> bool {
        self.readable && !self.is_virtual
    }

    /// Whether sync writes this property back to the model.
    #[must_use]
    pub fn is_writeable(&self) -> bool {
        self.writeable && !self.is_virtual
    }

    #[must_use]
    pub fn default_value(&self) -> Option<&Value> {
        self.default.as_ref()
    }

    /// Schema of the nested twin or of each collection element.
    #[must_use]
    pub fn nested_schema(&self) -> Option<&Schema> {
        self.nested.as_ref()
    }
}

/// Declaration options for a single property.
///
/// `twin` and `nested` are mutually exclusive; supplying both is reported
/// by [`SchemaBuilder::build`].
#[derive(Default)]
pub struct Options {
    is_virtual: bool,
    on: Option<String>,
    from: Option<String>,
    readable: Option<bool>,
    writeable: Option<bool>,
    default: Option<Value>,
    twin: Option<Schema>,
    block: Option<Box<dyn FnOnce(SchemaBuilder) -> SchemaBuilder>>,
}

impl Options {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Keep the value on the twin only; never read from or written to a model.
    #[must_use]
    pub fn virtual_field(mut self) -> Self {
        self.is_virtual = true;
        self
    }

    /// Bind to the model stored under `key` in a composition.
    #[must_use]
    pub fn on(mut self, key: impl Into<String>) -> Self {
        self.on = Some(key.into());
        self
    }

    /// Read and write through the model accessor `accessor`.
    #[must_use]
    pub fn from(mut self, accessor: impl Into<String>) -> Self {
        self.from = Some(accessor.into());
        self
    }

    #[must_use]
    pub fn readable(mut self, readable: bool) -> Self {
        self.readable = Some(readable);
        self
    }

    #[must_use]
    pub fn writeable(mut self, writeable: bool) -> Self {
        self.writeable = Some(writeable);
        self
    }

    /// Initial scalar value when the model yields `null` or is not read.
    #[must_use]
    pub fn default_value(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(value.into());
        self
    }

    /// Use an already-built schema for the nested twin(s).
    #[must_use]
    pub fn twin(mut self, schema: Schema) -> Self {
        self.twin = Some(schema);
        self
    }

    /// Declare the nested schema inline.
    #[must_use]
    pub fn nested(mut self, block: impl FnOnce(SchemaBuilder) -> SchemaBuilder + 'static) -> Self {
        self.block = Some(Box::new(block));
        self
    }
}

impl std::fmt::Debug for Options {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Options")
            .field("virtual", &self.is_virtual)
            .field("on", &self.on)
            .field("from", &self.from)
            .field("twin", &self.twin.as_ref().map(Schema::name))
            .field("block", &self.block.is_some())
            .finish_non_exhaustive()
    }
}

struct SchemaInner {
    name: String,
    properties: Vec<PropertyDescriptor>,
}

/// Immutable, shared description of a twin type.
#[derive(Clone)]
pub struct Schema {
    inner: Arc<SchemaInner>,
}

impl Schema {
    /// Start declaring a schema called `name`.
    #[must_use]
    pub fn builder(name: impl Into<String>) -> SchemaBuilder {
        SchemaBuilder::new(name)
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.inner.name
    }

    /// Properties in declaration order.
    #[must_use]
    pub fn properties(&self) -> &[PropertyDescriptor] {
        &self.inner.properties
    }

    #[must_use]
    pub fn property(&self, name: &str) -> Option<&PropertyDescriptor> {
        self.inner.properties.iter().find(|p| p.name == name)
    }

    /// Look up `name`, failing with [`TwinError::UnknownProperty`].
    ///
    /// # Errors
    ///
    /// Returns an error if the schema declares no such property.
    pub fn require(&self, name: &str) -> Result<&PropertyDescriptor> {
        self.property(name)
            .ok_or_else(|| TwinError::unknown_property(self.name(), name))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.properties.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.properties.is_empty()
    }

    /// Whether both handles refer to the same declaration.
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl std::fmt::Debug for Schema {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Schema")
            .field("name", &self.inner.name)
            .field(
                "properties",
                &self
                    .inner
                    .properties
                    .iter()
                    .map(|p| (p.name.as_str(), p.kind))
                    .collect::<Vec<_>>(),
            )
            .finish()
    }
}

/// Builder for [`Schema`].
///
/// The first configuration error is remembered and reported by
/// [`build`](Self::build); later declarations are ignored once an error is
/// recorded.
#[derive(Debug)]
pub struct SchemaBuilder {
    name: String,
    properties: Vec<PropertyDescriptor>,
    error: Option<TwinError>,
}

impl SchemaBuilder {
    fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            properties: Vec::new(),
            error: None,
        }
    }

    /// Declare a scalar property, or a nested twin when `options` names a
    /// schema via [`Options::twin`] or [`Options::nested`].
    #[must_use]
    pub fn property(self, name: impl Into<String>, options: Options) -> Self {
        let kind = if options.twin.is_some() || options.block.is_some() {
            PropertyKind::Nested
        } else {
            PropertyKind::Scalar
        };
        self.declare(name.into(), kind, options)
    }

    /// Declare a collection of nested twins.
    #[must_use]
    pub fn collection(self, name: impl Into<String>, options: Options) -> Self {
        self.declare(name.into(), PropertyKind::Collection, options)
    }

    /// Declare a property with an explicit kind.
    #[must_use]
    pub fn declare(mut self, name: String, kind: PropertyKind, options: Options) -> Self {
        if self.error.is_some() {
            return self;
        }
        match self.descriptor(name, kind, options) {
            Ok(descriptor) => self.properties.push(descriptor),
            Err(err) => self.error = Some(err),
        }
        self
    }

    fn descriptor(
        &self,
        name: String,
        kind: PropertyKind,
        options: Options,
    ) -> Result<PropertyDescriptor> {
        let fail = |message: String| Err(TwinError::config(&self.name, message));

        if self.properties.iter().any(|p| p.name == name) {
            return fail(format!("property `{name}` is declared twice"));
        }
        if options.twin.is_some() && options.block.is_some() {
            return fail(format!(
                "property `{name}` declares both an explicit twin schema and a nested block"
            ));
        }
        if options.is_virtual && (options.on.is_some() || options.from.is_some()) {
            return fail(format!(
                "virtual property `{name}` cannot bind to a model with `on` or `from`"
            ));
        }

        let nested = match (options.twin, options.block) {
            (Some(schema), None) => Some(schema),
            (None, Some(block)) => Some(block(Schema::builder(name.clone())).build()?),
            _ => None,
        };

        match kind {
            PropertyKind::Scalar if nested.is_some() => {
                return fail(format!("scalar property `{name}` declares a nested schema"));
            }
            PropertyKind::Nested | PropertyKind::Collection if nested.is_none() => {
                return fail(format!("{} `{name}` has no nested schema", kind.label()));
            }
            PropertyKind::Nested | PropertyKind::Collection if options.default.is_some() => {
                return fail(format!(
                    "{} `{name}` cannot declare a default value",
                    kind.label()
                ));
            }
            _ => {}
        }

        Ok(PropertyDescriptor {
            name,
            kind,
            is_virtual: options.is_virtual,
            on: options.on,
            from: options.from,
            readable: options.readable.unwrap_or(true),
            writeable: options.writeable.unwrap_or(true),
            default: options.default,
            nested,
        })
    }

    /// Finish the declaration.
    ///
    /// # Errors
    ///
    /// Returns the first configuration error recorded while declaring.
    pub fn build(self) -> Result<Schema> {
        if let Some(err) = self.error {
            return Err(err);
        }
        tracing::trace!(schema = %self.name, properties = self.properties.len(), "schema.build");
        Ok(Schema {
            inner: Arc::new(SchemaInner {
                name: self.name,
                properties: self.properties,
            }),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn song() -> Schema {
        Schema::builder("song")
            .property("name", Options::new())
            .property("index", Options::new())
            .build()
            .unwrap()
    }

    #[test]
    fn properties_keep_declaration_order() {
        let schema = Schema::builder("album")
            .property("title", Options::new())
            .collection("songs", Options::new().twin(song()))
            .property("note", Options::new().virtual_field())
            .build()
            .unwrap();
        let names: Vec<_> = schema.properties().iter().map(PropertyDescriptor::name).collect();
        assert_eq!(names, ["title", "songs", "note"]);
        assert_eq!(schema.property("songs").unwrap().kind(), PropertyKind::Collection);
    }

    #[test]
    fn explicit_twin_is_shared_not_copied() {
        let song = song();
        let album = Schema::builder("album")
            .property("hit", Options::new().twin(song.clone()))
            .build()
            .unwrap();
        let hit = album.property("hit").unwrap();
        assert_eq!(hit.kind(), PropertyKind::Nested);
        assert!(hit.nested_schema().unwrap().ptr_eq(&song));
    }

    #[test]
    fn twin_and_block_together_is_a_config_error() {
        let err = Schema::builder("album")
            .property(
                "artist",
                Options::new()
                    .twin(song())
                    .nested(|b| b.property("name", Options::new())),
            )
            .build()
            .unwrap_err();
        assert!(err.is_config());
        assert!(err.to_string().contains("artist"));
    }

    #[test]
    fn collection_without_schema_is_rejected() {
        let err = Schema::builder("album")
            .collection("songs", Options::new())
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("no nested schema"));
    }

    #[test]
    fn duplicate_names_are_rejected() {
        let err = Schema::builder("album")
            .property("title", Options::new())
            .property("title", Options::new().from("name"))
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("declared twice"));
    }

    #[test]
    fn virtual_cannot_bind() {
        let err = Schema::builder("album")
            .property("password", Options::new().virtual_field().from("pw"))
            .build()
            .unwrap_err();
        assert!(err.is_config());
    }

    #[test]
    fn nested_block_errors_surface_from_parent_build() {
        let err = Schema::builder("album")
            .property(
                "artist",
                Options::new().nested(|b| {
                    b.property("name", Options::new())
                        .property("name", Options::new())
                }),
            )
            .build()
            .unwrap_err();
        match err {
            TwinError::Config { schema, .. } => assert_eq!(schema, "artist"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn accessor_defaults_to_name() {
        let schema = Schema::builder("album")
            .property("title", Options::new())
            .property("label", Options::new().from("label_name").on("meta"))
            .build()
            .unwrap();
        assert_eq!(schema.property("title").unwrap().accessor(), "title");
        let label = schema.property("label").unwrap();
        assert_eq!(label.accessor(), "label_name");
        assert_eq!(label.composition_key(), Some("meta"));
    }

    #[test]
    fn virtual_is_neither_readable_nor_writeable() {
        let schema = Schema::builder("signup")
            .property("confirm", Options::new().virtual_field())
            .property("id", Options::new().writeable(false))
            .build()
            .unwrap();
        let confirm = schema.property("confirm").unwrap();
        assert!(!confirm.is_readable());
        assert!(!confirm.is_writeable());
        let id = schema.property("id").unwrap();
        assert!(id.is_readable());
        assert!(!id.is_writeable());
    }

    #[test]
    fn require_reports_unknown_property() {
        let err = song().require("tempo").unwrap_err();
        assert!(matches!(err, TwinError::UnknownProperty { .. }));
    }
}
