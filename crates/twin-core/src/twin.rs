//! Twin instances: schema-bound, independently mutable decorators.
//!
//! A [`Twin`] copies every declared property out of its source model(s) at
//! construction, twinning nested models and collections on the way in.
//! From then on reads and writes touch only the twin; the models are left
//! alone until [`Synchronize::sync`](crate::sync::Synchronize::sync) or
//! [`Save::save`](crate::sync::Save::save).
//!
//! # Invariants
//!
//! 1. Every stored property has a descriptor in the twin's schema, and
//!    every descriptor has a stored property.
//! 2. Nested properties hold `Option<Twin>`; collection properties hold a
//!    [`Collection`]. Callers never see raw models through [`Twin::get`].
//! 3. Construction (including overrides) marks nothing dirty.
//! 4. Every writer call marks its property dirty, even when the new value
//!    equals the old one.
//!
//! Cloning a `Twin` creates a new handle to the **same** node; equality of
//! handles is identity ([`Twin::ptr_eq`]).

use std::cell::RefCell;
use std::rc::Rc;

use ahash::AHashMap;
use serde_json::Value;

use crate::binding::{self, Source};
use crate::changed::ChangeSet;
use crate::collection::Collection;
use crate::error::{Result, TwinError};
use crate::model::ModelHandle;
use crate::schema::{PropertyDescriptor, PropertyKind, Schema};
use crate::twinning::{self, Input};

/// Current value of one twin property.
#[derive(Debug, Clone)]
pub enum PropertyValue {
    Scalar(Value),
    Nested(Option<Twin>),
    Collection(Collection),
}

impl PropertyValue {
    #[must_use]
    pub fn as_scalar(&self) -> Option<&Value> {
        match self {
            Self::Scalar(value) => Some(value),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_nested(&self) -> Option<&Twin> {
        match self {
            Self::Nested(twin) => twin.as_ref(),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_collection(&self) -> Option<&Collection> {
        match self {
            Self::Collection(collection) => Some(collection),
            _ => None,
        }
    }

    fn kind(&self) -> PropertyKind {
        match self {
            Self::Scalar(_) => PropertyKind::Scalar,
            Self::Nested(_) => PropertyKind::Nested,
            Self::Collection(_) => PropertyKind::Collection,
        }
    }
}

struct TwinInner {
    schema: Schema,
    source: Source,
    values: AHashMap<String, PropertyValue>,
    changes: ChangeSet,
    /// Whether the source was persisted when the twin was built.
    persisted: bool,
}

/// A node of the mutable twin graph.
#[derive(Clone)]
pub struct Twin {
    inner: Rc<RefCell<TwinInner>>,
}

impl Twin {
    /// Build a twin from a model or composition.
    ///
    /// # Errors
    ///
    /// Returns a binding error if any readable property cannot be read, or a
    /// kind mismatch if a model value does not fit its descriptor.
    pub fn new(schema: Schema, source: impl Into<Source>) -> Result<Self> {
        Self::build(schema, source.into(), AHashMap::new())
    }

    /// Build a twin that wraps a single model.
    ///
    /// # Errors
    ///
    /// See [`Twin::new`].
    pub fn from_model(schema: Schema, model: ModelHandle) -> Result<Self> {
        Self::build(schema, Source::Model(model), AHashMap::new())
    }

    /// Build a twin, taking the values in `overrides` verbatim instead of
    /// reading them from the model. Overridden properties are not dirty.
    ///
    /// # Errors
    ///
    /// Returns [`TwinError::UnknownProperty`] for override keys absent from
    /// the schema, plus the errors of [`Twin::new`].
    pub fn with_overrides<I, K, V>(
        schema: Schema,
        source: impl Into<Source>,
        overrides: I,
    ) -> Result<Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Input>,
    {
        let overrides = overrides
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        Self::build(schema, source.into(), overrides)
    }

    fn build(
        schema: Schema,
        source: Source,
        mut overrides: AHashMap<String, Input>,
    ) -> Result<Self> {
        let span = tracing::debug_span!("twin.build", schema = %schema.name());
        let _guard = span.enter();

        if let Some(unknown) = overrides.keys().find(|k| schema.property(k).is_none()) {
            return Err(TwinError::unknown_property(schema.name(), unknown.as_str()));
        }

        let mut values = AHashMap::with_capacity(schema.len());
        for descriptor in schema.properties() {
            let input = match overrides.remove(descriptor.name()) {
                Some(input) => input,
                None => initial_input(descriptor, &source)?,
            };
            let value = convert(descriptor, input, Origin::Setup)?;
            values.insert(descriptor.name().to_owned(), value);
        }

        let persisted = source.is_persisted();
        tracing::trace!(properties = values.len(), persisted, "twin.built");
        Ok(Self {
            inner: Rc::new(RefCell::new(TwinInner {
                schema,
                source,
                values,
                changes: ChangeSet::default(),
                persisted,
            })),
        })
    }

    // -----------------------------------------------------------------------
    // Accessors
    // -----------------------------------------------------------------------

    #[must_use]
    pub fn schema(&self) -> Schema {
        self.inner.borrow().schema.clone()
    }

    #[must_use]
    pub fn source(&self) -> Source {
        self.inner.borrow().source.clone()
    }

    /// The wrapped model, or `None` for a composition.
    #[must_use]
    pub fn model(&self) -> Option<ModelHandle> {
        self.inner.borrow().source.single().cloned()
    }

    /// Every wrapped model in composition order.
    #[must_use]
    pub fn models(&self) -> Vec<ModelHandle> {
        self.inner.borrow().source.models()
    }

    /// Whether the source was persisted when this twin was built.
    #[must_use]
    pub fn was_persisted(&self) -> bool {
        self.inner.borrow().persisted
    }

    /// Whether the source is persisted now.
    #[must_use]
    pub fn is_persisted(&self) -> bool {
        self.inner.borrow().source.is_persisted()
    }

    /// Whether the source became persisted after this twin was built.
    #[must_use]
    pub fn is_created(&self) -> bool {
        !self.was_persisted() && self.is_persisted()
    }

    /// Whether both handles refer to the same twin.
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }

    // -----------------------------------------------------------------------
    // Reader
    // -----------------------------------------------------------------------

    /// Current value of `name`.
    ///
    /// # Errors
    ///
    /// Returns [`TwinError::UnknownProperty`] if the schema lacks `name`.
    pub fn get(&self, name: &str) -> Result<PropertyValue> {
        let inner = self.inner.borrow();
        inner
            .values
            .get(name)
            .cloned()
            .ok_or_else(|| TwinError::unknown_property(inner.schema.name(), name))
    }

    /// Current scalar value of `name`.
    ///
    /// # Errors
    ///
    /// Fails for unknown or non-scalar properties.
    pub fn value(&self, name: &str) -> Result<Value> {
        match self.get(name)? {
            PropertyValue::Scalar(value) => Ok(value),
            other => Err(mismatch(name, PropertyKind::Scalar, &other)),
        }
    }

    /// Current nested twin of `name`.
    ///
    /// # Errors
    ///
    /// Fails for unknown or non-nested properties.
    pub fn nested(&self, name: &str) -> Result<Option<Twin>> {
        match self.get(name)? {
            PropertyValue::Nested(twin) => Ok(twin),
            other => Err(mismatch(name, PropertyKind::Nested, &other)),
        }
    }

    /// Collection bound to `name`.
    ///
    /// # Errors
    ///
    /// Fails for unknown or non-collection properties.
    pub fn collection(&self, name: &str) -> Result<Collection> {
        match self.get(name)? {
            PropertyValue::Collection(collection) => Ok(collection),
            other => Err(mismatch(name, PropertyKind::Collection, &other)),
        }
    }

    // -----------------------------------------------------------------------
    // Writer
    // -----------------------------------------------------------------------

    /// Replace the current value of `name` and mark it dirty.
    ///
    /// Nested values are twinned; assigning a collection builds a fresh
    /// [`Collection`] in which every element counts as added. The model is
    /// not touched.
    ///
    /// # Errors
    ///
    /// Fails for unknown properties, for values that do not fit the
    /// descriptor, and for binding errors while twinning nested models.
    pub fn set(&self, name: &str, input: impl Into<Input>) -> Result<()> {
        let schema = self.schema();
        let descriptor = schema.require(name)?;
        let value = convert(descriptor, input.into(), Origin::Writer)?;
        tracing::trace!(schema = %schema.name(), property = name, "twin.set");

        let mut inner = self.inner.borrow_mut();
        inner.values.insert(name.to_owned(), value);
        inner.changes.mark(name);
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Crate internals
    // -----------------------------------------------------------------------

    /// Descriptors paired with current values, in schema order.
    ///
    /// The borrow is released before returning so callers may recurse.
    pub(crate) fn snapshot(&self) -> Vec<(PropertyDescriptor, PropertyValue)> {
        let inner = self.inner.borrow();
        inner
            .schema
            .properties()
            .iter()
            .filter_map(|d| {
                inner
                    .values
                    .get(d.name())
                    .map(|v| (d.clone(), v.clone()))
            })
            .collect()
    }

    pub(crate) fn is_dirty(&self, name: &str) -> bool {
        self.inner.borrow().changes.is_dirty(name)
    }
}

impl std::fmt::Debug for Twin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.inner.try_borrow() {
            Ok(inner) => f
                .debug_struct("Twin")
                .field("schema", &inner.schema.name())
                .field("source", &inner.source)
                .field("dirty", &inner.changes)
                .finish_non_exhaustive(),
            Err(_) => f.write_str("Twin(<borrowed>)"),
        }
    }
}

fn element_schema(descriptor: &PropertyDescriptor) -> Result<&Schema> {
    descriptor.nested_schema().ok_or_else(|| {
        TwinError::config(
            descriptor.name(),
            format!("{} has no nested schema", descriptor.kind().label()),
        )
    })
}

fn initial_input(descriptor: &PropertyDescriptor, source: &Source) -> Result<Input> {
    let field = binding::read(descriptor, source)?;
    let default = descriptor.default_value().cloned().map(Input::Value);
    Ok(match field {
        Some(field) if field.is_null() => default.unwrap_or_else(Input::null),
        Some(field) => Input::from(field),
        None => default.unwrap_or_else(Input::null),
    })
}

/// Where a value enters the twin; writer-assigned collections count as added.
#[derive(Clone, Copy, PartialEq, Eq)]
enum Origin {
    Setup,
    Writer,
}

fn convert(descriptor: &PropertyDescriptor, input: Input, origin: Origin) -> Result<PropertyValue> {
    let name = descriptor.name();
    match descriptor.kind() {
        PropertyKind::Scalar => input.into_scalar(name).map(PropertyValue::Scalar),
        PropertyKind::Nested => {
            twinning::twin_one(name, element_schema(descriptor)?, input).map(PropertyValue::Nested)
        }
        PropertyKind::Collection => {
            let schema = element_schema(descriptor)?;
            let twins = twinning::twin_many(name, schema, input)?;
            let collection = match origin {
                Origin::Setup => Collection::seeded(name, schema.clone(), twins),
                Origin::Writer => Collection::assigned(name, schema.clone(), twins),
            };
            Ok(PropertyValue::Collection(collection))
        }
    }
}

fn mismatch(name: &str, expected: PropertyKind, found: &PropertyValue) -> TwinError {
    TwinError::KindMismatch {
        property: name.to_owned(),
        expected: expected.label(),
        found: found.kind().label(),
    }
}
