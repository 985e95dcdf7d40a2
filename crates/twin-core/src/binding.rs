//! Property binding: how a descriptor reads from and writes to its model.
//!
//! A twin wraps either one model or a [`Composition`] of named models. The
//! binding resolves the model for a descriptor (via `on:` for compositions),
//! then calls the accessor (`from:` or the property name). Virtual and
//! unreadable/unwriteable descriptors short-circuit before any model is
//! touched.
//!
//! A missing accessor or composition key is a configuration mistake, so it
//! fails loudly with the property, accessor and model identity.

use crate::error::{Result, TwinError};
use crate::model::{Field, ModelError, ModelHandle};
use crate::schema::PropertyDescriptor;

/// Ordered mapping from composition key to model.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Composition {
    models: Vec<(String, ModelHandle)>,
}

impl Composition {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `model` under `key` (builder pattern). An existing key is replaced.
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, model: ModelHandle) -> Self {
        self.insert(key, model);
        self
    }

    pub fn insert(&mut self, key: impl Into<String>, model: ModelHandle) {
        let key = key.into();
        if let Some(slot) = self.models.iter_mut().find(|(k, _)| *k == key) {
            slot.1 = model;
        } else {
            self.models.push((key, model));
        }
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&ModelHandle> {
        self.models.iter().find(|(k, _)| k == key).map(|(_, m)| m)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.models.iter().map(|(k, _)| k.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ModelHandle)> {
        self.models.iter().map(|(k, m)| (k.as_str(), m))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.models.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }
}

/// What a twin decorates.
#[derive(Debug, Clone, PartialEq)]
pub enum Source {
    Model(ModelHandle),
    Composition(Composition),
}

impl Source {
    /// The single model, if this is not a composition.
    #[must_use]
    pub fn single(&self) -> Option<&ModelHandle> {
        match self {
            Self::Model(model) => Some(model),
            Self::Composition(_) => None,
        }
    }

    /// Every model in key order (one entry for a single model).
    #[must_use]
    pub fn models(&self) -> Vec<ModelHandle> {
        match self {
            Self::Model(model) => vec![model.clone()],
            Self::Composition(composition) => {
                composition.iter().map(|(_, m)| m.clone()).collect()
            }
        }
    }

    /// True iff every underlying model reports itself persisted.
    #[must_use]
    pub fn is_persisted(&self) -> bool {
        let models = self.models();
        !models.is_empty() && models.iter().all(ModelHandle::is_persisted)
    }

    fn resolve(&self, descriptor: &PropertyDescriptor) -> Result<&ModelHandle> {
        match (self, descriptor.composition_key()) {
            (Self::Model(model), None) => Ok(model),
            (Self::Model(_), Some(key)) => Err(TwinError::MissingComposition {
                property: descriptor.name().to_owned(),
                key: key.to_owned(),
            }),
            (Self::Composition(composition), Some(key)) => {
                composition
                    .get(key)
                    .ok_or_else(|| TwinError::MissingComposition {
                        property: descriptor.name().to_owned(),
                        key: key.to_owned(),
                    })
            }
            (Self::Composition(composition), None) => Err(TwinError::MissingComposition {
                property: descriptor.name().to_owned(),
                key: format!(
                    "<none>; declare `on` with one of [{}]",
                    composition.keys().collect::<Vec<_>>().join(", ")
                ),
            }),
        }
    }
}

impl From<ModelHandle> for Source {
    fn from(model: ModelHandle) -> Self {
        Self::Model(model)
    }
}

impl From<Composition> for Source {
    fn from(composition: Composition) -> Self {
        Self::Composition(composition)
    }
}

/// Read the initial raw value for `descriptor`.
///
/// Returns `Ok(None)` for descriptors that never read from a model.
///
/// # Errors
///
/// Returns a binding error if the accessor or composition key is missing.
pub fn read(descriptor: &PropertyDescriptor, source: &Source) -> Result<Option<Field>> {
    if !descriptor.is_readable() {
        return Ok(None);
    }
    let model = source.resolve(descriptor)?;
    let value = model.borrow().read(descriptor.accessor());
    match value {
        Some(field) => Ok(Some(field)),
        None => Err(TwinError::Binding {
            property: descriptor.name().to_owned(),
            accessor: descriptor.accessor().to_owned(),
            model: model.identity(),
        }),
    }
}

/// Write `value` back through `descriptor`'s accessor.
///
/// Virtual and unwriteable descriptors are a no-op.
///
/// # Errors
///
/// Returns a binding error for a missing accessor, or a persistence error if
/// the model rejects the write.
pub fn write(descriptor: &PropertyDescriptor, source: &Source, value: Field) -> Result<()> {
    if !descriptor.is_writeable() {
        return Ok(());
    }
    let model = source.resolve(descriptor)?;
    let outcome = model.borrow_mut().write(descriptor.accessor(), value);
    outcome.map_err(|err| match err {
        ModelError::UnknownAccessor(accessor) => TwinError::Binding {
            property: descriptor.name().to_owned(),
            accessor,
            model: model.identity(),
        },
        other => TwinError::Persistence {
            model: model.identity(),
            action: "write",
            source: other,
        },
    })
}
