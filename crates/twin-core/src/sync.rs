//! Sync and save: committing a twin graph back to its models.
//!
//! # Ordering
//!
//! `sync` walks the schema in declaration order. A nested twin is synced
//! before its parent writes the reference to it; a collection syncs every
//! element, then the parent writes the list of element models.
//!
//! `save` runs `sync`, then persists depth-first with the parent first:
//! own model(s) in composition order, nested twins, collection elements in
//! `current` order, then the collection's pending destroys.
//!
//! # Failure Modes
//!
//! Nothing is transactional. A failing write, save or destroy aborts the walk
//! and leaves every earlier write and save in place.
//!
//! Virtual and non-writeable properties never write back to the parent
//! model. Nested twins and collection elements held by them are still
//! synced and persisted, and their collections still finalize destroys.

use serde_json::{Map, Value};

use crate::binding;
use crate::changed::ChangeTracking;
use crate::error::{Result, TwinError};
use crate::model::{Field, ModelHandle};
use crate::twin::{PropertyValue, Twin};

/// Write-back of current values to the source models.
pub trait Synchronize {
    /// Write every writeable property to its model.
    ///
    /// # Errors
    ///
    /// Binding errors from the first failing write; nothing is rolled back.
    fn sync(&self) -> Result<()>;

    /// Hand the nested current-value structure to `block` instead of
    /// writing any model.
    fn sync_with<R>(&self, block: impl FnOnce(Value) -> R) -> R;

    /// Nested current-value structure: objects for twins, arrays for
    /// collections, `null` for empty nested properties.
    fn to_nested(&self) -> Value;
}

/// Sync followed by the models' persistence actions.
pub trait Save: Synchronize {
    /// # Errors
    ///
    /// Binding errors from the sync pass, or [`TwinError::Persistence`] from
    /// the first failing save or destroy action.
    fn save(&self) -> Result<()>;

    /// Block-mode save: the structure goes to `block`; no model is written,
    /// saved or destroyed.
    fn save_with<R>(&self, block: impl FnOnce(Value) -> R) -> R;
}

impl Synchronize for Twin {
    fn sync(&self) -> Result<()> {
        let schema = self.schema();
        let span = tracing::debug_span!("twin.sync", schema = %schema.name(), changed = self.changed());
        let _guard = span.enter();

        let source = self.source();
        for (descriptor, value) in self.snapshot() {
            let writeable = descriptor.is_writeable();
            let field = match value {
                PropertyValue::Scalar(_) | PropertyValue::Nested(None) if !writeable => continue,
                PropertyValue::Scalar(value) => Field::Value(value),
                PropertyValue::Nested(None) => Field::null(),
                PropertyValue::Nested(Some(nested)) => {
                    nested.sync()?;
                    if !writeable {
                        continue;
                    }
                    Field::Model(single_model(&nested)?)
                }
                PropertyValue::Collection(collection) => {
                    for element in collection.to_vec() {
                        element.sync()?;
                    }
                    if !writeable {
                        continue;
                    }
                    Field::Models(collection.models()?)
                }
            };
            binding::write(&descriptor, &source, field)?;
        }
        Ok(())
    }

    fn sync_with<R>(&self, block: impl FnOnce(Value) -> R) -> R {
        let _guard = tracing::debug_span!("twin.sync", schema = %self.schema().name(), block = true)
            .entered();
        block(self.to_nested())
    }

    fn to_nested(&self) -> Value {
        let mut object = Map::new();
        for (descriptor, value) in self.snapshot() {
            let nested = match value {
                PropertyValue::Scalar(value) => value,
                PropertyValue::Nested(twin) => twin.map_or(Value::Null, |t| t.to_nested()),
                PropertyValue::Collection(collection) => Value::Array(
                    collection.to_vec().iter().map(Synchronize::to_nested).collect(),
                ),
            };
            object.insert(descriptor.name().to_owned(), nested);
        }
        Value::Object(object)
    }
}

impl Save for Twin {
    fn save(&self) -> Result<()> {
        let span = tracing::debug_span!("twin.save", schema = %self.schema().name());
        let _guard = span.enter();

        self.sync()?;
        persist(self)
    }

    fn save_with<R>(&self, block: impl FnOnce(Value) -> R) -> R {
        let _guard = tracing::debug_span!("twin.save", schema = %self.schema().name(), block = true)
            .entered();
        self.sync_with(block)
    }
}

fn persist(twin: &Twin) -> Result<()> {
    for model in twin.models() {
        save_model(&model)?;
    }
    for (_, value) in twin.snapshot() {
        match value {
            PropertyValue::Scalar(_) | PropertyValue::Nested(None) => {}
            PropertyValue::Nested(Some(nested)) => persist(&nested)?,
            PropertyValue::Collection(collection) => {
                for element in collection.to_vec() {
                    persist(&element)?;
                }
                collection.finalize_destroy()?;
            }
        }
    }
    Ok(())
}

fn save_model(model: &ModelHandle) -> Result<()> {
    let identity = model.identity();
    tracing::debug!(model = %identity, "model.save");
    let outcome = model.borrow_mut().save();
    outcome.map_err(|source| {
        tracing::warn!(model = %identity, error = %source, "save failed");
        TwinError::Persistence {
            model: identity,
            action: "save",
            source,
        }
    })
}

fn single_model(twin: &Twin) -> Result<ModelHandle> {
    twin.model().ok_or_else(|| TwinError::NotSingleSource {
        schema: twin.schema().name().to_owned(),
    })
}
