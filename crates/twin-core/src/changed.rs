//! Change tracking for twins and collections.
//!
//! A property is changed when a writer touched it since construction, or
//! when the nested twin or collection it holds reports a change. Changes
//! propagate upward on read; nothing is cached.

use ahash::AHashSet;

use crate::collection::Collection;
use crate::twin::{PropertyValue, Twin};

/// Names of properties touched through the writer.
#[derive(Debug, Clone, Default)]
pub struct ChangeSet {
    dirty: AHashSet<String>,
}

impl ChangeSet {
    pub fn mark(&mut self, name: &str) {
        // Lookup first so repeated writes don't allocate.
        if !self.dirty.contains(name) {
            self.dirty.insert(name.to_owned());
        }
    }

    #[must_use]
    pub fn is_dirty(&self, name: &str) -> bool {
        self.dirty.contains(name)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.dirty.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.dirty.len()
    }
}

/// Anything that can report whether it differs from its source.
pub trait ChangeTracking {
    fn changed(&self) -> bool;
}

impl ChangeTracking for Twin {
    fn changed(&self) -> bool {
        self.snapshot()
            .iter()
            .any(|(descriptor, value)| self.is_dirty(descriptor.name()) || value_changed(value))
    }
}

impl ChangeTracking for Collection {
    fn changed(&self) -> bool {
        self.has_tracked_changes() || self.to_vec().iter().any(ChangeTracking::changed)
    }
}

impl Twin {
    /// Whether `name` was written, or holds a nested twin or collection that
    /// changed. Unknown names report `false`.
    #[must_use]
    pub fn property_changed(&self, name: &str) -> bool {
        if self.is_dirty(name) {
            return true;
        }
        self.get(name).is_ok_and(|value| value_changed(&value))
    }

    /// Names of changed properties, in schema order.
    #[must_use]
    pub fn changed_properties(&self) -> Vec<String> {
        self.snapshot()
            .into_iter()
            .filter(|(descriptor, value)| {
                self.is_dirty(descriptor.name()) || value_changed(value)
            })
            .map(|(descriptor, _)| descriptor.name().to_owned())
            .collect()
    }
}

fn value_changed(value: &PropertyValue) -> bool {
    match value {
        PropertyValue::Scalar(_) => false,
        PropertyValue::Nested(twin) => twin.as_ref().is_some_and(ChangeTracking::changed),
        PropertyValue::Collection(collection) => collection.changed(),
    }
}
