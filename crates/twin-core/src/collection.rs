//! Collection proxy: an ordered, tracked container of element twins.
//!
//! A [`Collection`] behaves like an ordered list of [`Twin`]s and records
//! how it was mutated so that sync, save and callbacks can act on the
//! difference:
//!
//! | Operation | `current` | `added` | `deleted` | `to_destroy` |
//! |-----------|-----------|---------|-----------|--------------|
//! | `append` / `insert` | insert | push | remove | remove |
//! | `delete` | remove | | push | |
//! | `destroy` | remove | | push | push |
//! | `replace` | swap | push new | push old | |
//! | `reorder` | move | | | |
//!
//! # Invariants
//!
//! 1. `current` never holds a twin that is in `deleted` or `to_destroy`.
//! 2. `added` only holds twins that were in `current` at some point.
//! 3. Tracking lists are identity sets kept in insertion order.
//! 4. Tracking lists accumulate for the lifetime of the collection; only
//!    [`Collection::clear_tracking`] resets them.
//! 5. Each `to_destroy` member has its destroy action run at most once;
//!    it then appears in `destroyed`.
//! 6. `current` is a plain ordered list: inserting a twin it already holds
//!    duplicates it, and `delete`/`destroy` remove every copy at once.
//!
//! Cloning a `Collection` creates a new handle to the **same** proxy.

use std::cell::RefCell;
use std::rc::Rc;

use serde_json::Value;

use crate::error::{Result, TwinError};
use crate::model::ModelHandle;
use crate::schema::Schema;
use crate::twin::Twin;
use crate::twinning::{self, Input};

struct CollectionInner {
    property: String,
    schema: Schema,
    current: Vec<Twin>,
    added: Vec<Twin>,
    deleted: Vec<Twin>,
    to_destroy: Vec<Twin>,
    destroyed: Vec<Twin>,
}

/// Ordered, change-tracked list of element twins bound to a property.
#[derive(Clone)]
pub struct Collection {
    inner: Rc<RefCell<CollectionInner>>,
}

impl Collection {
    /// Collection populated at construction; nothing counts as added.
    pub(crate) fn seeded(property: &str, schema: Schema, twins: Vec<Twin>) -> Self {
        Self {
            inner: Rc::new(RefCell::new(CollectionInner {
                property: property.to_owned(),
                schema,
                current: twins,
                added: Vec::new(),
                deleted: Vec::new(),
                to_destroy: Vec::new(),
                destroyed: Vec::new(),
            })),
        }
    }

    /// Collection produced by assignment; every element counts as added.
    pub(crate) fn assigned(property: &str, schema: Schema, twins: Vec<Twin>) -> Self {
        let collection = Self::seeded(property, schema, Vec::new());
        {
            let mut inner = collection.inner.borrow_mut();
            for twin in twins {
                push_unique(&mut inner.added, &twin);
                inner.current.push(twin);
            }
        }
        collection
    }

    /// Schema of every element.
    #[must_use]
    pub fn schema(&self) -> Schema {
        self.inner.borrow().schema.clone()
    }

    /// Name of the owning property.
    #[must_use]
    pub fn property(&self) -> String {
        self.inner.borrow().property.clone()
    }

    // -----------------------------------------------------------------------
    // Mutation
    // -----------------------------------------------------------------------

    /// Twin `input` if needed and add it at the end.
    ///
    /// # Errors
    ///
    /// Fails if `input` is not a model or twin, or its twin cannot be built.
    pub fn append(&self, input: impl Into<Input>) -> Result<Twin> {
        let index = self.len();
        self.insert(index, input)
    }

    /// Twin `input` if needed and insert it at `index`.
    ///
    /// # Errors
    ///
    /// Fails for `index > len()` and for inputs that cannot be twinned.
    pub fn insert(&self, index: usize, input: impl Into<Input>) -> Result<Twin> {
        let twin = self.twin_element(input.into())?;
        let mut inner = self.inner.borrow_mut();
        if index > inner.current.len() {
            return Err(out_of_bounds(&inner, index));
        }
        inner.current.insert(index, twin.clone());
        remove_from(&mut inner.deleted, &twin);
        remove_from(&mut inner.to_destroy, &twin);
        push_unique(&mut inner.added, &twin);
        tracing::trace!(property = %inner.property, index, "collection.insert");
        Ok(twin)
    }

    /// Remove `twin` from the collection without touching its model.
    ///
    /// Returns `false` if `twin` is not a current element.
    pub fn delete(&self, twin: &Twin) -> bool {
        let mut inner = self.inner.borrow_mut();
        if !remove_from(&mut inner.current, twin) {
            return false;
        }
        push_unique(&mut inner.deleted, twin);
        tracing::trace!(property = %inner.property, "collection.delete");
        true
    }

    /// Remove `twin` and schedule its model's destroy action for the next
    /// save.
    ///
    /// A twin that was already deleted can still be destroyed. Returns
    /// `false` if `twin` was never removable from this collection.
    pub fn destroy(&self, twin: &Twin) -> bool {
        let mut inner = self.inner.borrow_mut();
        let removed = remove_from(&mut inner.current, twin);
        if !removed && !contains(&inner.deleted, twin) {
            return false;
        }
        push_unique(&mut inner.deleted, twin);
        push_unique(&mut inner.to_destroy, twin);
        tracing::trace!(property = %inner.property, "collection.destroy");
        true
    }

    /// Replace the element at `index`; the old element counts as deleted and
    /// the new one as added.
    ///
    /// # Errors
    ///
    /// Fails for `index >= len()` and for inputs that cannot be twinned.
    pub fn replace(&self, index: usize, input: impl Into<Input>) -> Result<Twin> {
        let twin = self.twin_element(input.into())?;
        let mut inner = self.inner.borrow_mut();
        if index >= inner.current.len() {
            return Err(out_of_bounds(&inner, index));
        }
        let old = std::mem::replace(&mut inner.current[index], twin.clone());
        if !old.ptr_eq(&twin) && !contains(&inner.current, &old) {
            push_unique(&mut inner.deleted, &old);
        }
        remove_from(&mut inner.deleted, &twin);
        remove_from(&mut inner.to_destroy, &twin);
        push_unique(&mut inner.added, &twin);
        tracing::trace!(property = %inner.property, index, "collection.replace");
        Ok(twin)
    }

    /// Move the element at `from` to position `to`. Order changes are not
    /// tracked.
    ///
    /// # Errors
    ///
    /// Fails if either index is out of bounds.
    pub fn reorder(&self, from: usize, to: usize) -> Result<()> {
        let mut inner = self.inner.borrow_mut();
        let len = inner.current.len();
        if from >= len {
            return Err(out_of_bounds(&inner, from));
        }
        if to >= len {
            return Err(out_of_bounds(&inner, to));
        }
        let twin = inner.current.remove(from);
        inner.current.insert(to, twin);
        Ok(())
    }

    /// Forget `added`, `deleted`, `to_destroy` and `destroyed`, starting a
    /// fresh tracking epoch. Current elements are kept.
    pub fn clear_tracking(&self) {
        let mut inner = self.inner.borrow_mut();
        inner.added.clear();
        inner.deleted.clear();
        inner.to_destroy.clear();
        inner.destroyed.clear();
    }

    // -----------------------------------------------------------------------
    // Reading
    // -----------------------------------------------------------------------

    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.borrow().current.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.borrow().current.is_empty()
    }

    #[must_use]
    pub fn get(&self, index: usize) -> Option<Twin> {
        self.inner.borrow().current.get(index).cloned()
    }

    /// Current elements in order.
    #[must_use]
    pub fn to_vec(&self) -> Vec<Twin> {
        self.inner.borrow().current.clone()
    }

    #[must_use]
    pub fn position(&self, twin: &Twin) -> Option<usize> {
        self.inner
            .borrow()
            .current
            .iter()
            .position(|t| t.ptr_eq(twin))
    }

    #[must_use]
    pub fn contains(&self, twin: &Twin) -> bool {
        contains(&self.inner.borrow().current, twin)
    }

    /// First current element whose scalar `property` equals `value`.
    #[must_use]
    pub fn find_by(&self, property: &str, value: &Value) -> Option<Twin> {
        self.to_vec()
            .into_iter()
            .find(|twin| twin.value(property).is_ok_and(|v| v == *value))
    }

    #[must_use]
    pub fn added(&self) -> Vec<Twin> {
        self.inner.borrow().added.clone()
    }

    #[must_use]
    pub fn deleted(&self) -> Vec<Twin> {
        self.inner.borrow().deleted.clone()
    }

    #[must_use]
    pub fn to_destroy(&self) -> Vec<Twin> {
        self.inner.borrow().to_destroy.clone()
    }

    #[must_use]
    pub fn destroyed(&self) -> Vec<Twin> {
        self.inner.borrow().destroyed.clone()
    }

    #[must_use]
    pub fn is_added(&self, twin: &Twin) -> bool {
        contains(&self.inner.borrow().added, twin)
    }

    #[must_use]
    pub fn is_deleted(&self, twin: &Twin) -> bool {
        contains(&self.inner.borrow().deleted, twin)
    }

    #[must_use]
    pub fn is_destroyed(&self, twin: &Twin) -> bool {
        contains(&self.inner.borrow().destroyed, twin)
    }

    /// Whether any tracking list is non-empty.
    pub(crate) fn has_tracked_changes(&self) -> bool {
        let inner = self.inner.borrow();
        !(inner.added.is_empty() && inner.deleted.is_empty() && inner.to_destroy.is_empty())
    }

    /// Models of the current elements, in order.
    pub(crate) fn models(&self) -> Result<Vec<ModelHandle>> {
        self.to_vec()
            .iter()
            .map(|twin| {
                twin.model().ok_or_else(|| TwinError::NotSingleSource {
                    schema: twin.schema().name().to_owned(),
                })
            })
            .collect()
    }

    /// Run the destroy action of every `to_destroy` member not yet
    /// destroyed, then record it in `destroyed`.
    pub(crate) fn finalize_destroy(&self) -> Result<()> {
        let pending: Vec<Twin> = {
            let inner = self.inner.borrow();
            inner
                .to_destroy
                .iter()
                .filter(|t| !contains(&inner.destroyed, t))
                .cloned()
                .collect()
        };
        for twin in pending {
            for model in twin.models() {
                tracing::debug!(model = %model.identity(), "collection.destroy.model");
                let outcome = model.borrow_mut().destroy();
                if let Err(source) = outcome {
                    tracing::warn!(model = %model.identity(), error = %source, "destroy failed");
                    return Err(TwinError::Persistence {
                        model: model.identity(),
                        action: "destroy",
                        source,
                    });
                }
            }
            self.inner.borrow_mut().destroyed.push(twin);
        }
        Ok(())
    }

    fn twin_element(&self, input: Input) -> Result<Twin> {
        let (property, schema) = {
            let inner = self.inner.borrow();
            (inner.property.clone(), inner.schema.clone())
        };
        twinning::twin_element(&property, &schema, input)
    }
}

impl std::fmt::Debug for Collection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.inner.try_borrow() {
            Ok(inner) => f
                .debug_struct("Collection")
                .field("property", &inner.property)
                .field("len", &inner.current.len())
                .field("added", &inner.added.len())
                .field("deleted", &inner.deleted.len())
                .field("to_destroy", &inner.to_destroy.len())
                .field("destroyed", &inner.destroyed.len())
                .finish(),
            Err(_) => f.write_str("Collection(<borrowed>)"),
        }
    }
}

fn contains(list: &[Twin], twin: &Twin) -> bool {
    list.iter().any(|t| t.ptr_eq(twin))
}

fn push_unique(list: &mut Vec<Twin>, twin: &Twin) {
    if !contains(list, twin) {
        list.push(twin.clone());
    }
}

/// Remove every occurrence of `twin`; returns whether any was found.
fn remove_from(list: &mut Vec<Twin>, twin: &Twin) -> bool {
    let before = list.len();
    list.retain(|t| !t.ptr_eq(twin));
    list.len() < before
}

fn out_of_bounds(inner: &CollectionInner, index: usize) -> TwinError {
    TwinError::IndexOutOfBounds {
        property: inner.property.clone(),
        index,
        length: inner.current.len(),
    }
}
