//! Capability contract the engine requires from persisted models.
//!
//! The engine never knows how a model stores its data. It reads and writes
//! named accessors, asks whether the model is persisted, and invokes the
//! zero-argument `save` / `destroy` actions during [`Save`](crate::sync::Save).
//!
//! Models are shared through [`ModelHandle`], an identity-compared
//! `Rc<RefCell<dyn Model>>`. The twin graph is single-threaded, so models
//! need not be `Send`.

use std::cell::{Ref, RefCell, RefMut};
use std::rc::Rc;

use serde_json::Value;
use thiserror::Error;

/// Failure reported by a model capability.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ModelError {
    /// The model has no accessor with this name.
    #[error("unknown accessor `{0}`")]
    UnknownAccessor(String),
    /// A persistence, destroy or write action was refused.
    #[error("{action} rejected: {message}")]
    Rejected { action: String, message: String },
}

impl ModelError {
    #[must_use]
    pub fn rejected(action: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Rejected {
            action: action.into(),
            message: message.into(),
        }
    }
}

/// A raw value as stored on a model accessor.
///
/// Scalars (including `null`) travel as JSON values; references to other
/// models travel as handles so that nested twins can wrap them.
#[derive(Debug, Clone, PartialEq)]
pub enum Field {
    Value(Value),
    Model(ModelHandle),
    Models(Vec<ModelHandle>),
}

impl Field {
    #[must_use]
    pub const fn null() -> Self {
        Self::Value(Value::Null)
    }

    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Value(Value::Null))
    }

    #[must_use]
    pub fn as_value(&self) -> Option<&Value> {
        match self {
            Self::Value(value) => Some(value),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_model(&self) -> Option<&ModelHandle> {
        match self {
            Self::Model(model) => Some(model),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_models(&self) -> Option<&[ModelHandle]> {
        match self {
            Self::Models(models) => Some(models),
            _ => None,
        }
    }
}

impl From<Value> for Field {
    fn from(value: Value) -> Self {
        Self::Value(value)
    }
}

impl From<&str> for Field {
    fn from(value: &str) -> Self {
        Self::Value(Value::from(value))
    }
}

impl From<String> for Field {
    fn from(value: String) -> Self {
        Self::Value(Value::from(value))
    }
}

impl From<i64> for Field {
    fn from(value: i64) -> Self {
        Self::Value(Value::from(value))
    }
}

impl From<bool> for Field {
    fn from(value: bool) -> Self {
        Self::Value(Value::from(value))
    }
}

impl From<ModelHandle> for Field {
    fn from(model: ModelHandle) -> Self {
        Self::Model(model)
    }
}

impl From<Vec<ModelHandle>> for Field {
    fn from(models: Vec<ModelHandle>) -> Self {
        Self::Models(models)
    }
}

/// Minimum surface a source model exposes to the twin engine.
///
/// Only `identity`, `read` and `write` are required. Models that take part
/// in [`Save`](crate::sync::Save) override `save`, `is_persisted` and, for
/// collection elements, `destroy`.
pub trait Model {
    /// Human-readable identity used in error messages and logs.
    fn identity(&self) -> String;

    /// Read the accessor named `accessor`. `None` means no such accessor.
    fn read(&self, accessor: &str) -> Option<Field>;

    /// Write `value` through the accessor named `accessor`.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::UnknownAccessor`] when no setter exists.
    fn write(&mut self, accessor: &str, value: Field) -> Result<(), ModelError>;

    /// Persist the model.
    ///
    /// # Errors
    ///
    /// Returns an error when the storage backend refuses the save.
    fn save(&mut self) -> Result<(), ModelError> {
        Ok(())
    }

    /// Whether the model currently exists in storage.
    fn is_persisted(&self) -> bool {
        false
    }

    /// Remove the model from storage.
    ///
    /// # Errors
    ///
    /// Returns an error when the storage backend refuses the destroy.
    fn destroy(&mut self) -> Result<(), ModelError> {
        Ok(())
    }
}

/// Shared, identity-compared handle to a [`Model`].
///
/// Cloning a handle yields another reference to the **same** model. Two
/// handles are equal iff they point at the same allocation.
#[derive(Clone)]
pub struct ModelHandle {
    inner: Rc<RefCell<dyn Model>>,
}

impl ModelHandle {
    /// Move `model` into a fresh shared handle.
    pub fn new<M: Model + 'static>(model: M) -> Self {
        Self {
            inner: Rc::new(RefCell::new(model)),
        }
    }

    /// Borrow the model immutably.
    ///
    /// # Panics
    ///
    /// Panics if the model is currently mutably borrowed.
    #[must_use]
    pub fn borrow(&self) -> Ref<'_, dyn Model> {
        self.inner.borrow()
    }

    /// Borrow the model mutably.
    ///
    /// # Panics
    ///
    /// Panics if the model is currently borrowed.
    #[must_use]
    pub fn borrow_mut(&self) -> RefMut<'_, dyn Model> {
        self.inner.borrow_mut()
    }

    #[must_use]
    pub fn identity(&self) -> String {
        match self.inner.try_borrow() {
            Ok(model) => model.identity(),
            Err(_) => "<model in use>".to_owned(),
        }
    }

    #[must_use]
    pub fn is_persisted(&self) -> bool {
        self.inner.borrow().is_persisted()
    }

    /// Whether both handles refer to the same model.
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        std::ptr::addr_eq(Rc::as_ptr(&self.inner), Rc::as_ptr(&other.inner))
    }
}

impl<M: Model + 'static> From<Rc<RefCell<M>>> for ModelHandle {
    fn from(shared: Rc<RefCell<M>>) -> Self {
        let inner: Rc<RefCell<dyn Model>> = shared;
        Self { inner }
    }
}

impl PartialEq for ModelHandle {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl Eq for ModelHandle {}

impl std::fmt::Debug for ModelHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("ModelHandle").field(&self.identity()).finish()
    }
}
