//! Minimal in-crate model for unit tests.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;

use serde_json::Value;

use crate::model::{Field, Model, ModelError, ModelHandle};

#[derive(Debug, Default)]
pub(crate) struct TestModel {
    kind: String,
    fields: BTreeMap<String, Field>,
    persisted: bool,
    pub(crate) saves: usize,
    pub(crate) destroys: usize,
    pub(crate) writes: Vec<String>,
    fail_save: bool,
}

impl TestModel {
    pub(crate) fn new(kind: &str) -> Self {
        Self {
            kind: kind.to_owned(),
            ..Self::default()
        }
    }

    pub(crate) fn with(mut self, accessor: &str, value: impl Into<Field>) -> Self {
        self.fields.insert(accessor.to_owned(), value.into());
        self
    }

    pub(crate) fn persisted(mut self) -> Self {
        self.persisted = true;
        self
    }

    pub(crate) fn mark_persisted(&mut self) {
        self.persisted = true;
    }

    pub(crate) fn failing_save(mut self) -> Self {
        self.fail_save = true;
        self
    }

    pub(crate) fn value(&self, accessor: &str) -> Option<Value> {
        self.fields
            .get(accessor)
            .and_then(Field::as_value)
            .cloned()
    }

    pub(crate) fn models(&self, accessor: &str) -> Vec<ModelHandle> {
        self.fields
            .get(accessor)
            .and_then(Field::as_models)
            .map(<[ModelHandle]>::to_vec)
            .unwrap_or_default()
    }
}

impl Model for TestModel {
    fn identity(&self) -> String {
        format!("{}(test)", self.kind)
    }

    fn read(&self, accessor: &str) -> Option<Field> {
        self.fields.get(accessor).cloned()
    }

    fn write(&mut self, accessor: &str, value: Field) -> Result<(), ModelError> {
        let Some(slot) = self.fields.get_mut(accessor) else {
            return Err(ModelError::UnknownAccessor(accessor.to_owned()));
        };
        *slot = value;
        self.writes.push(accessor.to_owned());
        Ok(())
    }

    fn save(&mut self) -> Result<(), ModelError> {
        if self.fail_save {
            return Err(ModelError::rejected("save", "storage offline"));
        }
        self.saves += 1;
        self.persisted = true;
        Ok(())
    }

    fn is_persisted(&self) -> bool {
        self.persisted
    }

    fn destroy(&mut self) -> Result<(), ModelError> {
        self.destroys += 1;
        self.persisted = false;
        Ok(())
    }
}

/// Wrap a model so the test keeps typed access after handing it to a twin.
pub(crate) fn shared(model: TestModel) -> (Rc<RefCell<TestModel>>, ModelHandle) {
    let shared = Rc::new(RefCell::new(model));
    let handle = ModelHandle::from(Rc::clone(&shared));
    (shared, handle)
}
