#![forbid(unsafe_code)]

//! In-memory reference model.
//!
//! [`Record`] stores named fields, counts persistence actions, and can
//! report every action to a shared [`Journal`] so tests can assert the
//! order in which a save walked the graph. Failures are injected per
//! action name.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;

use serde_json::Value;
use twin_core::{Field, Model, ModelError, ModelHandle};

/// Shared, ordered log of model actions such as `"save album"`.
#[derive(Debug, Clone, Default)]
pub struct Journal {
    entries: Rc<RefCell<Vec<String>>>,
}

impl Journal {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn push(&self, entry: String) {
        self.entries.borrow_mut().push(entry);
    }

    #[must_use]
    pub fn entries(&self) -> Vec<String> {
        self.entries.borrow().clone()
    }

    /// Entries starting with `action`, with the action stripped.
    #[must_use]
    pub fn of(&self, action: &str) -> Vec<String> {
        let prefix = format!("{action} ");
        self.entries
            .borrow()
            .iter()
            .filter_map(|e| e.strip_prefix(&prefix).map(str::to_owned))
            .collect()
    }

    pub fn clear(&self) {
        self.entries.borrow_mut().clear();
    }
}

/// A model backed by a field map.
#[derive(Debug, Default)]
pub struct Record {
    kind: String,
    label: String,
    fields: BTreeMap<String, Field>,
    persisted: bool,
    saves: usize,
    destroys: usize,
    writes: Vec<String>,
    failing: Option<&'static str>,
    journal: Option<Journal>,
}

impl Record {
    /// An unpersisted record; `label` distinguishes it in identities and
    /// journal entries.
    #[must_use]
    pub fn new(kind: &str, label: &str) -> Self {
        Self {
            kind: kind.to_owned(),
            label: label.to_owned(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with(mut self, accessor: &str, value: impl Into<Field>) -> Self {
        self.fields.insert(accessor.to_owned(), value.into());
        self
    }

    #[must_use]
    pub fn persisted(mut self) -> Self {
        self.persisted = true;
        self
    }

    #[must_use]
    pub fn journal(mut self, journal: &Journal) -> Self {
        self.journal = Some(journal.clone());
        self
    }

    /// Make `action` (`"save"`, `"destroy"` or `"write"`) fail.
    #[must_use]
    pub fn failing(mut self, action: &'static str) -> Self {
        self.failing = Some(action);
        self
    }

    /// Share the record: typed access for the test, a handle for twins.
    #[must_use]
    pub fn share(self) -> (Rc<RefCell<Record>>, ModelHandle) {
        let shared = Rc::new(RefCell::new(self));
        let handle = ModelHandle::from(Rc::clone(&shared));
        (shared, handle)
    }

    // -----------------------------------------------------------------------
    // Inspection
    // -----------------------------------------------------------------------

    #[must_use]
    pub fn label(&self) -> &str {
        &self.label
    }

    #[must_use]
    pub fn field(&self, accessor: &str) -> Option<&Field> {
        self.fields.get(accessor)
    }

    /// Scalar value of `accessor`.
    #[must_use]
    pub fn value(&self, accessor: &str) -> Option<&Value> {
        self.field(accessor).and_then(Field::as_value)
    }

    /// Referenced models of `accessor`; empty when unset or not a list.
    #[must_use]
    pub fn models(&self, accessor: &str) -> Vec<ModelHandle> {
        self.field(accessor)
            .and_then(Field::as_models)
            .map(<[ModelHandle]>::to_vec)
            .unwrap_or_default()
    }

    #[must_use]
    pub fn saves(&self) -> usize {
        self.saves
    }

    #[must_use]
    pub fn destroys(&self) -> usize {
        self.destroys
    }

    /// Accessors written so far, in order.
    #[must_use]
    pub fn writes(&self) -> &[String] {
        &self.writes
    }

    fn act(&self, action: &'static str) -> Result<(), ModelError> {
        if let Some(journal) = &self.journal {
            journal.push(format!("{action} {}", self.label));
        }
        if self.failing == Some(action) {
            return Err(ModelError::rejected(action, format!("{} refused", self.label)));
        }
        Ok(())
    }
}

impl Model for Record {
    fn identity(&self) -> String {
        format!("{}({})", self.kind, self.label)
    }

    fn read(&self, accessor: &str) -> Option<Field> {
        self.fields.get(accessor).cloned()
    }

    fn write(&mut self, accessor: &str, value: Field) -> Result<(), ModelError> {
        if !self.fields.contains_key(accessor) {
            return Err(ModelError::UnknownAccessor(accessor.to_owned()));
        }
        self.act("write")?;
        self.fields.insert(accessor.to_owned(), value);
        self.writes.push(accessor.to_owned());
        Ok(())
    }

    fn save(&mut self) -> Result<(), ModelError> {
        self.act("save")?;
        self.saves += 1;
        self.persisted = true;
        tracing::trace!(model = %self.identity(), "record.save");
        Ok(())
    }

    fn is_persisted(&self) -> bool {
        self.persisted
    }

    fn destroy(&mut self) -> Result<(), ModelError> {
        self.act("destroy")?;
        self.destroys += 1;
        self.persisted = false;
        Ok(())
    }
}
