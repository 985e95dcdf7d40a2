//! Event kinds and their predicates.
//!
//! | Event | Candidates from a collection | Satisfied when |
//! |-------|------------------------------|----------------|
//! | `Update` | current | persisted at construction and changed now |
//! | `Create` | current | not persisted at construction, persisted now |
//! | `Add` | added | in the owning collection's `added` |
//! | `AddCreate` | added | `Add` and persisted now |
//! | `Delete` | deleted | in the owning collection's `deleted` |
//! | `Destroy` | destroyed | in the owning collection's `destroyed` |
//! | `Change` | current | changed |
//! | `ChangeOf(p)` | current | property `p` changed |

use std::fmt;

use twin_core::{ChangeTracking, Collection, Twin};

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Event {
    Update,
    Create,
    Add,
    AddCreate,
    Delete,
    Destroy,
    Change,
    ChangeOf(String),
}

impl Event {
    /// `Change` restricted to one property.
    #[must_use]
    pub fn change_of(property: impl Into<String>) -> Self {
        Self::ChangeOf(property.into())
    }

    /// Elements of `collection` this event considers.
    pub(crate) fn members(&self, collection: &Collection) -> Vec<Twin> {
        match self {
            Self::Add | Self::AddCreate => collection.added(),
            Self::Delete => collection.deleted(),
            Self::Destroy => collection.destroyed(),
            Self::Update | Self::Create | Self::Change | Self::ChangeOf(_) => {
                collection.to_vec()
            }
        }
    }

    /// Whether `twin`, reached through `owner` if it is a collection
    /// element, satisfies this event.
    pub(crate) fn is_satisfied(&self, twin: &Twin, owner: Option<&Collection>) -> bool {
        match self {
            Self::Update => twin.was_persisted() && twin.changed(),
            Self::Create => twin.is_created(),
            Self::Add => owner.is_some_and(|c| c.is_added(twin)),
            Self::AddCreate => owner.is_some_and(|c| c.is_added(twin)) && twin.is_persisted(),
            Self::Delete => owner.is_some_and(|c| c.is_deleted(twin)),
            Self::Destroy => owner.is_some_and(|c| c.is_destroyed(twin)),
            Self::Change => twin.changed(),
            Self::ChangeOf(property) => twin.property_changed(property),
        }
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Update => f.write_str("on_update"),
            Self::Create => f.write_str("on_create"),
            Self::Add => f.write_str("on_add"),
            Self::AddCreate => f.write_str("on_add(create)"),
            Self::Delete => f.write_str("on_delete"),
            Self::Destroy => f.write_str("on_destroy"),
            Self::Change => f.write_str("on_change"),
            Self::ChangeOf(property) => write!(f, "on_change({property})"),
        }
    }
}
