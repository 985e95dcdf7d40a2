#![forbid(unsafe_code)]

//! Core: schemas, the twin graph, collections, change tracking, and sync/save.
//!
//! A twin is a mutable decorator over one or more persisted models. It copies
//! the declared properties out of its models, lets callers change them
//! freely, and writes them back only when asked to:
//!
//! ```
//! use twin_core::prelude::*;
//! use twin_core::{Field, Model, ModelError, ModelHandle};
//!
//! #[derive(Default)]
//! struct Album {
//!     title: String,
//! }
//!
//! impl Model for Album {
//!     fn identity(&self) -> String {
//!         format!("Album({})", self.title)
//!     }
//!     fn read(&self, accessor: &str) -> Option<Field> {
//!         (accessor == "title").then(|| Field::from(self.title.as_str()))
//!     }
//!     fn write(&mut self, accessor: &str, value: Field) -> Result<(), ModelError> {
//!         match (accessor, value.as_value().and_then(|v| v.as_str())) {
//!             ("title", Some(title)) => {
//!                 self.title = title.to_owned();
//!                 Ok(())
//!             }
//!             _ => Err(ModelError::UnknownAccessor(accessor.to_owned())),
//!         }
//!     }
//! }
//!
//! let schema = Schema::builder("album")
//!     .property("title", Options::new())
//!     .build()?;
//! let model = ModelHandle::new(Album { title: "Nice Try".into() });
//! let twin = Twin::from_model(schema, model.clone())?;
//!
//! twin.set("title", "Skamobile")?;
//! assert!(twin.changed());
//! assert_eq!(model.borrow().read("title"), Some(Field::from("Nice Try")));
//!
//! twin.sync()?;
//! assert_eq!(model.borrow().read("title"), Some(Field::from("Skamobile")));
//! # Ok::<(), twin_core::TwinError>(())
//! ```

pub mod binding;
pub mod changed;
pub mod collection;
pub mod config;
pub mod error;
pub mod model;
pub mod schema;
pub mod sync;
pub mod twin;
pub mod twinning;

#[cfg(test)]
mod test_support;

pub use binding::{Composition, Source};
pub use changed::{ChangeSet, ChangeTracking};
pub use collection::Collection;
pub use config::{PropertyConfig, SchemaConfig};
pub use error::{Result, TwinError};
pub use model::{Field, Model, ModelError, ModelHandle};
pub use schema::{Options, PropertyDescriptor, PropertyKind, Schema, SchemaBuilder};
pub use sync::{Save, Synchronize};
pub use twin::{PropertyValue, Twin};
pub use twinning::Input;

/// Everything needed to declare, mutate and commit twins.
pub mod prelude {
    pub use crate::{
        ChangeTracking, Collection, Composition, Input, Options, PropertyValue, Save, Schema,
        Synchronize, Twin,
    };
}
