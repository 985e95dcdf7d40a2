#![forbid(unsafe_code)]

//! Twin public facade crate.
//!
//! A twin is a schema-bound, independently mutable decorator over persisted
//! models. Declare a [`Schema`], build a [`Twin`] from a model, change it
//! freely, then [`sync`](Synchronize::sync) or [`save`](Save::save) it back.
//! With the `callbacks` feature, [`Group`] evaluates event handlers over the
//! resulting graph.

pub use twin_core::{
    ChangeTracking, Collection, Composition, Field, Input, Model, ModelError, ModelHandle,
    Options, PropertyValue, Save, Schema, SchemaConfig, Source, Synchronize, Twin, TwinError,
};

#[cfg(feature = "callbacks")]
pub use twin_callback::{CallbackError, Dispatch, Event, Group, Handler, PropertyPath};

pub mod prelude {
    pub use twin_core as core;
    pub use twin_core::prelude::*;
    pub use twin_core::{Field, Model, ModelError, ModelHandle, TwinError};

    #[cfg(feature = "callbacks")]
    pub use twin_callback as callback;
    #[cfg(feature = "callbacks")]
    pub use twin_callback::{Event, Group, Handler};
}
