#![forbid(unsafe_code)]

//! Callbacks: event bindings evaluated against a twin graph.
//!
//! A [`Group`] lists `(event, path, handler)` bindings. Calling it walks the
//! twin graph and invokes each handler on every twin that satisfies its
//! event, strictly in binding order. Groups are immutable; a child group is
//! derived from a parent with append, remove and refine operations.

pub mod dispatch;
pub mod error;
pub mod event;
pub mod group;
pub mod handler;
pub mod path;

pub use dispatch::{Dispatch, Invocation};
pub use error::{BoxError, CallbackError, Result};
pub use event::Event;
pub use group::{Binding, Group, GroupBuilder, InheritBuilder};
pub use handler::Handler;
pub use path::PropertyPath;
