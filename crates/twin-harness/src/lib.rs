#![forbid(unsafe_code)]

//! Test harness: reference models and fixture schemas for twin graphs.

pub mod fixtures;
pub mod record;

pub use fixtures::SharedRecord;
pub use record::{Journal, Record};
