//! Twinning: converting raw model values into twins.
//!
//! Every value entering a nested or collection property passes through
//! [`twin_one`] / [`twin_many`], whether it comes from the model during
//! construction or from a writer call. [`Input`] makes the three cases
//! explicit: a raw model, an existing twin, or null.

use serde_json::Value;

use crate::error::{Result, TwinError};
use crate::model::{Field, ModelHandle};
use crate::schema::Schema;
use crate::twin::Twin;

/// A value offered to a twin property.
#[derive(Debug, Clone)]
pub enum Input {
    /// A scalar (`null` clears nested properties and empties collections).
    Value(Value),
    /// A raw model, twinned on arrival.
    Model(ModelHandle),
    /// An existing twin, stored as-is when its schema matches.
    Twin(Twin),
    /// Elements of a collection (or a scalar array).
    List(Vec<Input>),
}

impl Input {
    #[must_use]
    pub const fn null() -> Self {
        Self::Value(Value::Null)
    }

    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Value(Value::Null))
    }

    pub(crate) fn label(&self) -> &'static str {
        match self {
            Self::Value(Value::Null) => "null",
            Self::Value(_) => "scalar",
            Self::Model(_) => "model",
            Self::Twin(_) => "twin",
            Self::List(_) => "list",
        }
    }

    /// Collapse into a scalar JSON value, if this input is one.
    pub(crate) fn into_scalar(self, property: &str) -> Result<Value> {
        match self {
            Self::Value(value) => Ok(value),
            Self::List(items) => items
                .into_iter()
                .map(|item| item.into_scalar(property))
                .collect::<Result<Vec<_>>>()
                .map(Value::Array),
            other => Err(TwinError::KindMismatch {
                property: property.to_owned(),
                expected: "scalar",
                found: other.label(),
            }),
        }
    }
}

impl From<Value> for Input {
    fn from(value: Value) -> Self {
        Self::Value(value)
    }
}

impl From<&str> for Input {
    fn from(value: &str) -> Self {
        Self::Value(Value::from(value))
    }
}

impl From<String> for Input {
    fn from(value: String) -> Self {
        Self::Value(Value::from(value))
    }
}

impl From<i64> for Input {
    fn from(value: i64) -> Self {
        Self::Value(Value::from(value))
    }
}

impl From<f64> for Input {
    fn from(value: f64) -> Self {
        Self::Value(Value::from(value))
    }
}

impl From<bool> for Input {
    fn from(value: bool) -> Self {
        Self::Value(Value::from(value))
    }
}

impl From<ModelHandle> for Input {
    fn from(model: ModelHandle) -> Self {
        Self::Model(model)
    }
}

impl From<Twin> for Input {
    fn from(twin: Twin) -> Self {
        Self::Twin(twin)
    }
}

impl From<&Twin> for Input {
    fn from(twin: &Twin) -> Self {
        Self::Twin(twin.clone())
    }
}

impl<T: Into<Input>> From<Vec<T>> for Input {
    fn from(items: Vec<T>) -> Self {
        Self::List(items.into_iter().map(Into::into).collect())
    }
}

impl From<Field> for Input {
    fn from(field: Field) -> Self {
        match field {
            Field::Value(value) => Self::Value(value),
            Field::Model(model) => Self::Model(model),
            Field::Models(models) => Self::List(models.into_iter().map(Self::Model).collect()),
        }
    }
}

/// Twin a single nested value. `null` yields `None`.
///
/// A twin of another schema is re-twinned from its source model.
///
/// # Errors
///
/// Returns [`TwinError::KindMismatch`] for scalars and lists, and
/// propagates binding errors from constructing the nested twin.
pub fn twin_one(property: &str, schema: &Schema, input: Input) -> Result<Option<Twin>> {
    match input {
        Input::Value(Value::Null) => Ok(None),
        Input::Model(model) => Twin::from_model(schema.clone(), model).map(Some),
        Input::Twin(twin) if twin.schema().ptr_eq(schema) => Ok(Some(twin)),
        Input::Twin(twin) => {
            let model = twin.model().ok_or_else(|| TwinError::NotSingleSource {
                schema: twin.schema().name().to_owned(),
            })?;
            Twin::from_model(schema.clone(), model).map(Some)
        }
        other => Err(TwinError::KindMismatch {
            property: property.to_owned(),
            expected: "model or twin",
            found: other.label(),
        }),
    }
}

/// Twin every element of a collection value. `null` yields an empty list.
///
/// # Errors
///
/// Returns [`TwinError::KindMismatch`] if the input is not a list, or if an
/// element is not a model or twin.
pub fn twin_many(property: &str, schema: &Schema, input: Input) -> Result<Vec<Twin>> {
    match input {
        Input::Value(Value::Null) => Ok(Vec::new()),
        Input::List(items) => items
            .into_iter()
            .map(|item| twin_element(property, schema, item))
            .collect(),
        other => Err(TwinError::KindMismatch {
            property: property.to_owned(),
            expected: "list",
            found: other.label(),
        }),
    }
}

/// Twin one collection element; unlike [`twin_one`], `null` is rejected.
pub(crate) fn twin_element(property: &str, schema: &Schema, input: Input) -> Result<Twin> {
    let found = input.label();
    twin_one(property, schema, input)?.ok_or_else(|| TwinError::KindMismatch {
        property: property.to_owned(),
        expected: "model or twin",
        found,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::Options;
    use crate::test_support::{TestModel, shared};

    fn song() -> Schema {
        Schema::builder("song")
            .property("name", Options::new())
            .build()
            .unwrap()
    }

    #[test]
    fn null_is_none_for_nested() {
        assert!(twin_one("hit", &song(), Input::null()).unwrap().is_none());
    }

    #[test]
    fn raw_model_becomes_twin() {
        let (_, model) = shared(TestModel::new("song").with("name", "Adondo"));
        let twin = twin_one("hit", &song(), model.clone().into()).unwrap().unwrap();
        assert_eq!(twin.model(), Some(model));
        assert_eq!(twin.value("name").unwrap(), Value::from("Adondo"));
    }

    #[test]
    fn matching_twin_is_kept() {
        let schema = song();
        let (_, model) = shared(TestModel::new("song").with("name", "Adondo"));
        let twin = Twin::from_model(schema.clone(), model).unwrap();
        let kept = twin_one("hit", &schema, (&twin).into()).unwrap().unwrap();
        assert!(kept.ptr_eq(&twin));
    }

    #[test]
    fn foreign_twin_is_rewrapped() {
        let (_, model) = shared(TestModel::new("song").with("name", "Adondo"));
        let foreign = Twin::from_model(song(), model.clone()).unwrap();
        let schema = song();
        let rewrapped = twin_one("hit", &schema, foreign.clone().into()).unwrap().unwrap();
        assert!(!rewrapped.ptr_eq(&foreign));
        assert!(rewrapped.schema().ptr_eq(&schema));
        assert_eq!(rewrapped.model(), Some(model));
    }

    #[test]
    fn scalar_for_nested_is_a_kind_mismatch() {
        let err = twin_one("hit", &song(), "Adondo".into()).unwrap_err();
        assert!(matches!(err, TwinError::KindMismatch { found: "scalar", .. }));
    }

    #[test]
    fn collections_reject_null_elements() {
        let (_, model) = shared(TestModel::new("song").with("name", "Adondo"));
        let input = Input::List(vec![Input::Model(model), Input::null()]);
        let err = twin_many("songs", &song(), input).unwrap_err();
        assert!(matches!(err, TwinError::KindMismatch { found: "null", .. }));
    }

    #[test]
    fn scalar_lists_collapse_to_arrays() {
        let input = Input::from(vec!["ska", "punk"]);
        let value = input.into_scalar("genres").unwrap();
        assert_eq!(value, serde_json::json!(["ska", "punk"]));
    }
}
