//! Evaluating a group against a twin graph.
//!
//! For every binding, in order: resolve the candidate twins addressed by
//! the binding's path, keep those satisfying the event, and invoke the
//! handler on each. Resolution walks nested twins through
//! [`Twin::get`]; a collection segment expands to its elements. On the
//! final segment the event picks which elements to consider (see
//! [`Event`]).
//!
//! # Failure Modes
//!
//! - A path naming an unknown or scalar property fails with
//!   [`CallbackError::Twin`] before its handler runs.
//! - The first handler error aborts the walk; earlier invocations stand.

use twin_core::{Collection, PropertyValue, Twin, TwinError};

use crate::error::{CallbackError, Result};
use crate::event::Event;
use crate::group::{Binding, Group};
use crate::path::PropertyPath;

/// One handler invocation.
#[derive(Debug, Clone)]
pub struct Invocation {
    pub event: Event,
    pub path: PropertyPath,
    pub handler: String,
    pub twin: Twin,
}

/// Record of a completed group call, in invocation order.
#[derive(Debug, Clone, Default)]
pub struct Dispatch {
    invocations: Vec<Invocation>,
}

impl Dispatch {
    #[must_use]
    pub fn invocations(&self) -> &[Invocation] {
        &self.invocations
    }

    /// Handler names in invocation order.
    #[must_use]
    pub fn handlers(&self) -> Vec<&str> {
        self.invocations.iter().map(|i| i.handler.as_str()).collect()
    }

    /// Twins `handler` was invoked with.
    #[must_use]
    pub fn invoked(&self, handler: &str) -> Vec<&Twin> {
        self.invocations
            .iter()
            .filter(|i| i.handler == handler)
            .map(|i| &i.twin)
            .collect()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.invocations.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.invocations.is_empty()
    }
}

struct Candidate {
    twin: Twin,
    owner: Option<Collection>,
}

impl<C> Group<C> {
    /// Run every matching handler against `twin` with `context`.
    ///
    /// # Errors
    ///
    /// [`CallbackError::Handler`] for the first failing handler, or
    /// [`CallbackError::Twin`] when a binding path cannot be resolved.
    pub fn call(&self, twin: &Twin, context: &C) -> Result<Dispatch> {
        let span = tracing::debug_span!(
            "callback.dispatch",
            schema = %twin.schema().name(),
            bindings = self.len()
        );
        let _guard = span.enter();

        let mut dispatch = Dispatch::default();
        for binding in self.bindings() {
            run_binding(binding, twin, context, &mut dispatch)?;
        }
        tracing::debug!(invocations = dispatch.len(), "callback.dispatch.done");
        Ok(dispatch)
    }
}

fn run_binding<C>(
    binding: &Binding<C>,
    root: &Twin,
    context: &C,
    dispatch: &mut Dispatch,
) -> Result<()> {
    let event = binding.event();
    for candidate in resolve(root, binding.path(), event)? {
        if !event.is_satisfied(&candidate.twin, candidate.owner.as_ref()) {
            continue;
        }
        let handler = binding.handler();
        tracing::trace!(event = %event, path = %binding.path(), handler = handler.name(), "callback.invoke");
        if let Err(source) = handler.invoke(&candidate.twin, context) {
            tracing::warn!(handler = handler.name(), error = %source, "callback handler failed");
            return Err(CallbackError::Handler {
                handler: handler.name().to_owned(),
                event: event.to_string(),
                path: binding.path().to_string(),
                source,
            });
        }
        dispatch.invocations.push(Invocation {
            event: event.clone(),
            path: binding.path().clone(),
            handler: handler.name().to_owned(),
            twin: candidate.twin,
        });
    }
    Ok(())
}

fn resolve(root: &Twin, path: &PropertyPath, event: &Event) -> Result<Vec<Candidate>> {
    let mut candidates = vec![Candidate {
        twin: root.clone(),
        owner: None,
    }];
    let segments = path.segments();
    for (depth, name) in segments.iter().enumerate() {
        let last = depth + 1 == segments.len();
        let mut next = Vec::new();
        for candidate in candidates {
            match candidate.twin.get(name)? {
                PropertyValue::Nested(Some(twin)) => next.push(Candidate { twin, owner: None }),
                PropertyValue::Nested(None) => {}
                PropertyValue::Collection(collection) => {
                    let members = if last {
                        event.members(&collection)
                    } else {
                        collection.to_vec()
                    };
                    next.extend(members.into_iter().map(|twin| Candidate {
                        twin,
                        owner: Some(collection.clone()),
                    }));
                }
                PropertyValue::Scalar(_) => {
                    return Err(TwinError::KindMismatch {
                        property: name.clone(),
                        expected: "nested twin or collection",
                        found: "scalar",
                    }
                    .into());
                }
            }
        }
        candidates = next;
    }
    Ok(candidates)
}
